//! Float encoding for the wire format.
//!
//! JSON has no literal for NaN or the infinities, and `serde_json` writes
//! them as `null`. Rewards, observations and space bounds may legitimately
//! hold them, so finite values travel as numbers and non-finite values as
//! the strings `"NaN"`, `"Infinity"` and `"-Infinity"`.
//!
//! Use with `#[serde(with = "crate::float")]` on `f64` fields and
//! `#[serde(with = "crate::float::vec")]` on `Vec<f64>` fields.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const NAN: &str = "NaN";
const INFINITY: &str = "Infinity";
const NEG_INFINITY: &str = "-Infinity";

/// `f64` with the non-finite string encoding
#[derive(Debug, Clone, Copy, PartialEq)]
struct Float(f64);

impl Serialize for Float {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        if value.is_nan() {
            serializer.serialize_str(NAN)
        } else if value == f64::INFINITY {
            serializer.serialize_str(INFINITY)
        } else if value == f64::NEG_INFINITY {
            serializer.serialize_str(NEG_INFINITY)
        } else {
            serializer.serialize_f64(value)
        }
    }
}

impl<'de> Deserialize<'de> for Float {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FloatVisitor).map(Float)
    }
}

struct FloatVisitor;

impl Visitor<'_> for FloatVisitor {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, \"NaN\", \"Infinity\" or \"-Infinity\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
        match v {
            NAN => Ok(f64::NAN),
            INFINITY => Ok(f64::INFINITY),
            NEG_INFINITY => Ok(f64::NEG_INFINITY),
            _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
        }
    }
}

pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    Float(*value).serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Float::deserialize(deserializer).map(|f| f.0)
}

/// Element-wise encoding for `Vec<f64>`
pub mod vec {
    use super::Float;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().copied().map(Float))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values = Vec::<Float>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|f| f.0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "crate::float")]
        x: f64,
        #[serde(with = "crate::float::vec")]
        v: Vec<f64>,
    }

    #[test]
    fn test_non_finite_written_as_strings() {
        let sample = Sample {
            x: f64::NAN,
            v: vec![1.5, f64::INFINITY, f64::NEG_INFINITY],
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"x":"NaN","v":[1.5,"Infinity","-Infinity"]}"#);

        let decoded: Sample = serde_json::from_str(&json).unwrap();
        assert!(decoded.x.is_nan());
        assert_eq!(decoded.v, vec![1.5, f64::INFINITY, f64::NEG_INFINITY]);
    }

    #[test]
    fn test_integers_accepted_and_other_strings_rejected() {
        let decoded: Sample = serde_json::from_str(r#"{"x":2,"v":[-3]}"#).unwrap();
        assert_eq!(decoded.x, 2.0);
        assert_eq!(decoded.v, vec![-3.0]);

        assert!(serde_json::from_str::<Sample>(r#"{"x":"inf","v":[]}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"x":null,"v":[]}"#).is_err());
    }
}
