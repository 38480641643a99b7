use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Movie runtime in minutes.
///
/// Serializes as the quoted string `"<n> mins"`. Accepts either a bare
/// integer or that same string form on input, so clients can round-trip
/// responses back through the API unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Runtime(pub i32);

impl Runtime {
    pub fn minutes(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{} mins", self.0))
    }
}

struct RuntimeVisitor;

impl<'de> Visitor<'de> for RuntimeVisitor {
    type Value = Runtime;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or a string in the format \"<minutes> mins\"")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Runtime, E> {
        i32::try_from(value)
            .map(Runtime)
            .map_err(|_| E::custom("runtime is out of range"))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Runtime, E> {
        i32::try_from(value)
            .map(Runtime)
            .map_err(|_| E::custom("runtime is out of range"))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Runtime, E> {
        let minutes = value
            .strip_suffix(" mins")
            .and_then(|n| n.parse::<i32>().ok())
            .ok_or_else(|| E::custom("invalid runtime format"))?;
        Ok(Runtime(minutes))
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Runtime, D::Error> {
        deserializer.deserialize_any(RuntimeVisitor)
    }
}
