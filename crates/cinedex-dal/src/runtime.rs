use std::{fmt::Display, str::FromStr};

use garde::Validate;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Movie runtime in minutes, exchanged in JSON as `"<n> mins"`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Validate)]
#[garde(transparent)]
pub struct Runtime(#[garde(range(min = 1))] i32);

#[derive(Debug, thiserror::Error)]
#[error("invalid runtime format")]
pub struct InvalidRuntimeFormat;

impl Runtime {
    pub fn new(minutes: i32) -> Self {
        Runtime(minutes)
    }

    pub fn minutes(&self) -> i32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<i32> for Runtime {
    fn from(value: i32) -> Self {
        Runtime(value)
    }
}

impl Display for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl FromStr for Runtime {
    type Err = InvalidRuntimeFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minutes = s
            .strip_suffix(" mins")
            .ok_or(InvalidRuntimeFormat)?
            .parse::<i32>()
            .map_err(|_| InvalidRuntimeFormat)?;
        Ok(Runtime(minutes))
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
