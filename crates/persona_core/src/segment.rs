//! Demographic segment keys derived from a record: primary persona and age bucket.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator between the primary token and the variant in a persona string.
pub const PERSONA_DELIMITER: char = '_';

/// Leading token of a persona string (`"apparel_footwear"` -> `"apparel"`).
///
/// Without a delimiter the whole string is the primary persona.
pub fn primary_persona(persona: &str) -> &str {
    persona
        .split_once(PERSONA_DELIMITER)
        .map_or(persona, |(primary, _)| primary)
}

/// Named age range used for targeted allocation.
///
/// Ages under 18 have no bucket. The label for ages 55 through 69 is
/// `"54-70"` even though 54 itself belongs to `"45-54"`; the label is kept
/// as-is because callers already send it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AgeBucket {
    From18To24,
    From25To34,
    From35To44,
    From45To54,
    From55To69,
    From70,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 6] = [
        AgeBucket::From18To24,
        AgeBucket::From25To34,
        AgeBucket::From35To44,
        AgeBucket::From45To54,
        AgeBucket::From55To69,
        AgeBucket::From70,
    ];

    pub fn from_age(age: u32) -> Option<Self> {
        match age {
            0..=17 => None,
            18..=24 => Some(Self::From18To24),
            25..=34 => Some(Self::From25To34),
            35..=44 => Some(Self::From35To44),
            45..=54 => Some(Self::From45To54),
            55..=69 => Some(Self::From55To69),
            _ => Some(Self::From70),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::From18To24 => "18-24",
            Self::From25To34 => "25-34",
            Self::From35To44 => "35-44",
            Self::From45To54 => "45-54",
            Self::From55To69 => "54-70",
            Self::From70 => "70-and-above",
        }
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAgeBucket(pub String);

impl fmt::Display for UnknownAgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown age bucket '{}'", self.0)
    }
}

impl std::error::Error for UnknownAgeBucket {}

impl FromStr for AgeBucket {
    type Err = UnknownAgeBucket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|bucket| bucket.label() == s)
            .ok_or_else(|| UnknownAgeBucket(s.to_string()))
    }
}

impl TryFrom<String> for AgeBucket {
    type Error = UnknownAgeBucket;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AgeBucket> for String {
    fn from(bucket: AgeBucket) -> Self {
        bucket.label().to_string()
    }
}
