use crate::error::DigestError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Whether a molecule has free ends or is a closed loop. Defaults to linear.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    #[default]
    Linear,
    Circular,
}

impl Topology {
    pub fn from_linear_flag(linear: bool) -> Self {
        if linear {
            Self::Linear
        } else {
            Self::Circular
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Circular => "circular",
        }
    }

    pub fn is_linear(self) -> bool {
        self == Self::Linear
    }

    pub fn is_circular(self) -> bool {
        self == Self::Circular
    }

    pub fn parse(text: &str) -> Result<Self, DigestError> {
        let norm = text.trim().to_ascii_lowercase();
        match norm.as_str() {
            "linear" => Ok(Self::Linear),
            "circular" => Ok(Self::Circular),
            _ => Err(DigestError::InvalidTopology(text.to_string())),
        }
    }
}

impl FromStr for Topology {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
