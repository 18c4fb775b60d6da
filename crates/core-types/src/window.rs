use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The look-back window of a price query, in whole minutes. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct WindowMinutes(u32);

impl WindowMinutes {
    pub fn new(minutes: u32) -> Result<Self, CoreError> {
        if minutes == 0 {
            return Err(CoreError::InvalidInput(
                "minutes".to_string(),
                "must be a positive integer".to_string(),
            ));
        }
        Ok(Self(minutes))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for WindowMinutes {
    type Error = CoreError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::new(minutes)
    }
}

impl From<WindowMinutes> for u32 {
    fn from(window: WindowMinutes) -> Self {
        window.0
    }
}

impl FromStr for WindowMinutes {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minutes = s.trim().parse::<u32>().map_err(|_| {
            CoreError::InvalidInput("minutes".to_string(), "must be a positive integer".to_string())
        })?;
        Self::new(minutes)
    }
}

impl fmt::Display for WindowMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
