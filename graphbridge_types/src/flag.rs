//! Tri-state boolean flag used across the host boundary

use serde::{Deserialize, Serialize};

/// Boolean with an explicit "unknown" state
///
/// Encoded as an `i32` at the boundary: `-1` unknown, `0` false, `1` true.
#[repr(i32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoolFlag {
    #[default]
    Unknown = -1,
    False = 0,
    True = 1,
}

impl BoolFlag {
    /// Decode from the boundary integer; any other value is `None`
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(BoolFlag::Unknown),
            0 => Some(BoolFlag::False),
            1 => Some(BoolFlag::True),
            _ => None,
        }
    }

    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// `None` when unknown
    #[inline]
    pub const fn to_option(self) -> Option<bool> {
        match self {
            BoolFlag::Unknown => None,
            BoolFlag::False => Some(false),
            BoolFlag::True => Some(true),
        }
    }
}

impl From<bool> for BoolFlag {
    fn from(value: bool) -> Self {
        if value {
            BoolFlag::True
        } else {
            BoolFlag::False
        }
    }
}

impl From<Option<bool>> for BoolFlag {
    fn from(value: Option<bool>) -> Self {
        value.map_or(BoolFlag::Unknown, BoolFlag::from)
    }
}
