//! Boundary regimes of a parametric axis.

use crate::error::NurbsError;
use std::fmt;
use std::str::FromStr;

/// How a parametric axis behaves at its ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Boundary {
    /// Uniform, non-interpolating ends.
    #[default]
    Open,
    /// Knots clamped so the curve interpolates its end control points.
    Clamped,
    /// Periodic: the control hull wraps around.
    Closed,
}

impl Boundary {
    /// The token accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Boundary::Open => "open",
            Boundary::Clamped => "clamped",
            Boundary::Closed => "closed",
        }
    }

    /// True for periodic axes.
    #[inline]
    pub fn is_closed(self) -> bool {
        self == Boundary::Closed
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Boundary {
    type Err = NurbsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Boundary::Open),
            "clamped" => Ok(Boundary::Clamped),
            "closed" => Ok(Boundary::Closed),
            other => Err(NurbsError::Boundary {
                token: other.to_string(),
            }),
        }
    }
}
