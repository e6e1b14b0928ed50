//! Fixed-point movement points.
//!
//! Remaining movement is decremented many times per turn by fractional
//! territory costs, so it is stored as an integer count of millionths rather
//! than a float. Floats only appear when reading scenario files.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Movement points with six decimal places of precision.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Movement(pub i64);

impl Movement {
    pub const SCALE: i64 = 1_000_000;
    pub const ZERO: Movement = Movement(0);
    pub const ONE: Movement = Movement(Self::SCALE);
    /// Used as the "no limit" sentinel by searches bounded by movement.
    pub const MAX: Movement = Movement(i64::MAX / 4);

    pub const fn from_int(value: i64) -> Self {
        Movement(value * Self::SCALE)
    }

    pub const fn from_raw(raw: i64) -> Self {
        Movement(raw)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    pub fn from_f64(value: f64) -> Self {
        Movement((value * Self::SCALE as f64).round() as i64)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whole movement points, rounded toward negative infinity.
    pub const fn floor_int(self) -> i64 {
        self.0.div_euclid(Self::SCALE)
    }

    /// Whole movement points, rounded toward positive infinity.
    pub const fn ceil_int(self) -> i64 {
        let floor = self.0.div_euclid(Self::SCALE);
        if self.0.rem_euclid(Self::SCALE) == 0 {
            floor
        } else {
            floor + 1
        }
    }

    pub fn max(self, other: Movement) -> Movement {
        if other > self {
            other
        } else {
            self
        }
    }

    pub fn min(self, other: Movement) -> Movement {
        if other < self {
            other
        } else {
            self
        }
    }
}

impl Add for Movement {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Movement(self.0 + rhs.0)
    }
}

impl AddAssign for Movement {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Movement {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Movement(self.0 - rhs.0)
    }
}

impl SubAssign for Movement {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Movement {
    type Output = Self;

    fn neg(self) -> Self {
        Movement(-self.0)
    }
}

impl Sum for Movement {
    fn sum<I: Iterator<Item = Movement>>(iter: I) -> Self {
        iter.fold(Movement::ZERO, |acc, m| acc + m)
    }
}

impl From<u32> for Movement {
    fn from(value: u32) -> Self {
        Movement::from_int(value as i64)
    }
}

impl fmt::Debug for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Movement({})", self)
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / Self::SCALE as u64;
        let frac = abs % Self::SCALE as u64;
        if frac == 0 {
            write!(f, "{}{}", sign, whole)
        } else {
            let digits = format!("{:06}", frac);
            write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
        }
    }
}

/// Error returned when movement text cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid movement value: {0:?}")]
pub struct ParseMovementError(pub String);

impl FromStr for Movement {
    type Err = ParseMovementError;

    /// Parses decimal text such as `3`, `1.5` or `-0.25` exactly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMovementError(s.to_string());
        let text = s.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(err());
        }
        if frac.len() > 6 || !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        let whole_val: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| err())?
        };
        let frac_val: i64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<6}", frac);
            padded.parse().map_err(|_| err())?
        };
        let raw = whole_val
            .checked_mul(Self::SCALE)
            .and_then(|w| w.checked_add(frac_val))
            .ok_or_else(err)?;
        Ok(Movement(if negative { -raw } else { raw }))
    }
}

impl Serialize for Movement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Movement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(i64),
            Float(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Int(v) => Ok(Movement::from_int(v)),
            Repr::Float(v) => Ok(Movement::from_f64(v)),
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}
