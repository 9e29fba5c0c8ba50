//! Exact quantity arithmetic for the two dimensions the planner reasons
//! about: CPU (integer milli-cores) and memory (integer bytes).
//!
//! Kubernetes expresses both as strings (`"500m"`, `"2.5Gi"`). Parsing is
//! total over the accepted grammar and parse-then-format preserves the
//! numeric value, so demand totals and test expectations are stable.

use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid quantity {input:?}: {reason}")]
pub struct InvalidQuantity {
    pub input: String,
    pub reason: &'static str,
}

fn invalid(input: &str, reason: &'static str) -> InvalidQuantity {
    InvalidQuantity {
        input: input.to_string(),
        reason,
    }
}

/// Splits `"12.5"` into `("12", "5")`. Rejects empty or non-digit parts and
/// a trailing dot.
fn split_decimal(s: &str) -> Option<(&str, &str)> {
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => {
            if f.is_empty() {
                return None;
            }
            (w, f)
        }
        None => (s, ""),
    };
    if whole.is_empty()
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    Some((whole, frac))
}

/// CPU quantity held as whole milli-cores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CpuQty {
    millis: u64,
}

impl CpuQty {
    pub const fn from_millis(millis: u64) -> Self {
        CpuQty { millis }
    }

    pub const fn from_cores(cores: u64) -> Self {
        CpuQty {
            millis: cores * 1_000,
        }
    }

    pub fn millis(self) -> u64 {
        self.millis
    }

    pub fn is_zero(self) -> bool {
        self.millis == 0
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        CpuQty {
            millis: self.millis.saturating_sub(rhs.millis),
        }
    }

    /// Multiplies by `(1 + over_subscription)` expressed in basis points.
    /// Floors, so inflated capacity is never overstated.
    pub fn over_subscribed(self, basis_points: u32) -> Self {
        CpuQty {
            millis: mul_bps(self.millis, basis_points),
        }
    }

    pub fn times(self, n: u64) -> Self {
        CpuQty {
            millis: saturating_mul(self.millis, n),
        }
    }

    /// Number of `per_node`-sized nodes needed to host `self`, rounded up.
    /// `None` when `per_node` is zero.
    pub fn ceil_div(self, per_node: Self) -> Option<u64> {
        ceil_div(self.millis, per_node.millis)
    }
}

impl Add for CpuQty {
    type Output = CpuQty;

    fn add(self, rhs: CpuQty) -> CpuQty {
        CpuQty {
            millis: self.millis + rhs.millis,
        }
    }
}

impl AddAssign for CpuQty {
    fn add_assign(&mut self, rhs: CpuQty) {
        self.millis += rhs.millis;
    }
}

impl FromStr for CpuQty {
    type Err = InvalidQuantity;

    fn from_str(s: &str) -> Result<Self, InvalidQuantity> {
        if let Some(millis) = s.strip_suffix('m') {
            if millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid(s, "milli-cores must be a whole number"));
            }
            let millis = millis
                .parse::<u64>()
                .map_err(|_| invalid(s, "milli-cores out of range"))?;
            return Ok(CpuQty::from_millis(millis));
        }
        let (whole, frac) = split_decimal(s).ok_or_else(|| invalid(s, "not a decimal number"))?;
        if frac.len() > 3 {
            return Err(invalid(s, "sub-milli-core precision is not representable"));
        }
        let whole = whole
            .parse::<u64>()
            .map_err(|_| invalid(s, "cores out of range"))?;
        let mut frac_millis = 0u64;
        if !frac.is_empty() {
            frac_millis = frac
                .parse::<u64>()
                .map_err(|_| invalid(s, "cores out of range"))?;
            for _ in frac.len()..3 {
                frac_millis *= 10;
            }
        }
        let millis = whole
            .checked_mul(1_000)
            .and_then(|m| m.checked_add(frac_millis))
            .ok_or_else(|| invalid(s, "cores out of range"))?;
        Ok(CpuQty::from_millis(millis))
    }
}

impl fmt::Display for CpuQty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.millis % 1_000 == 0 {
            write!(f, "{}", self.millis / 1_000)
        } else {
            write!(f, "{}m", self.millis)
        }
    }
}

const KI: u64 = 1 << 10;
const MI: u64 = 1 << 20;
const GI: u64 = 1 << 30;
const TI: u64 = 1 << 40;

/// Memory quantity held as whole bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemQty {
    bytes: u64,
}

impl MemQty {
    pub const fn from_bytes(bytes: u64) -> Self {
        MemQty { bytes }
    }

    pub const fn from_mebibytes(mebibytes: u64) -> Self {
        MemQty {
            bytes: mebibytes * MI,
        }
    }

    pub fn bytes(self) -> u64 {
        self.bytes
    }

    pub fn is_zero(self) -> bool {
        self.bytes == 0
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        MemQty {
            bytes: self.bytes.saturating_sub(rhs.bytes),
        }
    }

    pub fn over_subscribed(self, basis_points: u32) -> Self {
        MemQty {
            bytes: mul_bps(self.bytes, basis_points),
        }
    }

    pub fn times(self, n: u64) -> Self {
        MemQty {
            bytes: saturating_mul(self.bytes, n),
        }
    }

    pub fn ceil_div(self, per_node: Self) -> Option<u64> {
        ceil_div(self.bytes, per_node.bytes)
    }
}

impl Add for MemQty {
    type Output = MemQty;

    fn add(self, rhs: MemQty) -> MemQty {
        MemQty {
            bytes: self.bytes + rhs.bytes,
        }
    }
}

impl AddAssign for MemQty {
    fn add_assign(&mut self, rhs: MemQty) {
        self.bytes += rhs.bytes;
    }
}

impl FromStr for MemQty {
    type Err = InvalidQuantity;

    fn from_str(s: &str) -> Result<Self, InvalidQuantity> {
        let split = s
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(split);
        let multiplier: u64 = match suffix {
            "" => 1,
            "K" => 1_000,
            "M" => 1_000_000,
            "G" => 1_000_000_000,
            "T" => 1_000_000_000_000,
            "Ki" => KI,
            "Mi" => MI,
            "Gi" => GI,
            "Ti" => TI,
            _ => return Err(invalid(s, "unrecognized suffix")),
        };
        let (whole, frac) = split_decimal(number).ok_or_else(|| invalid(s, "not a decimal number"))?;
        if frac.len() > 12 {
            return Err(invalid(s, "too many fractional digits"));
        }
        let whole = whole
            .parse::<u128>()
            .map_err(|_| invalid(s, "bytes out of range"))?;
        let frac_value = if frac.is_empty() {
            0u128
        } else {
            frac.parse::<u128>()
                .map_err(|_| invalid(s, "bytes out of range"))?
        };
        let scale = 10u128.pow(frac.len() as u32);
        let mantissa = whole
            .checked_mul(scale)
            .and_then(|w| w.checked_add(frac_value))
            .ok_or_else(|| invalid(s, "bytes out of range"))?;
        let scaled = mantissa
            .checked_mul(multiplier as u128)
            .ok_or_else(|| invalid(s, "bytes out of range"))?;
        if scaled % scale != 0 {
            return Err(invalid(s, "not a whole number of bytes"));
        }
        let bytes = u64::try_from(scaled / scale).map_err(|_| invalid(s, "bytes out of range"))?;
        Ok(MemQty::from_bytes(bytes))
    }
}

impl fmt::Display for MemQty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (unit, suffix) in [(TI, "Ti"), (GI, "Gi"), (MI, "Mi"), (KI, "Ki")] {
            if self.bytes != 0 && self.bytes % unit == 0 {
                return write!(f, "{}{}", self.bytes / unit, suffix);
            }
        }
        write!(f, "{}", self.bytes)
    }
}

fn mul_bps(value: u64, basis_points: u32) -> u64 {
    let scaled = value as u128 * (10_000 + basis_points as u128) / 10_000;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

fn saturating_mul(value: u64, n: u64) -> u64 {
    u64::try_from(value as u128 * n as u128).unwrap_or(u64::MAX)
}

fn ceil_div(value: u64, per: u64) -> Option<u64> {
    if per == 0 {
        return None;
    }
    Some(value / per + u64::from(value % per != 0))
}
