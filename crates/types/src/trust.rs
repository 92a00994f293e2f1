//! Trust anchoring and the skipping-verification quorum fraction.

use serde::{Deserialize, Serialize};
use skiplight_crypto::{Hash, NIL_HASH};

use crate::{Error, Result};

/// The subjective trust anchor a light client starts from.
///
/// Obtained out of band (a social checkpoint, an operator-supplied hash);
/// everything else the client ever trusts chains back to this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustOptions {
    /// Trusting period in milliseconds: how long a trusted header may be
    /// used to extend trust before it expires
    pub period: u64,
    /// Height of the trusted anchor header
    pub height: u64,
    /// Expected hash of the anchor header
    pub hash: Hash,
}

impl TrustOptions {
    /// Validate the options: positive period and height, non-zero hash.
    pub fn validate(&self) -> Result<()> {
        if self.period == 0 {
            return Err(Error::InvalidTrustOptions(
                "trusting period must be positive".into(),
            ));
        }
        if self.height == 0 {
            return Err(Error::InvalidTrustOptions(
                "trusted height must be positive".into(),
            ));
        }
        if self.hash == NIL_HASH {
            return Err(Error::InvalidTrustOptions(
                "trusted hash must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// The fraction of previously-trusted voting power that must sign a
/// non-adjacent header for trust to carry across the gap.
///
/// Constrained to `1/3 <= numerator/denominator <= 1`; the 1/3 floor is the
/// classic BFT bound below which a faulty minority could fake the overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustLevel {
    /// Fraction numerator
    pub numerator: u64,
    /// Fraction denominator, non-zero
    pub denominator: u64,
}

impl TrustLevel {
    /// The default trust level of 1/3.
    pub const ONE_THIRD: TrustLevel = TrustLevel {
        numerator: 1,
        denominator: 3,
    };

    /// Full overlap: skipping degenerates to requiring a 100% carry-over.
    pub const FULL: TrustLevel = TrustLevel {
        numerator: 1,
        denominator: 1,
    };

    /// Create a trust level, validating the bounds.
    pub fn new(numerator: u64, denominator: u64) -> Result<Self> {
        let level = Self {
            numerator,
            denominator,
        };
        level.validate()?;
        Ok(level)
    }

    /// Validate `1/3 <= n/d <= 1` and `d > 0`.
    pub fn validate(&self) -> Result<()> {
        if self.denominator == 0 {
            return Err(Error::InvalidTrustLevel("zero denominator".into()));
        }
        let n = u128::from(self.numerator);
        let d = u128::from(self.denominator);
        if n * 3 < d {
            return Err(Error::InvalidTrustLevel(format!(
                "{}/{} is below the 1/3 floor",
                self.numerator, self.denominator
            )));
        }
        if n > d {
            return Err(Error::InvalidTrustLevel(format!(
                "{}/{} exceeds 1",
                self.numerator, self.denominator
            )));
        }
        Ok(())
    }

    /// Whether `tallied` power strictly exceeds this fraction of `total`.
    pub fn is_met(&self, tallied: u128, total: u128) -> bool {
        tallied * u128::from(self.denominator) > total * u128::from(self.numerator)
    }
}

impl Default for TrustLevel {
    fn default() -> Self {
        Self::ONE_THIRD
    }
}

impl std::fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
