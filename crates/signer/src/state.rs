//! Last-signed state and its crash-safe persistence.
//!
//! The guard only ever needs to answer one question: is this request at or
//! beyond the last thing we signed? The state record is therefore tiny -
//! (height, round, step) plus the last signature and sign-bytes - and is
//! rewritten atomically on every successful signing.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Result, SignerError};

/// The step of a signing request. Later steps at the same height and round
/// are allowed; earlier ones are regressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignStep {
    /// First voting round
    Prevote = 1,
    /// Second voting round
    Precommit = 2,
    /// Block proposal
    Proposal = 3,
}

impl SignStep {
    /// The small-integer encoding used in the state file.
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for SignStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignStep::Prevote => write!(f, "prevote"),
            SignStep::Precommit => write!(f, "precommit"),
            SignStep::Proposal => write!(f, "proposal"),
        }
    }
}

/// Hex-encoded optional byte strings in the JSON state file.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let value: Option<String> = Option::deserialize(deserializer)?;
        value
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// What the signer last signed.
///
/// `step` is the ordinal of [`SignStep`], with `0` meaning "never signed
/// anything". Unknown JSON fields are ignored on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignState {
    /// Height of the last signed message
    #[serde(default)]
    pub height: u64,
    /// Round of the last signed message
    #[serde(default)]
    pub round: u64,
    /// Step ordinal of the last signed message, 0 if none
    #[serde(default)]
    pub step: u8,
    /// The last signature produced
    #[serde(default, with = "hex_bytes")]
    pub signature: Option<Vec<u8>>,
    /// The exact bytes that were signed
    #[serde(default, with = "hex_bytes")]
    pub sign_bytes: Option<Vec<u8>>,
}

impl SignState {
    /// Compare a request against the last signed (height, round, step).
    ///
    /// Returns `Ok(true)` when the request is exactly the last signed
    /// position (a potential re-sign), `Ok(false)` when it is strictly
    /// beyond it, and [`SignerError::Regression`] when it is lexicographically
    /// behind.
    pub fn check_hrs(&self, height: u64, round: u64, step: SignStep) -> Result<bool> {
        let last = (self.height, self.round, self.step);
        let request = (height, round, step.ordinal());

        if request < last {
            return Err(SignerError::Regression {
                height,
                round,
                step: step.ordinal(),
                last_height: self.height,
                last_round: self.round,
                last_step: self.step,
            });
        }
        Ok(request == last)
    }

    /// Load the state from disk.
    ///
    /// A missing, empty, or unparsable file is an empty state: the guard
    /// only ever refuses, so forgetting history is safe while inventing it
    /// would not be.
    pub fn load_from(path: &Path) -> Self {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Self::default();
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "Failed to read sign state; treating as empty");
                return Self::default();
            }
        };
        if bytes.is_empty() {
            return Self::default();
        }
        match serde_json::from_slice(&bytes) {
            Ok(state) => state,
            Err(error) => {
                warn!(path = %path.display(), %error, "Corrupt sign state; treating as empty");
                Self::default()
            }
        }
    }

    /// Persist the state: write a temporary file in the same directory,
    /// fsync it, then rename over the target.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| SignerError::Serialization(e.to_string()))?;
        write_atomically(path, &json)
    }
}

/// Write-temp-then-rename with an fsync in between.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or_else(|| Path::new(".")))?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| SignerError::Io(e.error))?;
    Ok(())
}
