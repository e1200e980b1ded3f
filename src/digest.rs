//! Running SHA-256 over predicted outcomes, in generator order.
//!
//! Each case contributes the compact JSON encoding of its [`Outcome`] followed
//! by a newline. The digest over the exhaustive domain is a recorded fixture.
use crate::domain::{self, DomainMode};
use crate::oracle;
use crate::outcome::Outcome;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Recorded digest of the exhaustive domain. Changing any oracle rule changes
/// this value; update it only as a reviewed change.
pub const EXHAUSTIVE_OUTCOME_DIGEST: &str =
    "3a2834dec89abddf1032f9b9c1c68e08f8c216f88eca8b1100619549dd005f7b";

/// Hex digits of the digest printed in resume tokens.
pub const TOKEN_PREFIX_LEN: usize = 8;

/// Accumulator owned by whoever walks the domain. Cloning snapshots the state.
#[derive(Clone, Default)]
pub struct OutcomeDigest {
    hasher: Sha256,
    folded: usize,
}

impl OutcomeDigest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold(&mut self, outcome: &Outcome) -> Result<()> {
        let encoded = serde_json::to_vec(outcome).context("encode outcome for digest")?;
        self.hasher.update(&encoded);
        self.hasher.update(b"\n");
        self.folded += 1;
        Ok(())
    }

    /// Number of outcomes folded so far.
    pub fn folded(&self) -> usize {
        self.folded
    }

    /// Full lowercase hex digest of everything folded so far.
    pub fn hex(&self) -> String {
        format!("{:x}", self.hasher.clone().finalize())
    }

    pub fn prefix(&self, len: usize) -> String {
        let mut hex = self.hex();
        hex.truncate(len);
        hex
    }

    pub fn token_prefix(&self) -> String {
        self.prefix(TOKEN_PREFIX_LEN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainDigest {
    pub case_count: usize,
    pub hex: String,
}

/// Classify every case of `mode` and digest the outcomes. Nothing is compiled.
pub fn domain_digest(mode: DomainMode) -> Result<DomainDigest> {
    let domain = domain::enumerate(mode);
    let mut digest = OutcomeDigest::new();
    for spec in domain.iter() {
        let outcome = oracle::classify(&spec)
            .with_context(|| format!("classify case {}", digest.folded()))?;
        digest.fold(&outcome)?;
    }
    tracing::debug!(mode = ?mode, cases = digest.folded(), "domain digest computed");
    Ok(DomainDigest {
        case_count: digest.folded(),
        hex: digest.hex(),
    })
}
