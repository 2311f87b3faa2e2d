//! Theme change detection
//!
//! Suppresses redundant theme applications by comparing a content hash of
//! each candidate descriptor against the last one that was applied.

use std::fmt;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::theme::ThemeDescriptor;

/// SHA-256 (hex) of a descriptor's canonical JSON.
///
/// Canonical because `ThemeDescriptor::colors` is a BTreeMap keyed by
/// `ThemeRole`, so keys always serialize in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(descriptor: &ThemeDescriptor) -> Self {
        let mut hasher = Sha256::new();
        // Serializing a map of unit-variant keys to strings cannot fail
        match serde_json::to_vec(descriptor) {
            Ok(bytes) => hasher.update(&bytes),
            Err(e) => {
                debug!(error = %e, "Descriptor serialization failed, hashing debug form");
                hasher.update(format!("{:?}", descriptor).as_bytes());
            }
        }
        Fingerprint(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Gate in front of the theme sink.
///
/// Stores the fingerprint of the last applied theme and only lets a
/// candidate through when its fingerprint differs.
#[derive(Debug, Default)]
pub struct ChangeGate {
    last_applied: Option<Fingerprint>,
    /// Value of `last_applied` before the most recent accepted candidate
    previous: Option<Fingerprint>,
}

impl ChangeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `descriptor` should be applied.
    ///
    /// Returns `true` (and records the new fingerprint) when nothing was
    /// applied yet or the content differs. Returns `false` with no side
    /// effect otherwise.
    pub fn should_apply(&mut self, descriptor: &ThemeDescriptor) -> bool {
        let candidate = Fingerprint::of(descriptor);

        if self.last_applied.as_ref() == Some(&candidate) {
            debug!(fingerprint = %candidate, "Theme unchanged, skipping apply");
            return false;
        }

        debug!(
            old = ?self.last_applied.as_ref().map(Fingerprint::as_str),
            new = %candidate,
            "Theme change detected"
        );
        self.previous = self.last_applied.replace(candidate);
        true
    }

    /// Undo the last accepted candidate after the sink rejected it.
    pub fn revert(&mut self) {
        self.last_applied = self.previous.take();
    }

    /// Forget the stored fingerprint.
    ///
    /// Next call to `should_apply()` will return true.
    pub fn reset(&mut self) {
        self.last_applied = None;
        self.previous = None;
    }

    pub fn last_applied(&self) -> Option<&Fingerprint> {
        self.last_applied.as_ref()
    }
}
