//! Shared-secret gate for the destructive wipe operation.

use std::fmt;

/// Compares caller-supplied keys against the configured delete key.
///
/// The secret is handed in at construction so the gate can be exercised
/// without any global configuration. A validator built with an empty secret
/// rejects every key.
#[derive(Clone)]
pub struct KeyValidator {
    configured: String,
}

impl KeyValidator {
    pub fn new(configured: impl Into<String>) -> Self {
        Self {
            configured: configured.into(),
        }
    }

    /// Case-sensitive exact match against the configured key.
    pub fn validate(&self, supplied: &str) -> bool {
        validate(supplied, &self.configured)
    }

    /// Whether a non-empty secret is configured at all.
    pub fn is_armed(&self) -> bool {
        !self.configured.is_empty()
    }
}

impl fmt::Debug for KeyValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyValidator")
            .field("configured", &"<redacted>")
            .finish()
    }
}

/// Compare a supplied key with a configured key.
///
/// Empty input on either side never matches.
pub fn validate(supplied: &str, configured: &str) -> bool {
    !configured.is_empty() && supplied == configured
}
