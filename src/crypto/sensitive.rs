//! Request-scoped plaintext that must never reach logs or responses.

use serde::{Deserialize, Deserializer};
use zeroize::Zeroize;

/// Plaintext credential or secret value.
///
/// Zeroized on drop, redacted in `Debug`, and deliberately not `Serialize`,
/// so it cannot be echoed back to a client by accident.
#[derive(Clone)]
pub struct Sensitive(String);

impl Sensitive {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the plaintext for an outbound call.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Drop for Sensitive {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Sensitive(<redacted>)")
    }
}

impl From<String> for Sensitive {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for Sensitive {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let token = Sensitive::new("gho_supersecret");
        let rendered = format!("{:?}", token);
        assert!(!rendered.contains("supersecret"));
        assert_eq!(token.expose(), "gho_supersecret");
    }

    #[test]
    fn test_deserialize_from_json_string() {
        let value: Sensitive = serde_json::from_str(r#""hunter2""#).unwrap();
        assert_eq!(value.expose(), "hunter2");
        assert!(!value.is_empty());
    }

    #[test]
    fn test_clone_outlives_zeroized_original() {
        let original = Sensitive::new("gho_clone");
        let copy = original.clone();
        drop(original);
        assert_eq!(copy.expose(), "gho_clone");
    }
}
