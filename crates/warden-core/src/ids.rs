//! ID prefix constants.
//!
//! IDs are formatted as `{prefix}-{8 hex chars}`, e.g. `aud-3f9c01ab`.

/// Prefix for audit IDs.
pub const PREFIX_AUDIT: &str = "aud";

/// All known prefixes.
pub const ALL_PREFIXES: &[&str] = &[PREFIX_AUDIT];

/// Check that `id` has the shape `{prefix}-{8 lowercase hex chars}`.
#[must_use]
pub fn is_valid_id(prefix: &str, id: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|hex| {
            hex.len() == 8
                && hex
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_ids() {
        assert!(is_valid_id(PREFIX_AUDIT, "aud-3f9c01ab"));
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(!is_valid_id(PREFIX_AUDIT, "aud-3f9c01a"));
        assert!(!is_valid_id(PREFIX_AUDIT, "aud-3F9C01AB"));
        assert!(!is_valid_id(PREFIX_AUDIT, "fnd-3f9c01ab"));
        assert!(!is_valid_id(PREFIX_AUDIT, "aud3f9c01ab"));
    }
}
