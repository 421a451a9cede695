//! Email identity normalization.
//!
//! Every ingress point (import, submission, vote, status lookup) funnels raw
//! input through [`normalize_email`] so one canonical form is the key
//! everywhere downstream and later comparisons are plain equality. The shape
//! check mirrors `local@domain.tld` with no whitespace anywhere and a
//! non-empty label on each side of the final dot.

/// Trim, lower-case, and shape-check a raw email. Returns `None` when the
/// input cannot name a voter identity.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_ascii_lowercase();

    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || local.chars().any(char::is_whitespace) {
        return None;
    }
    if domain.contains('@') || domain.chars().any(char::is_whitespace) {
        return None;
    }
    let (head, tail) = domain.rsplit_once('.')?;
    if head.is_empty() || tail.is_empty() {
        return None;
    }

    Some(email)
}

#[cfg(test)]
mod tests {
    use super::normalize_email;

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(
            normalize_email("  A@X.com "),
            Some("a@x.com".to_string())
        );
    }

    #[test]
    fn accepts_dotted_local_and_subdomains() {
        assert_eq!(
            normalize_email("first.last@mail.example.com"),
            Some("first.last@mail.example.com".to_string())
        );
    }

    #[test]
    fn rejects_malformed_shapes() {
        for raw in ["", "   ", "no-at.com", "a@", "@x.com", "a@nodot", "a@x.", "a@.com", "a b@x.com", "a@x .com", "a@b@c.com"] {
            assert_eq!(normalize_email(raw), None, "should reject {raw:?}");
        }
    }
}
