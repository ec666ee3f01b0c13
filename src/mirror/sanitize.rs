//! Path-segment sanitization for ToC node names.

/// Make a node name usable as one path segment.
///
/// Only the path separator `/` is rewritten (to `-`). Other characters
/// are kept as-is so names match trees saved by earlier mirrors.
pub fn sanitize(name: &str) -> String {
    name.replace('/', "-")
}

/// Names the ToC emits when an entry is missing its value.
const PLACEHOLDERS: [&str; 2] = ["undefined", "null"];

/// Whether a name or reference is empty or a placeholder for a missing
/// value, meaning the ToC entry is malformed.
pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || PLACEHOLDERS.contains(&trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_separator() {
        assert_eq!(sanitize("A/B"), "A-B");
        assert_eq!(sanitize("a//b/"), "a--b-");
    }

    #[test]
    fn test_plain_names_unchanged() {
        assert_eq!(sanitize("Plain"), "Plain");
        assert_eq!(sanitize("Brakes & Hubs: Overview?"), "Brakes & Hubs: Overview?");
    }

    #[test]
    fn test_idempotent() {
        for name in ["A/B", "Plain", "/", "", "x/y/z", "already-clean"] {
            let once = sanitize(name);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn test_placeholders() {
        assert!(is_placeholder(""));
        assert!(is_placeholder("  "));
        assert!(is_placeholder("undefined"));
        assert!(is_placeholder("null"));
        assert!(!is_placeholder("Undefined Behaviour Chapter"));
        assert!(!is_placeholder("/doc1.svc"));
    }
}
