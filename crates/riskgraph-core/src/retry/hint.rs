//! Server-suggested cool-down extraction.

use std::sync::OnceLock;

use regex::Regex;

fn retry_delay_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)retry[_ ]delay\s*\{\s*seconds\s*:\s*(\d+)")
            .expect("retry delay pattern is a valid regex")
    })
}

/// Extract the `retry_delay { seconds: N }` directive from an error message.
///
/// Whitespace (including newlines) is tolerated anywhere inside the braces.
/// Returns `None` when no directive is present or `N` does not fit in a `u64`.
pub fn parse_retry_delay(message: &str) -> Option<u64> {
    retry_delay_pattern()
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_compact_directive() {
        assert_eq!(parse_retry_delay("retry_delay {seconds: 7}"), Some(7));
        assert_eq!(parse_retry_delay("retry_delay { seconds: 7 }"), Some(7));
    }

    #[test]
    fn test_parses_multiline_grpc_text() {
        let msg = "429 Resource has been exhausted.\n[violations {\n}\n, retry_delay {\n  seconds: 45\n}\n]";
        assert_eq!(parse_retry_delay(msg), Some(45));
    }

    #[test]
    fn test_parses_loose_spacing_and_spaced_token() {
        assert_eq!(parse_retry_delay("retry_delay{ seconds :12 }"), Some(12));
        assert_eq!(parse_retry_delay("Retry Delay { seconds: 3 }"), Some(3));
    }

    #[test]
    fn test_missing_or_malformed_directive() {
        assert_eq!(parse_retry_delay("quota exceeded"), None);
        assert_eq!(parse_retry_delay("retry_delay { nanos: 500 }"), None);
        assert_eq!(parse_retry_delay("retry_delay { seconds: -4 }"), None);
        assert_eq!(
            parse_retry_delay("retry_delay { seconds: 99999999999999999999999 }"),
            None
        );
    }
}
