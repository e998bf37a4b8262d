//! Fenced code block extraction from free-form model output.
//!
//! Models are asked for bare code but usually answer with markdown. The
//! first fenced block wins; with no complete fence the raw text is kept,
//! and the result is flagged so callers can tell the two apart.

use std::sync::LazyLock;

use regex::Regex;

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Opening fence with optional language tag, one newline, lazily
    // captured body, closing fence. An unterminated fence fails the
    // match entirely and falls through to the raw-text path.
    Regex::new(r"(?s)```[A-Za-z0-9_+.#-]*[ \t]*\r?\n(.*?)\r?\n?```").unwrap()
});

/// Result of an extraction attempt. `fenced` is false when no complete
/// fenced block was found and the input was passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub text: String,
    pub fenced: bool,
}

/// Pull the first fenced code block out of `response`. Falls back to the
/// raw input when no complete fence is present.
pub fn extract(response: &str) -> Extracted {
    match FENCE_RE.captures(response) {
        Some(captures) => Extracted {
            text: captures[1].to_string(),
            fenced: true,
        },
        None => Extracted {
            text: response.to_string(),
            fenced: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_fenced_block() {
        let result = extract("```\ndef fibonacci(n):\n    return n\n```");
        assert!(result.fenced);
        assert_eq!(result.text, "def fibonacci(n):\n    return n");
    }

    #[test]
    fn test_language_tagged_block() {
        let result = extract("Here you go:\n```python\nx = 1\n```\nEnjoy!");
        assert!(result.fenced);
        assert_eq!(result.text, "x = 1");
    }

    #[test]
    fn test_first_of_multiple_blocks() {
        let input = "```python\nfirst = 1\n```\nand also\n```python\nsecond = 2\n```";
        let result = extract(input);
        assert!(result.fenced);
        assert_eq!(result.text, "first = 1");
    }

    #[test]
    fn test_unterminated_fence_falls_back_raw() {
        let input = "```python\nx = 1\nno closing fence here";
        let result = extract(input);
        assert!(!result.fenced);
        assert_eq!(result.text, input);
    }

    #[test]
    fn test_no_fence_returns_input_unchanged() {
        let input = "def fibonacci(n):\n    return n";
        let result = extract(input);
        assert!(!result.fenced);
        assert_eq!(result.text, input);
    }

    #[test]
    fn test_idempotent_on_unfenced_text() {
        let input = "plain code with no fences";
        let once = extract(input);
        let twice = extract(&once.text);
        assert_eq!(once.text, twice.text);
    }

    #[test]
    fn test_exact_inner_text_no_added_blank_lines() {
        let result = extract("```python\nline1\nline2\n```");
        assert_eq!(result.text, "line1\nline2");
        assert!(!result.text.starts_with('\n'));
        assert!(!result.text.ends_with('\n'));
    }

    #[test]
    fn test_inner_blank_lines_preserved() {
        let result = extract("```\na = 1\n\nb = 2\n```");
        assert_eq!(result.text, "a = 1\n\nb = 2");
    }

    #[test]
    fn test_empty_block() {
        let result = extract("```\n```");
        assert!(result.fenced);
        assert_eq!(result.text, "");
    }

    #[test]
    fn test_windows_line_endings() {
        let result = extract("```python\r\nx = 1\r\n```");
        assert!(result.fenced);
        assert_eq!(result.text, "x = 1");
    }

    #[test]
    fn test_tag_with_trailing_space() {
        let result = extract("```python \nx = 1\n```");
        assert!(result.fenced);
        assert_eq!(result.text, "x = 1");
    }

    #[test]
    fn test_prose_around_block_discarded() {
        let input = "Sure! Here is the fix.\n```python\nvalue = 42\n```\nLet me know.";
        let result = extract(input);
        assert_eq!(result.text, "value = 42");
    }
}
