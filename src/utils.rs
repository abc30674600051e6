//! Utility functions for common operations.

use crate::error::BackendError;

/// Shortens text for log lines, cutting on a character boundary.
///
/// Newlines are flattened to spaces and `...` is appended when the text
/// was cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    if flat.chars().count() > max_chars {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

/// Checks if an HTTP response is successful, and if not, returns a detailed error.
///
/// This helper extracts both the status code and response body for better error messages.
pub async fn check_response_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, BackendError> {
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(BackendError::ApiError(format!("HTTP {}: {}", status, text)));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_short_text_unchanged() {
        assert_eq!(snippet("Hello world", 20), "Hello world");
    }

    #[test]
    fn test_snippet_cuts_long_text() {
        assert_eq!(snippet("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_snippet_flattens_newlines() {
        assert_eq!(snippet("line one\nline two", 100), "line one line two");
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        assert_eq!(snippet("翻訳されたテキスト", 2), "翻訳...");
    }
}
