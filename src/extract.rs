//! Candidate token extraction from markup files.
//!
//! Each `class="…"` attribute value is one candidate token, kept in
//! first-occurrence order and de-duplicated per file.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// Result of extracting one source file.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// The full file content, used as the artifact template.
    pub content: String,
    /// Candidate tokens in first-occurrence order, de-duplicated.
    pub tokens: Vec<String>,
}

fn class_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"class="([^"]*)""#).expect("valid class pattern"))
}

/// Extract candidate tokens from a markup string.
#[must_use]
pub fn extract_tokens(content: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut tokens = Vec::new();
    for capture in class_pattern().captures_iter(content) {
        let token = &capture[1];
        if seen.insert(token.to_string()) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Read a file and extract its content and candidate tokens.
///
/// Read failures are recoverable-soft: a warning names the file and an
/// empty extraction is returned.
pub async fn extract_file(path: &Path) -> Extraction {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let tokens = extract_tokens(&content);
            Extraction { content, tokens }
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Failed to read source file");
            Extraction::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_each_attribute_value_as_one_token() {
        let tokens = extract_tokens(r#"<div class="a"><span class="b"></span></div>"#);
        assert_eq!(tokens, vec!["a", "b"]);
    }

    #[test]
    fn test_grouped_attribute_value_is_a_single_token() {
        let tokens = extract_tokens(r#"<div class="btn btn-primary"></div>"#);
        assert_eq!(tokens, vec!["btn btn-primary"]);
    }

    #[test]
    fn test_duplicates_collapse_keeping_first_occurrence_order() {
        let tokens = extract_tokens(r#"<i class="b"></i><i class="a"></i><i class="b"></i>"#);
        assert_eq!(tokens, vec!["b", "a"]);
    }

    #[test]
    fn test_empty_attribute_is_a_token() {
        let tokens = extract_tokens(r#"<div class=""></div>"#);
        assert_eq!(tokens, vec![""]);
    }

    #[test]
    fn test_no_classes_no_tokens() {
        assert!(extract_tokens("<html><body>plain</body></html>").is_empty());
    }

    #[tokio::test]
    async fn test_extract_file_reads_content_and_tokens() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("page.html");
        std::fs::write(&file, r#"<p class="a">hi</p>"#).unwrap();

        let extraction = extract_file(&file).await;
        assert_eq!(extraction.tokens, vec!["a"]);
        assert!(extraction.content.contains("hi"));
    }

    #[tokio::test]
    async fn test_extract_file_soft_fails_on_missing_file() {
        let extraction = extract_file(Path::new("/no/such/file.html")).await;
        assert!(extraction.content.is_empty());
        assert!(extraction.tokens.is_empty());
    }
}
