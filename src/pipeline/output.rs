//! Artifact assembly and writing.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// Splice generated CSS into the template at the configured marker.
///
/// No-op when the marker is absent, matching the template untouched.
#[must_use]
pub fn splice(template: &str, marker: &str, css: &str) -> String {
    if !template.contains(marker) {
        tracing::debug!("Style marker not found in template, artifact keeps template as-is");
        return template.to_string();
    }
    template.replacen(marker, &format!("<style>{css}</style>"), 1)
}

fn inter_tag_whitespace() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r">\s+<").expect("valid whitespace pattern"))
}

/// Collapse whitespace between tags.
///
/// Small stand-in for a full markup minifier, which is out of scope.
#[must_use]
pub fn collapse_whitespace(markup: &str) -> String {
    inter_tag_whitespace()
        .replace_all(markup.trim(), "><")
        .into_owned()
}

/// Write the finished artifact, creating the output directory if needed.
///
/// # Errors
///
/// Returns an error when the directory cannot be created or the file
/// cannot be written.
pub async fn write_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, content).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "<style id=\"__classweave\"></style>";

    #[test]
    fn test_splice_replaces_marker_with_style_tag() {
        let template = format!("<head>{MARKER}</head>");
        let result = splice(&template, MARKER, ".a{color:red}");
        assert_eq!(result, "<head><style>.a{color:red}</style></head>");
    }

    #[test]
    fn test_splice_without_marker_keeps_template() {
        let result = splice("<head></head>", MARKER, ".a{}");
        assert_eq!(result, "<head></head>");
    }

    #[test]
    fn test_collapse_whitespace_between_tags() {
        let collapsed = collapse_whitespace("<div>\n  <p>keep  inner</p>\n</div>\n");
        assert_eq!(collapsed, "<div><p>keep  inner</p></div>");
    }

    #[tokio::test]
    async fn test_write_artifact_creates_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("dist").join("nested").join("out.html");

        write_artifact(&out, "<html></html>").await.unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "<html></html>");
    }
}
