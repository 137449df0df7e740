//! Code snippets.

use crate::line::LineRange;
use serde::{Deserialize, Serialize};

fn default_line_start() -> u32 {
    1
}

fn default_lang() -> String {
    "raw".to_string()
}

/// A piece of source text and where it came from.
///
/// `content` may be edited in place; derived values such as `n_lines` are
/// computed on demand and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// Display name, usually the file name.
    pub name: String,

    /// Newline-delimited source text.
    pub content: String,

    /// Source line number of the first line of `content`.
    #[serde(default = "default_line_start")]
    pub line_start: u32,

    /// Language tag used for highlighting.
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Path of the file the snippet was taken from.
    #[serde(default)]
    pub path: String,

    /// URL pointing at the snippet's origin.
    #[serde(default)]
    pub url: String,
}

impl Snippet {
    /// Creates a raw snippet starting at line 1.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            line_start: default_line_start(),
            lang: default_lang(),
            path: String::new(),
            url: String::new(),
        }
    }

    pub fn with_line_start(mut self, line_start: u32) -> Self {
        self.line_start = line_start;
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Number of lines in `content`. An empty snippet still has one line.
    pub fn n_lines(&self) -> u32 {
        u32::try_from(self.content.matches('\n').count())
            .unwrap_or(u32::MAX)
            .saturating_add(1)
    }

    /// Absolute line numbers covered by this snippet.
    pub fn line_info(&self) -> LineRange {
        LineRange::new(
            self.line_start,
            Some(self.line_start.saturating_add(self.n_lines() - 1)),
        )
    }

    /// Returns line `n` of the content, counting from 1.
    pub fn line(&self, n: u32) -> Option<&str> {
        let idx = (n as usize).checked_sub(1)?;
        self.content.split('\n').nth(idx)
    }

    /// Returns the lines covered by a relative range.
    pub fn lines_in(&self, range: LineRange) -> Vec<&str> {
        self.content
            .split('\n')
            .enumerate()
            .filter(|(idx, _)| range.in_range(*idx as u32 + 1))
            .map(|(_, line)| line)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn foo() -> Snippet {
        Snippet::new("foo.py", "def foo():\n    print(\"foo\")")
            .with_lang("python")
            .with_line_start(5)
            .with_path("~/data/foo.py")
            .with_url("https://foo.bar/snippet/foo.py")
    }

    #[test]
    fn test_derived_line_info() {
        let snippet = foo();
        assert_eq!(snippet.n_lines(), 2);
        assert_eq!(snippet.line_info(), LineRange::new(5, Some(6)));
    }

    #[test]
    fn test_line_info_saturates_at_u32_max() {
        let snippet = Snippet::new("tail", "a\nb\nc").with_line_start(u32::MAX - 1);
        assert_eq!(snippet.line_info(), LineRange::new(u32::MAX - 1, Some(u32::MAX)));
    }

    #[test]
    fn test_empty_content_has_one_line() {
        let snippet = Snippet::new("empty", "");
        assert_eq!(snippet.n_lines(), 1);
        assert_eq!(snippet.line_info(), LineRange::new(1, Some(1)));
    }

    #[test]
    fn test_line_lookup() {
        let snippet = foo();
        assert_eq!(snippet.line(1), Some("def foo():"));
        assert_eq!(snippet.line(2), Some("    print(\"foo\")"));
        assert_eq!(snippet.line(0), None);
        assert_eq!(snippet.line(3), None);
        assert_eq!(snippet.lines_in(LineRange::single(2)).len(), 1);
    }

    #[test]
    fn test_to_dict() {
        let value = serde_json::to_value(foo()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "foo.py",
                "content": "def foo():\n    print(\"foo\")",
                "line_start": 5,
                "lang": "python",
                "path": "~/data/foo.py",
                "url": "https://foo.bar/snippet/foo.py",
            })
        );
    }

    #[test]
    fn test_from_dict_fills_defaults() {
        let snippet: Snippet =
            serde_json::from_value(json!({"name": "bar.py", "content": "pass"})).unwrap();
        assert_eq!(snippet.line_start, 1);
        assert_eq!(snippet.lang, "raw");
        assert!(snippet.path.is_empty());
        assert!(snippet.url.is_empty());
    }

    #[test]
    fn test_from_dict_requires_content() {
        let result: Result<Snippet, _> = serde_json::from_value(json!({"name": "bar.py"}));
        assert!(result.is_err());
    }
}
