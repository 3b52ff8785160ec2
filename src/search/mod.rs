//! Title search for the note list.
//!
//! The list view accepts a free-form `search-area` string. An empty string
//! means "no filter"; anything else is a substring that must appear in the
//! note title. Whether the match ignores case is a store setting.

use serde::{Deserialize, Serialize};

/// Escape character used in generated `LIKE` patterns.
pub const LIKE_ESCAPE: char = '\\';

/// Search-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Match titles case-sensitively. When false, ASCII letters match
    /// regardless of case (SQLite `LIKE` semantics).
    pub case_sensitive: bool,
}

/// A parsed title filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleFilter {
    needle: Option<String>,
}

impl TitleFilter {
    /// No filtering at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build a filter from raw user input; empty input disables filtering.
    pub fn from_input(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if !s.is_empty() => Self {
                needle: Some(s.to_string()),
            },
            _ => Self::none(),
        }
    }

    /// The substring to look for, if any.
    pub fn needle(&self) -> Option<&str> {
        self.needle.as_deref()
    }

}

/// Wrap `needle` in `%...%`, escaping LIKE metacharacters so user input
/// is matched literally.
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_no_filter() {
        assert_eq!(TitleFilter::from_input(None), TitleFilter::none());
        assert_eq!(TitleFilter::from_input(Some("")).needle(), None);
        assert_eq!(TitleFilter::from_input(Some("milk")).needle(), Some("milk"));
    }

    #[test]
    fn test_whitespace_is_a_real_needle() {
        let filter = TitleFilter::from_input(Some(" "));
        assert_eq!(filter.needle(), Some(" "));
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("abc"), "%abc%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\dir"), "%c:\\\\dir%");
    }
}
