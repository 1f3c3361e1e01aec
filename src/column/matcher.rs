use regex::Regex;

use crate::error::{Result, TableError};

/// Compiled `like` / `ilike` pattern. `%` at either end is a wildcard.
///
/// Patterns without regex metacharacters become plain string tests; anything else is compiled
/// to an anchored regular expression.
#[derive(Debug)]
pub(crate) enum Matcher {
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    /// Plain test on the upper-cased input.
    CaseInsensitive(Box<Matcher>),
    Regex(Regex),
}

impl Matcher {
    pub fn new(pattern: &str, case_sensitive: bool) -> Result<Self> {
        let fuzzy_start = pattern.starts_with('%');
        let fuzzy_end = pattern.ends_with('%');
        let core = trim_percent(pattern, fuzzy_start, fuzzy_end);

        if regex::escape(pattern) != pattern {
            let mut expr = String::with_capacity(core.len() + 6);
            if !case_sensitive {
                expr.push_str("(?i)");
            }
            if !fuzzy_start {
                expr.push('^');
            }
            expr.push_str(core);
            if !fuzzy_end {
                expr.push('$');
            }
            let regex = Regex::new(&expr).map_err(|e| TableError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(Self::Regex(regex));
        }

        let needle = if case_sensitive {
            core.to_string()
        } else {
            core.to_uppercase()
        };
        let plain = match (fuzzy_start, fuzzy_end) {
            (true, true) => Self::Contains(needle),
            (true, false) => Self::Suffix(needle),
            (false, true) => Self::Prefix(needle),
            (false, false) => Self::Exact(needle),
        };

        if case_sensitive {
            Ok(plain)
        } else {
            Ok(Self::CaseInsensitive(Box::new(plain)))
        }
    }

    pub fn matches(&self, s: &str) -> bool {
        match self {
            Self::Exact(m) => s == m,
            Self::Prefix(m) => s.starts_with(m.as_str()),
            Self::Suffix(m) => s.ends_with(m.as_str()),
            Self::Contains(m) => s.contains(m.as_str()),
            Self::CaseInsensitive(inner) => inner.matches(&s.to_uppercase()),
            Self::Regex(r) => r.is_match(s),
        }
    }
}

fn trim_percent(pattern: &str, start: bool, end: bool) -> &str {
    let mut s = pattern;
    if start {
        s = &s[1..];
    }
    if end && !s.is_empty() {
        s = &s[..s.len() - 1];
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_patterns() {
        assert!(Matcher::new("abc", true).unwrap().matches("abc"));
        assert!(!Matcher::new("abc", true).unwrap().matches("abcd"));
        assert!(Matcher::new("ab%", true).unwrap().matches("abcd"));
        assert!(Matcher::new("%cd", true).unwrap().matches("abcd"));
        assert!(Matcher::new("%bc%", true).unwrap().matches("abcd"));
        assert!(!Matcher::new("%bx%", true).unwrap().matches("abcd"));
    }

    #[test]
    fn test_case_insensitive() {
        let m = Matcher::new("%BC%", false).unwrap();
        assert!(m.matches("abcd"));
        assert!(!Matcher::new("%BC%", true).unwrap().matches("abcd"));
    }

    #[test]
    fn test_regex_pattern_is_anchored() {
        let m = Matcher::new("a.c", true).unwrap();
        assert!(m.matches("abc"));
        assert!(!m.matches("xabc"));

        let fuzzy = Matcher::new("%b.d", false).unwrap();
        assert!(fuzzy.matches("ABCD"));
    }

    #[test]
    fn test_percent_only_matches_everything() {
        let m = Matcher::new("%", true).unwrap();
        assert!(m.matches(""));
        assert!(m.matches("anything"));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(matches!(
            Matcher::new("a(b", true),
            Err(TableError::InvalidPattern { .. })
        ));
    }
}
