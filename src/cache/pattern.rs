//! Glob-style key patterns used for bulk removal.

use regex::Regex;

use crate::cache::CacheError;

/// A glob pattern over cache keys.
///
/// `*` matches any run of characters (including none) and `?` matches exactly
/// one character. Every other character is literal.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    raw: String,
    regex: Regex,
}

impl KeyPattern {
    pub fn new(pattern: impl Into<String>) -> Result<Self, CacheError> {
        let raw = pattern.into();
        if raw.is_empty() {
            return Err(CacheError::Pattern {
                pattern: raw,
                message: "pattern must not be empty".to_string(),
            });
        }

        let mut source = String::from("(?s)^");
        let mut literal = String::new();
        for ch in raw.chars() {
            match ch {
                '*' | '?' => {
                    source.push_str(&regex::escape(&literal));
                    literal.clear();
                    source.push_str(if ch == '*' { ".*" } else { "." });
                }
                other => literal.push(other),
            }
        }
        source.push_str(&regex::escape(&literal));
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| CacheError::Pattern {
            pattern: raw.clone(),
            message: e.to_string(),
        })?;

        Ok(Self { raw, regex })
    }

    /// Pattern matching every key.
    pub fn all() -> Self {
        // "*" always compiles
        Self::new("*").unwrap_or_else(|_| unreachable!())
    }

    /// Pattern matching every key in `namespace`, i.e. `"{namespace}:*"`.
    pub fn namespace(namespace: &str) -> Result<Self, CacheError> {
        Self::new(format!("{namespace}:*"))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    pub fn matches_all(&self) -> bool {
        self.raw.chars().all(|c| c == '*')
    }

    /// The literal text before the first wildcard. Every matching key starts
    /// with it, so ordered indexes can range-scan from here.
    pub fn literal_prefix(&self) -> &str {
        let end = self.raw.find(['*', '?']).unwrap_or(self.raw.len());
        &self.raw[..end]
    }

    /// The pattern rewritten for redis `SCAN MATCH`, escaping the glob
    /// characters redis understands but this pattern treats literally.
    pub fn to_redis_glob(&self) -> String {
        let mut out = String::with_capacity(self.raw.len());
        for ch in self.raw.chars() {
            if matches!(ch, '[' | ']' | '\\' | '^') {
                out.push('\\');
            }
            out.push(ch);
        }
        out
    }
}

impl std::fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_wildcard() {
        let pattern = KeyPattern::new("ListPeopleQuery:*").unwrap();
        assert!(pattern.matches("ListPeopleQuery:"));
        assert!(pattern.matches("ListPeopleQuery:page=1"));
        assert!(!pattern.matches("ListPeopleQueryV2:"));
        assert!(!pattern.matches("GetPersonQuery:id=1"));
    }

    #[test]
    fn test_question_mark_matches_one_char() {
        let pattern = KeyPattern::new("k?").unwrap();
        assert!(pattern.matches("k1"));
        assert!(!pattern.matches("k"));
        assert!(!pattern.matches("k12"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let pattern = KeyPattern::new("a.b+(c)[d]:*").unwrap();
        assert!(pattern.matches("a.b+(c)[d]:x"));
        assert!(!pattern.matches("aXb+(c)[d]:x"));
    }

    #[test]
    fn test_all() {
        let pattern = KeyPattern::all();
        assert!(pattern.matches_all());
        assert!(pattern.matches(""));
        assert!(pattern.matches("anything:at|all\nreally"));
    }

    #[test]
    fn test_literal_prefix() {
        assert_eq!(KeyPattern::new("roles:*").unwrap().literal_prefix(), "roles:");
        assert_eq!(KeyPattern::new("*").unwrap().literal_prefix(), "");
        assert_eq!(KeyPattern::new("exact").unwrap().literal_prefix(), "exact");
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(matches!(
            KeyPattern::new(""),
            Err(CacheError::Pattern { .. })
        ));
    }

    #[test]
    fn test_redis_glob_escaping() {
        let pattern = KeyPattern::new("q:ids=[1,2]*").unwrap();
        assert_eq!(pattern.to_redis_glob(), "q:ids=\\[1,2\\]*");
    }
}
