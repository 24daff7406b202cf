use anyhow::{Context, Result, bail};
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

/// The two ways a file or directory name can be compared against a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Case-insensitive equality between the name and the expression.
    Exact,
    /// The expression is a regular expression that must match the whole name.
    Regex,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Exact => write!(f, "exact"),
            MatchMode::Regex => write!(f, "regex"),
        }
    }
}

/// The `NameMatcher` trait is the predicate the tree walker applies to each
/// entry name it visits.
pub trait NameMatcher {
    /// Returns `true` when `name` (a final path segment) satisfies the pattern.
    fn matches(&self, name: &str) -> bool;
}

/// A name pattern scoped to a single traversal.
///
/// Both modes compile to one regex, anchored at both ends, when the pattern is
/// built. An exact name becomes an escaped literal under `(?i)`, so it folds
/// case one character at a time, the same way a `(?i)` regex does, and an
/// invalid expression is reported before any directory is read.
#[derive(Debug, Clone)]
pub struct NamePattern {
    mode: MatchMode,
    expression: String,
    compiled: Regex,
}

impl NamePattern {
    /// Builds an exact, case-insensitive pattern.
    pub fn exact(name: impl Into<String>) -> Result<Self> {
        let expression = name.into();
        let compiled = full_match_regex(&format!("(?i){}", regex::escape(&expression)))?;
        Ok(Self {
            mode: MatchMode::Exact,
            expression,
            compiled,
        })
    }

    /// Builds a full-match regular-expression pattern.
    pub fn regex(expression: impl Into<String>) -> Result<Self> {
        let expression = expression.into();
        let compiled = full_match_regex(&expression)?;
        Ok(Self {
            mode: MatchMode::Regex,
            expression,
            compiled,
        })
    }

    /// Builds a pattern in whichever mode `is_regular` selects.
    pub fn new(expression: impl Into<String>, is_regular: bool) -> Result<Self> {
        if is_regular {
            Self::regex(expression)
        } else {
            Self::exact(expression)
        }
    }
}

impl NameMatcher for NamePattern {
    fn matches(&self, name: &str) -> bool {
        self.compiled.is_match(name)
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.expression, self.mode)
    }
}

/// Compiles `expression` so that it only matches an entire input string.
pub fn full_match_regex(expression: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{expression})$"))
        .with_context(|| format!("Invalid regex pattern '{expression}'"))
}

/// A compiled line rewrite rule: which lines to touch, what to search for
/// inside them, and what to put in its place.
#[derive(Debug, Clone)]
pub struct LineRewrite {
    selector: Regex,
    replace_from: Regex,
    replacement: String,
}

impl LineRewrite {
    /// Compiles all three parts of a rewrite rule.
    ///
    /// # Arguments
    /// * `line_selector`: regex that must match a whole line for it to be rewritten.
    /// * `replace_from`: regex searched for (non-overlapping) inside a selected line.
    /// * `replace_to`: replacement text. `$n` and `${name}` refer to groups of
    ///   `replace_from`; a backslash makes the following character literal.
    ///
    /// # Returns
    /// An error if either regex is invalid or the replacement text is malformed.
    pub fn new(line_selector: &str, replace_from: &str, replace_to: &str) -> Result<Self> {
        let selector = full_match_regex(line_selector).context("Invalid line selector")?;
        let replace_from = Regex::new(replace_from)
            .with_context(|| format!("Invalid replace pattern '{replace_from}'"))?;
        let replacement = translate_replacement(replace_to, &replace_from)?;

        Ok(Self {
            selector,
            replace_from,
            replacement,
        })
    }

    /// Returns `true` when the whole line satisfies the selector.
    pub fn selects(&self, line: &str) -> bool {
        self.selector.is_match(line)
    }

    /// Applies the rule to one line. Unselected lines come back borrowed and untouched.
    pub fn apply<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if !self.selects(line) {
            return Cow::Borrowed(line);
        }
        self.replace_from.replace_all(line, self.replacement.as_str())
    }
}

/// Converts replacement text written with backslash escapes and `$n` group
/// references into the syntax the `regex` crate expands.
///
/// A numeric reference takes as many digits as still name an existing group,
/// so `$10` is group 10 only when the pattern has at least ten groups.
fn translate_replacement(replace_to: &str, pattern: &Regex) -> Result<String> {
    let group_count = pattern.captures_len().saturating_sub(1);
    let names: HashSet<&str> = pattern.capture_names().flatten().collect();
    let mut translated = String::with_capacity(replace_to.len());
    let mut chars = replace_to.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('$') => translated.push_str("$$"),
                Some(escaped) => translated.push(escaped),
                None => bail!("Replacement '{replace_to}' ends with a dangling backslash"),
            },
            '$' => match chars.peek().copied() {
                Some('{') => {
                    chars.next();
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => name.push(ch),
                            None => bail!("Unclosed group name in replacement '{replace_to}'"),
                        }
                    }
                    if !names.contains(name.as_str()) {
                        bail!("No group named '{name}' in replace pattern");
                    }
                    translated.push_str(&format!("${{{name}}}"));
                }
                Some(digit) if digit.is_ascii_digit() => {
                    chars.next();
                    let mut group = digit.to_digit(10).unwrap_or_default() as usize;
                    if group > group_count {
                        bail!("No group {group} in replace pattern");
                    }
                    while let Some(next) = chars.peek().and_then(|ch| ch.to_digit(10)) {
                        let candidate = group * 10 + next as usize;
                        if candidate > group_count {
                            break;
                        }
                        group = candidate;
                        chars.next();
                    }
                    translated.push_str(&format!("${{{group}}}"));
                }
                _ => bail!("Illegal group reference in replacement '{replace_to}'"),
            },
            other => translated.push(other),
        }
    }

    Ok(translated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_mode_ignores_case() {
        let pattern = NamePattern::exact("Target").unwrap();
        assert!(pattern.matches("target"));
        assert!(pattern.matches("TARGET"));
        assert!(!pattern.matches("targets"));
        assert!(!pattern.matches(" target"));
    }

    #[test]
    fn test_regex_mode_requires_full_match() {
        let pattern = NamePattern::regex(r".*\.xml").unwrap();
        assert!(pattern.matches("pom.xml"));
        assert!(!pattern.matches("pom.xml.bak"));

        let partial = NamePattern::regex("pom").unwrap();
        assert!(!partial.matches("pom.xml"));
    }

    #[test]
    fn test_regex_alternation_stays_anchored() {
        let pattern = NamePattern::regex("a|b").unwrap();
        assert!(pattern.matches("a"));
        assert!(!pattern.matches("ab"));
        assert!(!pattern.matches("xb"));
    }

    #[test]
    fn test_case_insensitive_regex_agrees_with_exact() {
        let exact = NamePattern::exact("Pom.XML").unwrap();
        let regex = NamePattern::regex("(?i)Pom.XML").unwrap();
        for name in ["pom.xml", "POM.xml", "pom.xmls", "build.gradle"] {
            assert_eq!(exact.matches(name), regex.matches(name), "{name}");
        }

        // Final sigma lowercases differently from a medial one.
        let exact = NamePattern::exact("ασ").unwrap();
        let regex = NamePattern::regex("(?i)ασ").unwrap();
        for name in ["ΑΣ", "ας", "ασ", "Ασ", "αβ"] {
            assert_eq!(exact.matches(name), regex.matches(name), "{name}");
        }
        assert!(exact.matches("ΑΣ"));
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        assert!(NamePattern::regex("(unclosed").is_err());
        assert!(NamePattern::new("(unclosed", false).is_ok());
        assert!(NamePattern::exact("a.b").unwrap().matches("A.B"));
        assert!(!NamePattern::exact("a.b").unwrap().matches("axb"));
    }

    #[test]
    fn test_version_placeholder_rewrite() {
        let rewrite = LineRewrite::new(
            r".*<version>(.*\$.*)</version>",
            r"\$\{.*\}",
            r"\$\{common.version\}",
        )
        .unwrap();
        assert_eq!(
            rewrite.apply("    <version>${foo}</version>"),
            "    <version>${common.version}</version>"
        );
        assert_eq!(
            rewrite.apply("    <version>1.0.0</version>"),
            "    <version>1.0.0</version>"
        );
    }

    #[test]
    fn test_unselected_line_is_borrowed() {
        let rewrite = LineRewrite::new("^keep.*", "a", "b").unwrap();
        assert!(matches!(rewrite.apply("skip a"), Cow::Borrowed("skip a")));
        assert_eq!(rewrite.apply("keep a a"), "keep b b");
    }

    #[test]
    fn test_group_references_in_replacement() {
        let rewrite = LineRewrite::new(".*", r"(\w+)=(\w+)", "$2=$1").unwrap();
        assert_eq!(rewrite.apply("key=value"), "value=key");

        let named = LineRewrite::new(".*", r"(?P<word>\w+)!", "${word}?").unwrap();
        assert_eq!(named.apply("hi! there!"), "hi? there?");
    }

    #[test]
    fn test_group_number_stops_at_last_group() {
        let rewrite = LineRewrite::new(".*", "(x)", "$10").unwrap();
        assert_eq!(rewrite.apply("x"), "x0");
    }

    #[test]
    fn test_malformed_replacement_is_rejected() {
        assert!(LineRewrite::new(".*", "a", "trailing\\").is_err());
        assert!(LineRewrite::new(".*", "a", "$").is_err());
        assert!(LineRewrite::new(".*", "a", "$1").is_err());
        assert!(LineRewrite::new(".*", "(?P<x>a)", "${y}").is_err());
        assert!(LineRewrite::new("(", "a", "b").is_err());
    }
}
