//! Ignore patterns: parsing of the external list form and entry matching.

use crate::spec::SpecEntry;

/// Pattern set used when the operator leaves the ignore list blank.
pub const L_IGNORE_DEFAULT: [&str; 1] = [".DS_Store"];

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone, PartialEq, Eq)]
enum TypeIgnoreRule {
    /// `*<suffix>`: base name ends with suffix.
    Suffix(String),
    /// `<name>`: base name or full path equals name, or path is under `name/`.
    Name { name: String, prefix_dir: String },
}

/// Compiled ignore pattern set.
///
/// An entry is ignored when any pattern matches; there are no negations and
/// no ordering between patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecIgnorePatterns {
    l_raw: Vec<String>,
    l_rules: Vec<TypeIgnoreRule>,
}

impl SpecIgnorePatterns {
    /// Compile raw pattern strings. Empty strings never match anything.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let l_raw: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let l_rules = l_raw
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| _compile(p))
            .collect();
        Self { l_raw, l_rules }
    }

    /// Patterns as given.
    pub fn as_raw(&self) -> &[String] {
        &self.l_raw
    }

    /// Whether no pattern is configured.
    pub fn is_empty(&self) -> bool {
        self.l_rules.is_empty()
    }

    /// Whether `entry` is excluded from sync.
    pub fn is_ignored(&self, entry: &SpecEntry) -> bool {
        self.is_path_ignored(&entry.path)
    }

    /// Whether a root-relative `/`-separated path is excluded from sync.
    pub fn is_path_ignored(&self, path_rel: &str) -> bool {
        let name_base = path_rel.rsplit('/').next().unwrap_or(path_rel);
        self.l_rules
            .iter()
            .any(|rule| _is_rule_matching(rule, path_rel, name_base))
    }
}

fn _compile(pattern: &str) -> TypeIgnoreRule {
    let pattern = pattern.replace('\\', "/");
    match pattern.strip_prefix('*') {
        Some(suffix) => TypeIgnoreRule::Suffix(suffix.to_string()),
        None => TypeIgnoreRule::Name {
            prefix_dir: format!("{pattern}/"),
            name: pattern,
        },
    }
}

fn _is_rule_matching(rule: &TypeIgnoreRule, path_rel: &str, name_base: &str) -> bool {
    match rule {
        TypeIgnoreRule::Suffix(suffix) => name_base.ends_with(suffix.as_str()),
        TypeIgnoreRule::Name { name, prefix_dir } => {
            name_base == name || path_rel == name || path_rel.starts_with(prefix_dir.as_str())
        }
    }
}

/// Free-function form of [`SpecIgnorePatterns::is_ignored`].
pub fn is_ignored(entry: &SpecEntry, patterns: &SpecIgnorePatterns) -> bool {
    patterns.is_ignored(entry)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ListFormat

/// Parse the external list form (`"a, *.log, build"`, optionally wrapped in
/// `[` `]`) into pattern strings.
///
/// Tokens are split on `,` and trimmed; empty tokens are dropped. A blank list
/// yields [`L_IGNORE_DEFAULT`].
pub fn parse_ignore_list(raw: &str) -> Vec<String> {
    let mut c_body = raw.trim();
    if let Some(inner) = c_body.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        c_body = inner;
    }

    let l_patterns: Vec<String> = c_body
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect();

    if l_patterns.is_empty() {
        return L_IGNORE_DEFAULT.iter().map(|v| v.to_string()).collect();
    }
    l_patterns
}

/// Inverse of [`parse_ignore_list`] for storage: `", "`-joined, no brackets.
pub fn format_ignore_list(patterns: &[String]) -> String {
    patterns.join(", ")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
