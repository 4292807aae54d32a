//! Parser for git's section/key=value configuration format.
//!
//! Used for both a repository's own `config` file and the `.gitmodules`
//! declaration file. The result is a nested mapping: `[core]` becomes the
//! path `["core"]`, `[submodule "lib/foo"]` becomes `["submodule", "lib/foo"]`.
//!
//! Supported syntax:
//! - Section headers `[name]` and `[name "subname"]`. Spaces become
//!   underscores in both the bare name and the quoted subname.
//! - `key = value` lines; a bare `key` means `true`.
//! - Comments from an unquoted, unescaped `#` or `;` to end of line.
//! - Double-quoted values with `\"`, `\\`, `\n` and `\t` escapes.
//! - Entries before the first header land in the top-level section.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// One level of the nested mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSection {
    values: BTreeMap<String, String>,
    children: BTreeMap<String, ConfigSection>,
}

impl ConfigSection {
    /// Value of `key` in this section.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Nested section by name.
    pub fn child(&self, name: &str) -> Option<&ConfigSection> {
        self.children.get(name)
    }

    /// Nested sections in name order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &ConfigSection)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Key/value pairs in key order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn child_mut(&mut self, path: &[String]) -> &mut ConfigSection {
        path.iter().fold(self, |section, name| {
            section.children.entry(name.clone()).or_default()
        })
    }
}

/// A parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitConfig {
    root: ConfigSection,
}

impl GitConfig {
    pub fn parse(contents: &str) -> Self {
        let mut root = ConfigSection::default();
        let mut current: Vec<String> = Vec::new();

        for raw in contents.lines() {
            let line = strip_comment(raw);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current = parse_header(&line[1..line.len() - 1]);
                // Register the section even if it ends up empty.
                root.child_mut(&current);
                continue;
            }

            let (key, value) = match line.split_once('=') {
                Some((key, value)) => (key.trim(), unquote(value.trim())),
                None => (line, "true".to_string()),
            };
            if key.is_empty() {
                continue;
            }
            root.child_mut(&current)
                .values
                .insert(key.to_string(), value);
        }

        Self { root }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    /// The top-level section.
    pub fn root(&self) -> &ConfigSection {
        &self.root
    }

    /// Section at `path`, e.g. `["submodule", "lib/foo"]`.
    pub fn section(&self, path: &[&str]) -> Option<&ConfigSection> {
        path.iter()
            .try_fold(&self.root, |section, name| section.child(name))
    }

    /// Value of `key` inside the section at `path`.
    pub fn get(&self, path: &[&str], key: &str) -> Option<&str> {
        self.section(path).and_then(|section| section.get(key))
    }
}

/// Cut the line at the first comment character outside quotes.
fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            '#' | ';' if !in_quotes => return &line[..i],
            _ => {}
        }
    }
    line
}

fn parse_header(inner: &str) -> Vec<String> {
    let inner = inner.trim();
    if let Some((name, rest)) = inner.split_once(char::is_whitespace) {
        let rest = rest.trim();
        if rest.len() >= 2 && rest.starts_with('"') && rest.ends_with('"') {
            return vec![name.to_string(), unquote(rest).replace(' ', "_")];
        }
    }
    vec![inner.replace(' ', "_")]
}

/// Remove double quotes and resolve backslash escapes.
fn unquote(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {}
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            },
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submodule_declaration() {
        let config = GitConfig::parse(
            "[submodule \"lib/foo\"]\n\tpath = lib/foo\n\turl = http://x/y.git\n\tbranch = dev\n",
        );
        let section = config.section(&["submodule", "lib/foo"]).unwrap();
        assert_eq!(section.get("path"), Some("lib/foo"));
        assert_eq!(section.get("url"), Some("http://x/y.git"));
        assert_eq!(section.get("branch"), Some("dev"));
    }

    #[test]
    fn test_quoted_subname_spaces_become_underscores() {
        let config = GitConfig::parse("[submodule \"my lib\"]\npath = my lib\n");
        assert_eq!(config.get(&["submodule", "my_lib"], "path"), Some("my lib"));
        assert!(config.section(&["submodule", "my lib"]).is_none());
    }

    #[test]
    fn test_bare_section_name_spaces_become_underscores() {
        let config = GitConfig::parse("[odd name]\nkey = v\n");
        assert_eq!(config.get(&["odd_name"], "key"), Some("v"));
    }

    #[test]
    fn test_comments_are_stripped() {
        let config = GitConfig::parse(
            "# leading comment\n[core]\n\tbare = false # trailing\n; another\n\tname = \"a # b\"\n\tx = 1 \\# 2\n",
        );
        assert_eq!(config.get(&["core"], "bare"), Some("false"));
        assert_eq!(config.get(&["core"], "name"), Some("a # b"));
        assert_eq!(config.get(&["core"], "x"), Some("1 # 2"));
    }

    #[test]
    fn test_bare_key_is_true() {
        let config = GitConfig::parse("[core]\n\tfilemode\n");
        assert_eq!(config.get(&["core"], "filemode"), Some("true"));
    }

    #[test]
    fn test_repository_config_branch_tracking() {
        let config = GitConfig::parse(
            "[remote \"origin\"]\n\turl = git@host:r.git\n\tfetch = +refs/heads/*:refs/remotes/origin/*\n[branch \"master\"]\n\tremote = origin\n\tmerge = refs/heads/master\n",
        );
        assert_eq!(config.get(&["branch", "master"], "remote"), Some("origin"));
        assert_eq!(
            config.get(&["branch", "master"], "merge"),
            Some("refs/heads/master")
        );
        assert_eq!(
            config.get(&["remote", "origin"], "url"),
            Some("git@host:r.git")
        );
    }

    #[test]
    fn test_entries_before_first_header() {
        let config = GitConfig::parse("top = 1\n[s]\nk = 2\n");
        assert_eq!(config.root().get("top"), Some("1"));
        assert_eq!(config.get(&["s"], "k"), Some("2"));
    }

    #[test]
    fn test_sections_are_enumerable_in_order() {
        let config = GitConfig::parse(
            "[submodule \"b\"]\npath = b\n[submodule \"a\"]\npath = a\n[submodule \"empty\"]\n",
        );
        let names: Vec<&str> = config
            .section(&["submodule"])
            .unwrap()
            .children()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["a", "b", "empty"]);
    }

    #[test]
    fn test_missing_lookups() {
        let config = GitConfig::parse("[core]\n");
        assert!(config.section(&["core"]).is_some());
        assert_eq!(config.get(&["core"], "nothing"), None);
        assert!(config.section(&["submodule", "x"]).is_none());
    }
}
