//! Git object and reference identifiers.

use std::fmt;

use crate::error::{Error, Result};

/// What an [`Id`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    /// A local branch (`refs/heads/...`).
    Branch,
    /// A tag (`refs/tags/...`).
    Tag,
    /// A remote-tracking branch (`refs/remotes/<remote>/...`).
    RemoteBranch,
    /// Any other symbolic reference (`refs/stash`, `ref: refs/...`).
    Symbolic,
    /// A bare commit hash.
    Hash,
}

/// A git reference or a bare hash.
///
/// Two ids are equal when they name the same thing: same name, same kind and
/// same remote. The hash a reference happened to point at when it was read
/// does not take part in the comparison.
#[derive(Debug, Clone)]
pub struct Id {
    name: String,
    kind: IdKind,
    remote: Option<String>,
    hash: Option<String>,
}

impl PartialEq for Id {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind && self.remote == other.remote
    }
}

impl Eq for Id {}

impl Id {
    /// A bare commit hash.
    pub fn from_hash(hash: impl Into<String>) -> Self {
        let hash = hash.into();
        Self {
            name: hash.clone(),
            kind: IdKind::Hash,
            remote: None,
            hash: Some(hash),
        }
    }

    /// A local branch by short name.
    pub fn branch(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: IdKind::Branch,
            remote: None,
            hash: None,
        }
    }

    /// Classify a full reference name, optionally with the hash it points at.
    pub fn from_refname(refname: &str, hash: Option<String>) -> Self {
        let refname = refname.strip_suffix("^{}").unwrap_or(refname);
        let (name, kind, remote) = if let Some(branch) = refname.strip_prefix("refs/heads/") {
            (branch.to_string(), IdKind::Branch, None)
        } else if let Some(tag) = refname.strip_prefix("refs/tags/") {
            (tag.to_string(), IdKind::Tag, None)
        } else if let Some(rest) = refname.strip_prefix("refs/remotes/") {
            match rest.split_once('/') {
                Some((remote, branch)) => (
                    branch.to_string(),
                    IdKind::RemoteBranch,
                    Some(remote.to_string()),
                ),
                None => (refname.to_string(), IdKind::Symbolic, None),
            }
        } else {
            (refname.to_string(), IdKind::Symbolic, None)
        };
        Self {
            name,
            kind,
            remote,
            hash,
        }
    }

    /// Parse the contents of a `HEAD`-style file.
    ///
    /// `ref: refs/heads/dev` is a branch, anything else is taken as a hash.
    pub fn parse_head(contents: &str) -> Result<Self> {
        let contents = contents.trim();
        if let Some(target) = contents.strip_prefix("ref:") {
            return Ok(Self::from_refname(target.trim(), None));
        }
        if is_hash(contents) {
            return Ok(Self::from_hash(contents));
        }
        Err(Error::GitOutput {
            command: "HEAD".to_string(),
            output: contents.to_string(),
        })
    }

    /// Parse one `<hash> <refname>` line as printed by `git show-ref`.
    pub fn parse_ref_line(line: &str) -> Result<Self> {
        let malformed = || Error::GitOutput {
            command: "show-ref".to_string(),
            output: line.to_string(),
        };
        let (hash, refname) = line.trim().split_once(' ').ok_or_else(malformed)?;
        if !is_hash(hash) || refname.is_empty() {
            return Err(malformed());
        }
        Ok(Self::from_refname(refname.trim(), Some(hash.to_string())))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> IdKind {
        self.kind
    }

    pub fn remote(&self) -> Option<&str> {
        self.remote.as_deref()
    }

    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    pub fn is_ref(&self) -> bool {
        self.kind != IdKind::Hash
    }

    pub fn is_branch(&self) -> bool {
        self.kind == IdKind::Branch
    }

    /// The full reference name, or the hash for bare hashes.
    pub fn full_name(&self) -> String {
        match self.kind {
            IdKind::Branch => format!("refs/heads/{}", self.name),
            IdKind::Tag => format!("refs/tags/{}", self.name),
            IdKind::RemoteBranch => format!(
                "refs/remotes/{}/{}",
                self.remote.as_deref().unwrap_or_default(),
                self.name
            ),
            IdKind::Symbolic | IdKind::Hash => self.name.clone(),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.remote) {
            (IdKind::RemoteBranch, Some(remote)) => write!(f, "{}/{}", remote, self.name),
            _ => write!(f, "{}", self.name),
        }
    }
}

/// Whether `s` looks like a full SHA-1 or SHA-256 object name.
pub fn is_hash(s: &str) -> bool {
    (s.len() == 40 || s.len() == 64) && s.bytes().all(|b| b.is_ascii_hexdigit())
}
