//! Read-only summary of a superproject, answered from disk.

use std::path::PathBuf;

use crate::error::Result;
use crate::git::{short_hash, IdKind};
use crate::repository::Repository;
use crate::superproject::Superproject;

/// Where a repository's `HEAD` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    Branch(String),
    /// Detached at this (abbreviated) commit.
    Detached(String),
    /// Not checked out.
    Missing,
}

impl std::fmt::Display for HeadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeadState::Branch(branch) => write!(f, "on {}", branch),
            HeadState::Detached(hash) => write!(f, "detached at {}", hash),
            HeadState::Missing => write!(f, "not initialized"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmoduleInfo {
    pub rel_path: String,
    pub url: Option<String>,
    pub preferred_branch: String,
    pub preferred_remote: String,
    pub head: HeadState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoReport {
    pub root: PathBuf,
    pub head: HeadState,
    pub submodules: Vec<SubmoduleInfo>,
}

pub fn info(sp: &Superproject) -> Result<InfoReport> {
    let submodules = sp
        .submodules()?
        .iter()
        .map(|sub| {
            Ok(SubmoduleInfo {
                rel_path: sub.rel_path().to_string(),
                url: sub.url().map(str::to_string),
                preferred_branch: sub.preferred_branch().to_string(),
                preferred_remote: sub.preferred_remote().to_string(),
                head: head_state(sub.repo())?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(InfoReport {
        root: sp.root_path().to_path_buf(),
        head: head_state(sp.root())?,
        submodules,
    })
}

fn head_state(repo: &Repository) -> Result<HeadState> {
    if !repo.has_git_dir() {
        return Ok(HeadState::Missing);
    }
    let head = repo.head()?;
    Ok(match head.kind() {
        IdKind::Branch => HeadState::Branch(head.name().to_string()),
        _ => HeadState::Detached(short_hash(head.hash().unwrap_or(head.name())).to_string()),
    })
}
