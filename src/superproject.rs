//! # Superproject
//!
//! The root repository together with the submodules declared in its
//! `.gitmodules`. Declarations are parsed on first use and kept sorted by
//! relative path, which is the order every protocol visits them in.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::context::Context;
use crate::defaults;
use crate::error::{Error, Result};
use crate::git::GitConfig;
use crate::repository::Repository;
use crate::submodule::{normalize_rel_path, Submodule};

/// Whether `dir` looks like the root of a superproject.
pub fn is_superproject(dir: &Path) -> bool {
    dir.join(defaults::GIT_DIR_NAME).exists() && dir.join(defaults::GITMODULES_FILENAME).is_file()
}

/// Walk up from `start` to the first superproject root.
pub fn find_root(start: &Path) -> Option<PathBuf> {
    start.ancestors().find(|dir| is_superproject(dir)).map(Path::to_path_buf)
}

/// Resolve the root to operate on: the explicit one if given, otherwise the
/// first superproject above the current directory.
pub fn locate_root(explicit: Option<&Path>) -> Result<PathBuf> {
    let cwd = env::current_dir()?;
    let found = match explicit {
        Some(path) => {
            let path = cwd.join(path);
            is_superproject(&path).then_some(path)
        }
        None => find_root(&cwd),
    };
    let root = found.ok_or_else(|| Error::RepoNotFound {
        start: explicit.map(Path::to_path_buf).unwrap_or(cwd),
    })?;
    Ok(root.canonicalize()?)
}

/// The root repository and its declared submodules.
pub struct Superproject {
    ctx: Rc<Context>,
    root: Repository,
    submodules: OnceCell<Vec<Submodule>>,
}

impl Superproject {
    /// Open the superproject rooted at `root`.
    pub fn open(ctx: Rc<Context>, root: impl Into<PathBuf>) -> Self {
        let root = Repository::new(ctx.clone(), root);
        Self {
            ctx,
            root,
            submodules: OnceCell::new(),
        }
    }

    /// Find and open the superproject for this run.
    pub fn discover(ctx: Rc<Context>, explicit: Option<&Path>) -> Result<Self> {
        let root = locate_root(explicit)?;
        log::debug!("# Superproject root: {}", root.display());
        Ok(Self::open(ctx, root))
    }

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    pub fn root(&self) -> &Repository {
        &self.root
    }

    pub fn root_path(&self) -> &Path {
        self.root.work_tree()
    }

    /// Declared submodules, sorted by relative path.
    pub fn submodules(&self) -> Result<&[Submodule]> {
        if let Some(subs) = self.submodules.get() {
            return Ok(subs);
        }
        let subs = self.load_submodules()?;
        Ok(self.submodules.get_or_init(|| subs))
    }

    /// Look a submodule up by relative path (a trailing `/` is ignored).
    pub fn submodule(&self, rel_path: &str) -> Result<Option<&Submodule>> {
        let wanted = normalize_rel_path(rel_path);
        Ok(self
            .submodules()?
            .iter()
            .find(|sub| sub.rel_path() == wanted))
    }

    /// Look up each named submodule, warning about unknown names.
    pub fn select(&self, names: &[String]) -> Result<Vec<&Submodule>> {
        let mut selected = Vec::new();
        for name in names {
            match self.submodule(name)? {
                Some(sub) => selected.push(sub),
                None => self.ctx.warning(format!("No such submodule: {}", name)),
            }
        }
        Ok(selected)
    }

    fn load_submodules(&self) -> Result<Vec<Submodule>> {
        let path = self.root_path().join(defaults::GITMODULES_FILENAME);
        if !path.is_file() {
            self.ctx.log("# No submodules file");
            return Ok(Vec::new());
        }
        let config = GitConfig::from_file(&path)?;
        Ok(self.submodules_from_config(&config))
    }

    fn submodules_from_config(&self, config: &GitConfig) -> Vec<Submodule> {
        let Some(section) = config.section(&["submodule"]) else {
            return Vec::new();
        };

        let mut by_path = BTreeMap::new();
        for (name, decl) in section.children() {
            let Some(path) = decl.get("path") else {
                self.ctx
                    .warning(format!("Submodule '{}' declares no path, ignoring it", name));
                continue;
            };
            let mut sub = Submodule::new(self.ctx.clone(), self.root_path(), name, path);
            if let Some(url) = decl.get("url") {
                sub = sub.with_url(url);
            }
            if let Some(branch) = decl.get("branch") {
                sub = sub.with_branch(branch);
            }
            if let Some(remote) = decl.get("remote") {
                sub = sub.with_remote(remote);
            }
            if by_path.contains_key(sub.rel_path()) {
                log::warn!("duplicate declaration for submodule path {}", sub.rel_path());
            }
            by_path.insert(sub.rel_path().to_string(), sub);
        }
        by_path.into_values().collect()
    }
}
