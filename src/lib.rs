//! # groot
//!
//! This library drives git across a *superproject*: one root repository plus
//! the submodules declared in its `.gitmodules`. Commands that git only
//! applies to a single repository (checkout, commit, pull, push, stash,
//! status, add, diff, log) are turned into fixed sequences of git commands
//! over every repository of the tree. It is used by the `groot` command-line
//! tool, but every operation is available as a plain function.
//!
//! ## Quick Example
//!
//! ```
//! use groot::path::{route_paths, RouteOptions, ROOT_KEY};
//!
//! let submodules = ["lib", "lib/nested"];
//! let paths = vec!["lib/nested/a.txt".to_string(), "lib2/b.txt".to_string()];
//! let map = route_paths(&submodules, &paths, RouteOptions::default());
//!
//! assert_eq!(map["lib/nested"], vec!["a.txt"]);
//! assert_eq!(map[ROOT_KEY], vec!["lib2/b.txt"]);
//! ```
//!
//! ## Core Concepts
//!
//! - **Processes (`process`)**: runs git either over plain pipes or on a
//!   pseudo-terminal, so git keeps its colours while groot captures output.
//! - **Context (`context`)**: the per-run state shared by everything else:
//!   verbosity, output style, settings, the deferred log and the error count.
//! - **Repositories (`repository`, `git`)**: one handle per work tree,
//!   answering branch questions from the files under `.git` and running git
//!   for everything else.
//! - **Superproject (`superproject`, `submodule`)**: the root plus the
//!   declared submodules, in relative-path order.
//! - **Routing (`path`)**: which repository owns a user-supplied path.
//! - **Operations (`ops`)**: the cross-repository protocols.
//!
//! ## Consistency
//!
//! Nothing here is transactional. Preconditions are checked before anything
//! is touched; after that, a failure in one submodule is reported and the
//! remaining submodules are still visited.

pub mod context;
pub mod defaults;
pub mod error;
pub mod git;
pub mod ops;
pub mod output;
pub mod path;
pub mod process;
pub mod repository;
pub mod settings;
pub mod submodule;
pub mod superproject;

#[cfg(test)]
mod path_proptest;
