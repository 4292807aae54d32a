//! Routing of user-supplied paths to the repository that owns them.
//!
//! A path belongs to the submodule whose relative path is the longest
//! component-wise prefix of it; `lib2/x` never belongs to submodule `lib`.
//! The part after the submodule prefix becomes a path local to that
//! submodule. Paths that belong to no submodule stay with the root, which is
//! keyed by the empty string in a [`RoutingMap`].

use std::collections::BTreeMap;
use std::path::Path;

use crate::submodule::{normalize_rel_path, Submodule};

/// Key of the root scope in a [`RoutingMap`].
pub const ROOT_KEY: &str = "";

/// Options for [`route`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// When nothing was routed, produce a single root entry with no paths.
    pub default_root: bool,
    /// A path naming a submodule directory itself is handed to the root as
    /// the submodule's own root-relative path, instead of giving the
    /// submodule an entry with no local paths.
    pub submodule_dir_as_root_path: bool,
}

/// Paths routed to one repository.
#[derive(Debug, Clone, Default)]
pub struct Route<'a> {
    /// `None` for the root scope.
    pub submodule: Option<&'a Submodule>,
    /// Paths local to that repository.
    pub paths: Vec<String>,
}

/// Routing entries keyed by submodule relative path, root under [`ROOT_KEY`].
///
/// Iteration order is lexicographic, so the root comes first.
pub type RoutingMap<'a> = BTreeMap<String, Route<'a>>;

/// The part of `path` below `rel`, or `None` if `path` is not inside `rel`.
///
/// Matching is by whole path components. An empty string means `path` is
/// `rel` itself.
pub fn local_part(rel: &str, path: &str) -> Option<String> {
    let rest = Path::new(path).strip_prefix(Path::new(rel)).ok()?;
    Some(
        rest.components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
    )
}

/// Find the submodule owning `path`: longest matching relative path wins.
pub fn owner<'r, I>(rel_paths: I, path: &str) -> Option<(&'r str, String)>
where
    I: IntoIterator<Item = &'r str>,
{
    rel_paths
        .into_iter()
        .filter_map(|rel| local_part(rel, path).map(|local| (rel, local)))
        .max_by_key(|(rel, _)| Path::new(rel).components().count())
}

/// Route raw paths over a set of submodule relative paths.
///
/// This is the string-level core of [`route`]; keys are relative paths and
/// values are the local paths routed there.
pub fn route_paths(
    rel_paths: &[&str],
    raw_paths: &[String],
    options: RouteOptions,
) -> BTreeMap<String, Vec<String>> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for raw in raw_paths {
        let path = normalize_rel_path(raw);
        match owner(rel_paths.iter().copied(), &path) {
            Some((rel, local)) if local.is_empty() && options.submodule_dir_as_root_path => {
                map.entry(ROOT_KEY.to_string()).or_default().push(rel.to_string());
            }
            Some((rel, local)) => {
                let entry = map.entry(rel.to_string()).or_default();
                if !local.is_empty() {
                    entry.push(local);
                }
            }
            None => map.entry(ROOT_KEY.to_string()).or_default().push(path),
        }
    }
    if map.is_empty() && options.default_root {
        map.insert(ROOT_KEY.to_string(), Vec::new());
    }
    map
}

/// Route raw paths to the root and the submodules that own them.
pub fn route<'a>(
    submodules: &'a [Submodule],
    raw_paths: &[String],
    options: RouteOptions,
) -> RoutingMap<'a> {
    let rel_paths: Vec<&str> = submodules.iter().map(Submodule::rel_path).collect();
    route_paths(&rel_paths, raw_paths, options)
        .into_iter()
        .map(|(key, paths)| {
            let submodule = submodules.iter().find(|sub| sub.rel_path() == key);
            (key, Route { submodule, paths })
        })
        .collect()
}

/// Every submodule plus the root, each with no paths.
pub fn route_all(submodules: &[Submodule]) -> RoutingMap<'_> {
    let mut map = RoutingMap::new();
    map.insert(ROOT_KEY.to_string(), Route::default());
    for sub in submodules {
        map.insert(
            sub.rel_path().to_string(),
            Route {
                submodule: Some(sub),
                paths: Vec::new(),
            },
        );
    }
    map
}
