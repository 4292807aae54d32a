//! Property-based tests for path routing.
//!
//! These tests use proptest to generate random submodule layouts and paths
//! and verify that routing invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{local_part, owner, route_paths, RouteOptions, ROOT_KEY};
    use proptest::prelude::*;

    fn component() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,5}"
    }

    fn rel_path() -> impl Strategy<Value = String> {
        prop::collection::vec(component(), 1..4).prop_map(|parts| parts.join("/"))
    }

    // ============================================================================
    // Component-wise matching
    // ============================================================================

    proptest! {
        /// Property: a path routes to a submodule iff it starts with all of
        /// the submodule's components
        #[test]
        fn local_part_matches_component_prefix(rel in rel_path(), path in rel_path()) {
            let rel_parts: Vec<&str> = rel.split('/').collect();
            let path_parts: Vec<&str> = path.split('/').collect();
            let is_prefix = path_parts.len() >= rel_parts.len()
                && path_parts[..rel_parts.len()] == rel_parts[..];

            prop_assert_eq!(local_part(&rel, &path).is_some(), is_prefix);
        }

        /// Property: extending the last component of a submodule path never
        /// routes into that submodule (`lib2/x` is not inside `lib`)
        #[test]
        fn sibling_with_shared_prefix_never_matches(
            rel in rel_path(),
            suffix in "[a-z0-9]{1,3}",
            tail in component(),
        ) {
            let sibling = format!("{}{}/{}", rel, suffix, tail);
            prop_assert_eq!(local_part(&rel, &sibling), None);
        }

        /// Property: joining a submodule path with a local path and routing it
        /// again gives back the local path
        #[test]
        fn local_part_recovers_joined_path(rel in rel_path(), local in rel_path()) {
            let joined = format!("{}/{}", rel, local);
            prop_assert_eq!(local_part(&rel, &joined), Some(local));
        }
    }

    // ============================================================================
    // Routing maps
    // ============================================================================

    proptest! {
        /// Property: the owner chosen is the deepest matching submodule
        #[test]
        fn owner_is_longest_match(outer in rel_path(), inner in component(), file in component()) {
            let nested = format!("{}/{}", outer, inner);
            let path = format!("{}/{}", nested, file);
            let rels = [outer.as_str(), nested.as_str()];

            let found = owner(rels, &path);
            prop_assert_eq!(found, Some((nested.as_str(), file)));
        }

        /// Property: every input path lands in exactly one entry, and no
        /// local path is empty
        #[test]
        fn routing_preserves_every_path(
            rels in prop::collection::btree_set(rel_path(), 0..4),
            paths in prop::collection::vec(rel_path(), 0..8),
        ) {
            let rels: Vec<&str> = rels.iter().map(String::as_str).collect();
            let map = route_paths(&rels, &paths, RouteOptions::default());

            let routed: usize = map.values().map(Vec::len).sum();
            let dirs_themselves = paths
                .iter()
                .filter(|p| owner(rels.iter().copied(), p).is_some_and(|(_, local)| local.is_empty()))
                .count();
            prop_assert_eq!(routed + dirs_themselves, paths.len());
            prop_assert!(map.values().flatten().all(|p| !p.is_empty()));
            for key in map.keys() {
                prop_assert!(key == ROOT_KEY || rels.contains(&key.as_str()));
            }
        }
    }
}
