//! Readers for the git data groot consumes directly: identifiers parsed from
//! `HEAD`, ref files and `show-ref` listings, and the section/key=value
//! configuration format shared by `config` and `.gitmodules`.
//!
//! Everything else about a repository is learned by running git itself; see
//! [`crate::repository`].

pub mod config;
pub mod id;

pub use config::{ConfigSection, GitConfig};
pub use id::{is_hash, Id, IdKind};

/// Abbreviate a hash for messages.
pub fn short_hash(hash: &str) -> &str {
    match hash.char_indices().nth(7) {
        Some((i, _)) => &hash[..i],
        None => hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash() {
        assert_eq!(
            short_hash("0123456789abcdef0123456789abcdef01234567"),
            "0123456"
        );
        assert_eq!(short_hash("abc"), "abc");
    }
}
