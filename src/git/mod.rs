//! Repository discovery
//!
//! Locating the enclosing repository uses libgit2 directly; everything that
//! changes the repository goes through the `git` CLI facade in
//! [`crate::external::git`].

pub mod discovery;

pub use discovery::{discover_repository, RepositoryLocation};
