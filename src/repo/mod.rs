//! Resolving a repository reference to a local working copy

/// Reference parsing: URL, `:org/repo` shorthand, or local path
pub mod reference;
/// Clone-or-pull with bounded retry
pub mod sync;

pub use reference::RepositoryProperties;
pub use sync::Synchronizer;
