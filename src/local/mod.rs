pub mod clone_source;
pub mod cloner;
pub mod git;
pub mod scan;

pub use clone_source::{LocalCloneSource, DEFAULT_CLONE_BASE};
pub use cloner::{CloneStatus, TeamCloner};
pub use scan::LocalDirSource;
