pub mod api_source;
pub mod client;
pub mod models;
pub mod workflow_parser;

pub use api_source::{list_repositories, GitHubApiSource};
pub use client::{GitHubClient, GitHubError};
pub use workflow_parser::{WorkflowMetadata, WorkflowParser};
