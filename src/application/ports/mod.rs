pub mod data_source;
pub mod sheet_store;

pub use data_source::{
    is_workflow_file, RepoHandle, RepoId, RepositoryDataSource, SourceError, WorkflowFile,
    WORKFLOW_DIR,
};
pub use sheet_store::SheetStore;
