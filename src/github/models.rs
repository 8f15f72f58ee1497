use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: Owner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Team {
    pub id: u64,
    pub slug: String,
}

/// Entry of a directory listing from the contents API
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub item_type: String,
}

/// Single file from the contents API
#[derive(Debug, Clone, Deserialize)]
pub struct FileContent {
    pub path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

/// File body plus the `Last-Modified` response header
#[derive(Debug, Clone)]
pub struct FetchedFile {
    pub file: FileContent,
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchCount {
    pub total_count: u64,
}
