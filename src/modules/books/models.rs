use serde::{Deserialize, Serialize};

/// Domain model for the Books module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Owner of the book, when the use-case exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
}

/// Query-string filter for listing books.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BooksFilter {
    /// Title substring
    pub title: Option<String>,
    /// Page size
    pub limit: Option<u32>,
    /// 1-based page number
    pub page: Option<u32>,
}

/// Request model for creating a new book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooksReqCreate {
    /// Blank titles are the use-case's call, not the decoder's.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    /// Set from the caller's identity, never from the body.
    #[serde(skip_deserializing)]
    pub user_id: u64,
}

/// Request model for updating a book. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BooksReqUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDeleted {
    pub id: String,
}
