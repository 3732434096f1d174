//! Document management tools.

use super::args::ToolArgs;
use super::{to_output, RequestConfig, ToolSpec, Toolset};
use crate::error::{DocmateError, Result};
use crate::store::{Document, DocumentPatch, DocumentStore, NewDocument, MAX_LIMIT};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// A validated document tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentToolCall {
    ListDocuments {
        limit: usize,
    },
    GetDocument {
        document_id: i64,
    },
    CreateDocument {
        title: String,
        content: Option<String>,
    },
    UpdateDocument {
        document_id: i64,
        title: Option<String>,
        content: Option<String>,
    },
    DeleteDocument {
        document_id: i64,
    },
    SearchDocuments {
        query: String,
        limit: usize,
    },
}

/// Parse a document tool call from the model's name and raw arguments.
pub fn parse_document_tool_call(name: &str, arguments: &str) -> Result<DocumentToolCall> {
    let args = ToolArgs::parse(arguments)?;

    match name {
        "list_documents" => Ok(DocumentToolCall::ListDocuments {
            limit: args.limit("limit", MAX_LIMIT),
        }),
        "get_document" => Ok(DocumentToolCall::GetDocument {
            document_id: args.required_i64("document_id")?,
        }),
        "create_document" => Ok(DocumentToolCall::CreateDocument {
            title: args.required_str("title")?.trim().to_string(),
            content: args.optional_str("content"),
        }),
        "update_document" => Ok(DocumentToolCall::UpdateDocument {
            document_id: args.required_i64("document_id")?,
            title: args.optional_str("title").map(|t| t.trim().to_string()),
            content: args.optional_str("content"),
        }),
        "delete_document" => Ok(DocumentToolCall::DeleteDocument {
            document_id: args.required_i64("document_id")?,
        }),
        "search_documents" => Ok(DocumentToolCall::SearchDocuments {
            query: args.required_str("query")?.trim().to_string(),
            limit: args.limit("limit", MAX_LIMIT),
        }),
        _ => Err(DocmateError::UnknownTool(name.to_string())),
    }
}

#[derive(Debug, Serialize)]
struct DocumentRef<'a> {
    id: i64,
    title: &'a str,
}

#[derive(Debug, Serialize)]
struct DocumentView<'a> {
    id: i64,
    title: &'a str,
    content: Option<&'a str>,
    created_at: DateTime<Utc>,
}

impl<'a> From<&'a Document> for DocumentView<'a> {
    fn from(doc: &'a Document) -> Self {
        Self {
            id: doc.id,
            title: &doc.title,
            content: doc.content.as_deref(),
            created_at: doc.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct UpdatedDocument<'a> {
    #[serde(flatten)]
    document: DocumentView<'a>,
    updated_at: DateTime<Utc>,
    message: String,
}

#[derive(Debug, Serialize)]
struct Message {
    message: &'static str,
}

fn refs(docs: &[Document]) -> Vec<DocumentRef<'_>> {
    docs.iter()
        .map(|d| DocumentRef {
            id: d.id,
            title: &d.title,
        })
        .collect()
}

/// Document tools bound to one user's documents.
pub struct DocumentTools {
    store: Arc<dyn DocumentStore>,
    config: RequestConfig,
}

impl DocumentTools {
    pub fn new(store: Arc<dyn DocumentStore>, config: RequestConfig) -> Self {
        Self { store, config }
    }

    /// Execute a parsed call and return the JSON result.
    pub async fn execute(&self, call: &DocumentToolCall) -> Result<String> {
        let owner_id = self.config.owner_id()?;

        match call {
            DocumentToolCall::ListDocuments { limit } => {
                let docs = self.store.list(owner_id, *limit).await?;
                to_output(&refs(&docs))
            }
            DocumentToolCall::GetDocument { document_id } => {
                let doc = self.store.get(owner_id, *document_id).await?;
                to_output(&DocumentView::from(&doc))
            }
            DocumentToolCall::CreateDocument { title, content } => {
                let doc = self
                    .store
                    .create(owner_id, NewDocument::new(title.clone(), content.clone()))
                    .await?;
                to_output(&DocumentView::from(&doc))
            }
            DocumentToolCall::UpdateDocument {
                document_id,
                title,
                content,
            } => {
                let patch = DocumentPatch {
                    title: title.clone(),
                    content: content.clone(),
                };
                let changed = !patch.is_empty();
                let doc = self.store.update(owner_id, *document_id, patch).await?;

                let message = if changed {
                    format!("Document '{}' updated successfully.", doc.title)
                } else {
                    format!("No changes supplied for document '{}'.", doc.title)
                };
                to_output(&UpdatedDocument {
                    document: DocumentView::from(&doc),
                    updated_at: doc.updated_at,
                    message,
                })
            }
            DocumentToolCall::DeleteDocument { document_id } => {
                self.store.delete(owner_id, *document_id).await?;
                to_output(&Message {
                    message: "Document deleted successfully.",
                })
            }
            DocumentToolCall::SearchDocuments { query, limit } => {
                let docs = self.store.search(owner_id, query, *limit).await?;
                to_output(&refs(&docs))
            }
        }
    }
}

#[async_trait]
impl Toolset for DocumentTools {
    fn specs(&self) -> Vec<ToolSpec> {
        document_tool_specs()
    }

    async fn call(&self, name: &str, arguments: &str) -> Result<String> {
        info!("[Tool] {} was called", name);
        let call = parse_document_tool_call(name, arguments)?;
        self.execute(&call).await
    }
}

fn document_tool_specs() -> Vec<ToolSpec> {
    let document_id = json!({
        "type": "integer",
        "description": "ID of the document"
    });
    let limit = json!({
        "type": "integer",
        "description": "Number of documents to return (max 25)",
        "default": 5
    });

    vec![
        ToolSpec {
            name: "list_documents",
            description: "List up to 25 of the user's most recent documents.",
            parameters: json!({
                "type": "object",
                "properties": { "limit": limit }
            }),
        },
        ToolSpec {
            name: "get_document",
            description: "Retrieve a specific document's full details (title, content, date) by its ID. \
                Use when the user asks to open or view a document.",
            parameters: json!({
                "type": "object",
                "properties": { "document_id": document_id },
                "required": ["document_id"]
            }),
        },
        ToolSpec {
            name: "create_document",
            description: "Create a new document for the user by providing a title and content. \
                Use when the user asks to write, draft, or save a new document.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Title of the new document"
                    },
                    "content": {
                        "type": "string",
                        "description": "Body text of the new document"
                    }
                },
                "required": ["title"]
            }),
        },
        ToolSpec {
            name: "update_document",
            description: "Update an existing document's title or content. \
                Use when the user asks to rename, fix, revise, modify, or correct a document.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "document_id": document_id,
                    "title": {
                        "type": "string",
                        "description": "New title; omit to keep the current one"
                    },
                    "content": {
                        "type": "string",
                        "description": "New content; omit to keep the current one"
                    }
                },
                "required": ["document_id"]
            }),
        },
        ToolSpec {
            name: "delete_document",
            description: "Delete a document from the user's list by specifying its ID. \
                Use when the user wants to remove or erase a document.",
            parameters: json!({
                "type": "object",
                "properties": { "document_id": document_id },
                "required": ["document_id"]
            }),
        },
        ToolSpec {
            name: "search_documents",
            description: "Search the user's documents by keyword in title or content. \
                Use when the user wants to find specific documents based on text.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Keyword to look for"
                    },
                    "limit": limit
                },
                "required": ["query"]
            }),
        },
    ]
}
