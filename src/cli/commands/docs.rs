//! Docs command - direct document management.

use crate::cli::preflight::{self, Operation};
use crate::cli::{DocsAction, Output};
use crate::config::Settings;
use crate::store::{clamp_limit, open_store, DocumentPatch, DocumentStore, NewDocument};
use crate::tools::RequestConfig;
use anyhow::Result;

/// Run a docs subcommand for the configured user.
pub async fn run_docs(action: &DocsAction, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Documents, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Set general.user_id in the config or pass --user <id>.");
        return Err(e.into());
    }

    let owner_id = RequestConfig::new(settings.general.user_id.clone()).owner_id()?;
    let store = open_store(&settings)?;

    execute(store.as_ref(), owner_id, action).await
}

async fn execute(store: &dyn DocumentStore, owner_id: i64, action: &DocsAction) -> Result<()> {
    match action {
        DocsAction::List { limit } => {
            let docs = store.list(owner_id, clamp_limit(*limit)).await?;
            if docs.is_empty() {
                Output::info("No documents yet. Use 'docmate docs create <title>' to add one.");
                return Ok(());
            }

            let total = store.count(owner_id).await?;
            Output::header(&format!("Documents ({} of {})", docs.len(), total));
            println!();
            for doc in &docs {
                Output::document_row(doc);
            }
        }

        DocsAction::Show { id } => {
            let doc = store.get(owner_id, *id).await?;
            Output::document(&doc);
        }

        DocsAction::Create { title, content } => {
            let doc = store
                .create(owner_id, NewDocument::new(title.as_str(), content.clone()))
                .await?;
            Output::success(&format!("Created document #{} '{}'", doc.id, doc.title));
        }

        DocsAction::Update { id, title, content } => {
            let patch = DocumentPatch::new(title.clone(), content.clone());
            if patch.is_empty() {
                Output::warning("Nothing to update. Pass --title and/or --content.");
            }
            let doc = store.update(owner_id, *id, patch).await?;
            Output::success(&format!("Document #{} '{}' is up to date.", doc.id, doc.title));
        }

        DocsAction::Delete { id } => {
            let doc = store.delete(owner_id, *id).await?;
            Output::success(&format!("Deleted document #{} '{}'", doc.id, doc.title));
        }

        DocsAction::Search { query, limit } => {
            let query = query.trim();
            if query.is_empty() {
                anyhow::bail!("Search query must not be empty");
            }

            let docs = store.search(owner_id, query, clamp_limit(*limit)).await?;
            if docs.is_empty() {
                Output::info(&format!("No documents match '{}'.", query));
                return Ok(());
            }

            Output::header(&format!("Matches for '{}' ({})", query, docs.len()));
            println!();
            for doc in &docs {
                Output::document_row(doc);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;

    #[tokio::test]
    async fn test_create_update_delete() {
        let store = MemoryDocumentStore::new();

        execute(
            &store,
            1,
            &DocsAction::Create {
                title: "Draft".to_string(),
                content: None,
            },
        )
        .await
        .unwrap();
        let id = store.list(1, 5).await.unwrap()[0].id;

        execute(
            &store,
            1,
            &DocsAction::Update {
                id,
                title: Some("Final".to_string()),
                content: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(store.get(1, id).await.unwrap().title, "Final");

        // another user cannot delete it
        assert!(execute(&store, 2, &DocsAction::Delete { id }).await.is_err());

        execute(&store, 1, &DocsAction::Delete { id }).await.unwrap();
        assert_eq!(store.count(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blank_search_is_rejected() {
        let store = MemoryDocumentStore::new();
        let action = DocsAction::Search {
            query: "  ".to_string(),
            limit: 5,
        };
        assert!(execute(&store, 1, &action).await.is_err());
    }
}
