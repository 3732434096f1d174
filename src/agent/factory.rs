//! Builders for the document agent, the movie agent and the supervisor.

use super::model::{ChatModel, OpenAiChatModel};
use super::runner::Agent;
use super::supervisor::Supervisor;
use crate::config::{Prompts, Settings};
use crate::error::{DocmateError, Result};
use crate::store::{open_store, DocumentStore};
use crate::tmdb::{MovieCatalog, TmdbClient};
use crate::tools::{DocumentTools, MovieTools, RequestConfig};
use std::sync::Arc;
use tracing::warn;

pub const DOCUMENT_AGENT: &str = "document_agent";
pub const MOVIE_AGENT: &str = "movie_agent";

/// Shared backends from which per-request agents are assembled.
#[derive(Clone)]
pub struct AgentFactory {
    model: Arc<dyn ChatModel>,
    store: Arc<dyn DocumentStore>,
    catalog: Option<Arc<dyn MovieCatalog>>,
    prompts: Prompts,
    max_iterations: usize,
}

impl AgentFactory {
    pub fn new(
        model: Arc<dyn ChatModel>,
        store: Arc<dyn DocumentStore>,
        catalog: Option<Arc<dyn MovieCatalog>>,
        prompts: Prompts,
    ) -> Self {
        Self {
            model,
            store,
            catalog,
            prompts,
            max_iterations: super::runner::DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Wire up the configured model, store, TMDB client and prompts.
    ///
    /// The movie agent is left out when no TMDB token is configured.
    pub fn from_settings(settings: &Settings, model: Option<&str>) -> Result<Self> {
        let chat = OpenAiChatModel::from_settings(&settings.llm, model)?;
        let store = open_store(settings)?;

        let catalog: Option<Arc<dyn MovieCatalog>> = if settings.tmdb.token().is_some() {
            Some(Arc::new(TmdbClient::new(&settings.tmdb)?))
        } else {
            warn!(
                "{} not set; movie tools are disabled",
                settings.tmdb.api_key_env
            );
            None
        };

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Ok(Self::new(Arc::new(chat), store, catalog, prompts)
            .with_max_iterations(settings.agent.max_iterations))
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    pub fn catalog(&self) -> Option<Arc<dyn MovieCatalog>> {
        self.catalog.clone()
    }

    /// Agent managing the caller's documents.
    pub fn document_agent(&self, config: &RequestConfig) -> Agent {
        let tools = DocumentTools::new(self.store.clone(), config.clone());
        Agent::new(
            DOCUMENT_AGENT,
            &self.prompts.documents(),
            self.model.clone(),
            Arc::new(tools),
        )
        .with_max_iterations(self.max_iterations)
    }

    /// Agent searching TMDB.
    pub fn movie_agent(&self, config: &RequestConfig) -> Result<Agent> {
        let catalog = self.catalog.clone().ok_or_else(|| {
            DocmateError::Config("Movie tools need a TMDB token (TMDB_API_KEY)".to_string())
        })?;
        let tools = MovieTools::new(catalog, config.clone());
        Ok(Agent::new(
            MOVIE_AGENT,
            &self.prompts.movies(),
            self.model.clone(),
            Arc::new(tools),
        )
        .with_max_iterations(self.max_iterations))
    }

    /// Supervisor routing between every available agent.
    pub fn supervisor(&self, config: &RequestConfig) -> Supervisor {
        let mut supervisor = Supervisor::new(&self.prompts.supervisor(), self.model.clone())
            .with_max_iterations(self.max_iterations)
            .with_agent(self.document_agent(config));
        if let Ok(agent) = self.movie_agent(config) {
            supervisor = supervisor.with_agent(agent);
        }
        supervisor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::model::testing::ScriptedModel;
    use crate::store::MemoryDocumentStore;
    use crate::tmdb::{MovieDetail, MovieSearchPage};
    use async_trait::async_trait;

    struct NoMovies;

    #[async_trait]
    impl MovieCatalog for NoMovies {
        async fn search_movies(&self, _query: &str, page: u32) -> Result<MovieSearchPage> {
            Ok(MovieSearchPage {
                page,
                results: vec![],
                total_results: Some(0),
                total_pages: 0,
            })
        }

        async fn movie_detail(&self, _movie_id: i64) -> Result<Option<MovieDetail>> {
            Ok(None)
        }
    }

    fn factory(catalog: Option<Arc<dyn MovieCatalog>>) -> AgentFactory {
        AgentFactory::new(
            Arc::new(ScriptedModel::new(vec![])),
            Arc::new(MemoryDocumentStore::new()),
            catalog,
            Prompts::default(),
        )
    }

    #[test]
    fn test_supervisor_includes_available_agents() {
        let config = RequestConfig::new(Some("1".to_string()));

        let full = factory(Some(Arc::new(NoMovies)));
        assert_eq!(full.supervisor(&config).agent_names(), vec![DOCUMENT_AGENT, MOVIE_AGENT]);

        let docs_only = factory(None);
        assert_eq!(docs_only.supervisor(&config).agent_names(), vec![DOCUMENT_AGENT]);
        assert!(docs_only.movie_agent(&config).is_err());
    }

    #[test]
    fn test_agents_use_configured_prompts() {
        let config = RequestConfig::new(None);
        let agent = factory(None).document_agent(&config);
        assert_eq!(agent.name(), DOCUMENT_AGENT);
        assert!(agent.prompt().contains("list_documents"));
    }
}
