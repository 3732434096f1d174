//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for documents, movie lookups and agent chat.
//! The caller is identified by the `x-user-id` header.

use crate::agent::{
    open_checkpointer, AgentFactory, ChatSession, Checkpointer, MemoryCheckpointer, OpenAiChatModel,
};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::error::DocmateError;
use crate::store::{open_store, DocumentPatch, DocumentStore, NewDocument, MAX_LIMIT};
use crate::tmdb::{MovieCatalog, TmdbClient};
use crate::tools::{resolve_limit, RequestConfig};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};

const USER_HEADER: &str = "x-user-id";

/// Shared application state.
pub struct AppState {
    store: Arc<dyn DocumentStore>,
    catalog: Option<Arc<dyn MovieCatalog>>,
    agents: Option<AgentFactory>,
    checkpointer: Arc<dyn Checkpointer>,
    history_limit: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        catalog: Option<Arc<dyn MovieCatalog>>,
        agents: Option<AgentFactory>,
        history_limit: usize,
    ) -> Self {
        Self {
            store,
            catalog,
            agents,
            checkpointer: Arc::new(MemoryCheckpointer::new()),
            history_limit,
        }
    }

    /// Use `checkpointer` for chat threads.
    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = checkpointer;
        self
    }

    /// Build state from settings. Chat and movies are disabled when their keys are missing.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let store = open_store(settings)?;

        let catalog: Option<Arc<dyn MovieCatalog>> = match settings.tmdb.token() {
            Some(_) => Some(Arc::new(TmdbClient::new(&settings.tmdb)?)),
            None => {
                warn!("No TMDB token; /movies endpoints are disabled");
                None
            }
        };

        let agents = match OpenAiChatModel::from_settings(&settings.llm, None) {
            Ok(model) => {
                let prompts = Prompts::load(
                    settings.prompts.custom_dir.as_deref(),
                    Some(&settings.prompts.variables),
                )?;
                Some(
                    AgentFactory::new(Arc::new(model), store.clone(), catalog.clone(), prompts)
                        .with_max_iterations(settings.agent.max_iterations),
                )
            }
            Err(e) => {
                warn!("Chat disabled: {}", e);
                None
            }
        };

        Ok(Self::new(store, catalog, agents, settings.agent.history_limit)
            .with_checkpointer(open_checkpointer(settings)?))
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/documents", get(list_documents).post(create_document))
        .route("/documents/search", get(search_documents))
        .route(
            "/documents/{id}",
            get(get_document).patch(update_document).delete(delete_document),
        )
        .route("/movies/search", get(search_movies))
        .route("/movies/{id}", get(movie_detail))
        .route("/chat", post(chat))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_settings(&settings)?);
    let chat_enabled = state.agents.is_some();
    let movies_enabled = state.catalog.is_some();
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Docmate API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints (send the caller id in the {} header):", USER_HEADER);
    Output::kv("Health", "GET    /health");
    Output::kv("List Documents", "GET    /documents?limit=5");
    Output::kv("Search Documents", "GET    /documents/search?q=...&limit=5");
    Output::kv("Create Document", "POST   /documents");
    Output::kv("Document", "GET|PATCH|DELETE /documents/{id}");
    if movies_enabled {
        Output::kv("Search Movies", "GET    /movies/search?query=...&limit=5");
        Output::kv("Movie Detail", "GET    /movies/{id}");
    }
    if chat_enabled {
        Output::kv("Chat", "POST   /chat");
    }
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ListQuery {
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct DocumentSearchQuery {
    q: String,
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct MovieSearchQuery {
    query: String,
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    thread_id: Option<String>,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
    thread_id: String,
    agent: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// An error with the HTTP status it maps to.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<DocmateError> for ApiError {
    fn from(e: DocmateError) -> Self {
        let status = match &e {
            DocmateError::DocumentNotFound => StatusCode::NOT_FOUND,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => {
                error!("Request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

fn request_config(headers: &HeaderMap) -> RequestConfig {
    let user = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    RequestConfig::new(user)
}

fn owner_id(headers: &HeaderMap) -> ApiResult<i64> {
    Ok(request_config(headers).owner_id()?)
}

fn catalog(state: &AppState) -> ApiResult<Arc<dyn MovieCatalog>> {
    state.catalog.clone().ok_or_else(|| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Movie search is not configured (missing TMDB token)",
        )
    })
}

fn limit(requested: Option<i64>) -> usize {
    resolve_limit(requested, MAX_LIMIT)
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_documents(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let owner = owner_id(&headers)?;
    let docs = state.store.list(owner, limit(query.limit)).await?;
    Ok(Json(docs))
}

async fn search_documents(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DocumentSearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let owner = owner_id(&headers)?;
    let q = query.q.trim();
    if q.is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Query must not be empty"));
    }
    let docs = state.store.search(owner, q, limit(query.limit)).await?;
    Ok(Json(docs))
}

async fn create_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(doc): Json<NewDocument>,
) -> ApiResult<impl IntoResponse> {
    let owner = owner_id(&headers)?;
    let doc = state.store.create(owner, doc).await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

async fn get_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let owner = owner_id(&headers)?;
    Ok(Json(state.store.get(owner, id).await?))
}

async fn update_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(patch): Json<DocumentPatch>,
) -> ApiResult<impl IntoResponse> {
    let owner = owner_id(&headers)?;
    Ok(Json(state.store.update(owner, id, patch).await?))
}

async fn delete_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let owner = owner_id(&headers)?;
    state.store.delete(owner, id).await?;
    Ok(Json(serde_json::json!({ "message": "Document deleted successfully." })))
}

async fn search_movies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MovieSearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let catalog = catalog(&state)?;
    let mut page = catalog.search_movies(&query.query, 1).await?;
    if page.is_empty_result() {
        page.results.clear();
    }
    page.results.truncate(limit(query.limit));
    Ok(Json(page.results))
}

async fn movie_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let catalog = catalog(&state)?;
    match catalog.movie_detail(id).await? {
        Some(detail) => Ok(Json(detail)),
        None => Err(ApiError::new(StatusCode::NOT_FOUND, "Movie not found.")),
    }
}

async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> ApiResult<impl IntoResponse> {
    let agents = state.agents.as_ref().ok_or_else(|| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Chat is not configured (missing LLM API key)",
        )
    })?;
    if req.message.trim().is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Message must not be empty"));
    }

    let mut config = request_config(&headers);
    if let Some(thread) = req.thread_id {
        config = config.with_thread(thread);
    }

    let session = ChatSession::new(
        Arc::new(agents.supervisor(&config)),
        state.checkpointer.clone(),
        state.history_limit,
    );
    let key = config.checkpoint_key();
    let response = session.send(&key, &req.message).await?;

    Ok(Json(ChatResponse {
        reply: response.content,
        thread_id: config.thread_id,
        agent: response.agent,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ChatModel, ModelReply};
    use crate::store::MemoryDocumentStore;
    use async_openai::types::{ChatCompletionRequestMessage, ChatCompletionTool};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// Always answers with the number of messages it was sent.
    struct CountingModel;

    #[async_trait]
    impl ChatModel for CountingModel {
        async fn complete(
            &self,
            messages: &[ChatCompletionRequestMessage],
            _tools: &[ChatCompletionTool],
        ) -> crate::error::Result<ModelReply> {
            Ok(ModelReply {
                content: Some(format!("seen {}", messages.len())),
                tool_calls: vec![],
            })
        }
    }

    async fn spawn(state: AppState) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(state))).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn documents_only() -> AppState {
        AppState::new(Arc::new(MemoryDocumentStore::new()), None, None, 30)
    }

    #[tokio::test]
    async fn test_document_crud_is_scoped_by_header() {
        let base = spawn(documents_only()).await;
        let http = reqwest::Client::new();

        let created: Value = http
            .post(format!("{}/documents", base))
            .header(USER_HEADER, "1")
            .json(&json!({ "title": "Plan", "content": "Ship it" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let id = created["id"].as_i64().unwrap();

        let foreign = http
            .get(format!("{}/documents/{}", base, id))
            .header(USER_HEADER, "2")
            .send()
            .await
            .unwrap();
        assert_eq!(foreign.status(), 404);
        let body: Value = foreign.json().await.unwrap();
        assert_eq!(body["error"], "Document not found or access denied.");

        let patched: Value = http
            .patch(format!("{}/documents/{}", base, id))
            .header(USER_HEADER, "1")
            .json(&json!({ "title": "Final plan" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(patched["title"], "Final plan");
        assert_eq!(patched["content"], "Ship it");

        let found: Value = http
            .get(format!("{}/documents/search?q=SHIP", base))
            .header(USER_HEADER, "1")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(found.as_array().unwrap().len(), 1);

        let deleted = http
            .delete(format!("{}/documents/{}", base, id))
            .header(USER_HEADER, "1")
            .send()
            .await
            .unwrap();
        assert_eq!(deleted.status(), 200);

        let again = http
            .delete(format!("{}/documents/{}", base, id))
            .header(USER_HEADER, "1")
            .send()
            .await
            .unwrap();
        assert_eq!(again.status(), 404);
    }

    #[tokio::test]
    async fn test_blank_patch_fields_are_ignored() {
        let base = spawn(documents_only()).await;
        let http = reqwest::Client::new();

        let created: Value = http
            .post(format!("{}/documents", base))
            .header(USER_HEADER, "1")
            .json(&json!({ "title": "Plan", "content": "Ship it" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let id = created["id"].as_i64().unwrap();

        let patched: Value = http
            .patch(format!("{}/documents/{}", base, id))
            .header(USER_HEADER, "1")
            .json(&json!({ "title": "   ", "content": "" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(patched["title"], "Plan");
        assert_eq!(patched["content"], "Ship it");
        assert_eq!(patched["updated_at"], created["updated_at"]);
    }

    #[tokio::test]
    async fn test_non_positive_limit_uses_default() {
        let base = spawn(documents_only()).await;
        let http = reqwest::Client::new();

        for i in 0..7 {
            http.post(format!("{}/documents", base))
                .header(USER_HEADER, "1")
                .json(&json!({ "title": format!("Doc {}", i) }))
                .send()
                .await
                .unwrap();
        }

        for query in ["limit=0", "limit=-2", ""] {
            let docs: Value = http
                .get(format!("{}/documents?{}", base, query))
                .header(USER_HEADER, "1")
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            assert_eq!(docs.as_array().unwrap().len(), 5);
        }
    }

    #[tokio::test]
    async fn test_missing_user_is_bad_request() {
        let base = spawn(documents_only()).await;

        let response = reqwest::get(format!("{}/documents", base)).await.unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Missing user_id in config");
    }

    #[tokio::test]
    async fn test_unconfigured_features_are_unavailable() {
        let base = spawn(documents_only()).await;
        let http = reqwest::Client::new();

        let movies = http
            .get(format!("{}/movies/search?query=alien", base))
            .send()
            .await
            .unwrap();
        assert_eq!(movies.status(), 503);

        let chat = http
            .post(format!("{}/chat", base))
            .json(&json!({ "message": "hi" }))
            .send()
            .await
            .unwrap();
        assert_eq!(chat.status(), 503);
    }

    #[tokio::test]
    async fn test_chat_keeps_thread_history() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let agents = AgentFactory::new(Arc::new(CountingModel), store.clone(), None, Prompts::default());
        let base = spawn(AppState::new(store, None, Some(agents), 30)).await;
        let http = reqwest::Client::new();

        let first: Value = http
            .post(format!("{}/chat", base))
            .header(USER_HEADER, "1")
            .json(&json!({ "message": "hello" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        // system + user
        assert_eq!(first["reply"], "seen 2");
        assert_eq!(first["agent"], "supervisor");
        let thread = first["thread_id"].as_str().unwrap().to_string();

        let second: Value = http
            .post(format!("{}/chat", base))
            .header(USER_HEADER, "1")
            .json(&json!({ "message": "again", "thread_id": thread }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(second["reply"], "seen 4");
        assert_eq!(second["thread_id"], thread.as_str());
    }
}
