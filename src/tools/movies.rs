//! Movie discovery tools backed by TMDB.

use super::args::ToolArgs;
use super::{to_output, RequestConfig, ToolSpec, Toolset};
use crate::error::{DocmateError, Result};
use crate::store::MAX_LIMIT;
use crate::tmdb::MovieCatalog;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// A validated movie tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum MovieToolCall {
    SearchMovies { query: String, limit: usize },
    MovieDetail { movie_id: i64 },
}

/// Parse a movie tool call from the model's name and raw arguments.
pub fn parse_movie_tool_call(name: &str, arguments: &str) -> Result<MovieToolCall> {
    let args = ToolArgs::parse(arguments)?;

    match name {
        "search_movies" => Ok(MovieToolCall::SearchMovies {
            query: args.required_str("query")?.trim().to_string(),
            limit: args.limit("limit", MAX_LIMIT),
        }),
        "movie_detail" => Ok(MovieToolCall::MovieDetail {
            movie_id: args.required_i64("movie_id")?,
        }),
        _ => Err(DocmateError::UnknownTool(name.to_string())),
    }
}

/// Movie tools for one request.
pub struct MovieTools {
    catalog: Arc<dyn MovieCatalog>,
    config: RequestConfig,
}

impl MovieTools {
    pub fn new(catalog: Arc<dyn MovieCatalog>, config: RequestConfig) -> Self {
        Self { catalog, config }
    }

    /// Execute a parsed call and return the JSON result.
    pub async fn execute(&self, call: &MovieToolCall) -> Result<String> {
        match call {
            MovieToolCall::SearchMovies { query, limit } => {
                info!("Searching movies with user {:?}", self.config.user_id);
                let mut page = self.catalog.search_movies(query, 1).await?;
                if page.is_empty_result() {
                    return Ok("[]".to_string());
                }
                page.results.truncate(*limit);
                to_output(&page.results)
            }
            MovieToolCall::MovieDetail { movie_id } => {
                info!("Getting movie detail with user {:?}", self.config.user_id);
                match self.catalog.movie_detail(*movie_id).await? {
                    Some(detail) => to_output(&detail),
                    None => to_output(&json!({ "error": "Movie not found." })),
                }
            }
        }
    }
}

#[async_trait]
impl Toolset for MovieTools {
    fn specs(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: "search_movies",
                description: "Search up to 25 movies from The Movie Database (TMDB) \
                    matching the query string.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Movie title or keywords"
                        },
                        "limit": {
                            "type": "integer",
                            "description": "Number of movies to return (max 25)",
                            "default": 5
                        }
                    },
                    "required": ["query"]
                }),
            },
            ToolSpec {
                name: "movie_detail",
                description: "Get detailed movie information by TMDB movie ID.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "movie_id": {
                            "type": "integer",
                            "description": "TMDB movie ID"
                        }
                    },
                    "required": ["movie_id"]
                }),
            },
        ]
    }

    async fn call(&self, name: &str, arguments: &str) -> Result<String> {
        info!("[Tool] {} was called", name);
        let call = parse_movie_tool_call(name, arguments)?;
        self.execute(&call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tmdb::{MovieDetail, MovieSearchPage, MovieSummary};
    use serde_json::Value;

    /// Fixed catalog of numbered movies.
    struct FakeCatalog {
        movies: usize,
        report_total: Option<i64>,
    }

    #[async_trait]
    impl MovieCatalog for FakeCatalog {
        async fn search_movies(&self, query: &str, _page: u32) -> Result<MovieSearchPage> {
            let results = (1..=self.movies as i64)
                .map(|id| MovieSummary {
                    id,
                    title: format!("{} {}", query, id),
                    ..Default::default()
                })
                .collect();
            Ok(MovieSearchPage {
                page: 1,
                results,
                total_results: self.report_total,
                total_pages: 1,
            })
        }

        async fn movie_detail(&self, movie_id: i64) -> Result<Option<MovieDetail>> {
            if movie_id != 603 {
                return Ok(None);
            }
            Ok(Some(MovieDetail {
                id: 603,
                title: "The Matrix".to_string(),
                tagline: Some("Welcome to the Real World.".to_string()),
                overview: None,
                release_date: Some("1999-03-30".to_string()),
                runtime: Some(136),
                ..Default::default()
            }))
        }
    }

    fn tools(movies: usize, report_total: Option<i64>) -> MovieTools {
        MovieTools::new(
            Arc::new(FakeCatalog {
                movies,
                report_total,
            }),
            RequestConfig::new(Some("3".to_string())),
        )
    }

    #[tokio::test]
    async fn test_search_truncates_to_limit() {
        let tools = tools(40, Some(40));

        let out: Value =
            serde_json::from_str(&tools.call("search_movies", r#"{"query": "alien"}"#).await.unwrap())
                .unwrap();
        assert_eq!(out.as_array().unwrap().len(), 5);
        assert_eq!(out[0]["title"], "alien 1");

        let out: Value = serde_json::from_str(
            &tools
                .call("search_movies", r#"{"query": "alien", "limit": 99}"#)
                .await
                .unwrap(),
        )
        .unwrap();
        assert_eq!(out.as_array().unwrap().len(), 25);
    }

    #[tokio::test]
    async fn test_search_with_zero_total_is_empty() {
        let tools = tools(3, Some(0));
        let out = tools.call("search_movies", r#"{"query": "zzz"}"#).await.unwrap();
        assert_eq!(out, "[]");
    }

    #[tokio::test]
    async fn test_detail_found_and_missing() {
        let tools = tools(0, None);

        let out: Value =
            serde_json::from_str(&tools.call("movie_detail", r#"{"movie_id": "603"}"#).await.unwrap())
                .unwrap();
        assert_eq!(out["title"], "The Matrix");
        assert_eq!(out["runtime"], 136);

        let out: Value =
            serde_json::from_str(&tools.call("movie_detail", r#"{"movie_id": 1}"#).await.unwrap())
                .unwrap();
        assert_eq!(out, json!({ "error": "Movie not found." }));
    }

    #[test]
    fn test_parse_requires_query() {
        assert!(parse_movie_tool_call("search_movies", r#"{"limit": 3}"#).is_err());
        assert_eq!(
            parse_movie_tool_call("movie_detail", r#"{"movie_id": 550.0}"#).unwrap(),
            MovieToolCall::MovieDetail { movie_id: 550 }
        );
    }
}
