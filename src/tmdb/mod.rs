//! The Movie Database (TMDB) integration.
//!
//! A thin client over the v3 REST API plus the response types the movie tools
//! hand to the LLM.

mod client;

pub use client::TmdbClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One entry of a movie search.
///
/// Fields the crate does not read are kept in `extra` and serialized back
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genre_ids: Vec<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A page of search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieSearchPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<MovieSummary>,
    /// `None` when the API omitted the count or sent something unparseable.
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_results: Option<i64>,
    #[serde(default)]
    pub total_pages: u32,
}

impl MovieSearchPage {
    /// True only when the API explicitly reported zero matches.
    pub fn is_empty_result(&self) -> bool {
        self.total_results == Some(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Full details for a single movie. Unread fields are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<Genre>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Source of movie metadata.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Search movies by free text.
    async fn search_movies(&self, query: &str, page: u32) -> Result<MovieSearchPage>;

    /// Fetch a movie by id. `None` when the id is unknown.
    async fn movie_detail(&self, movie_id: i64) -> Result<Option<MovieDetail>>;
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
