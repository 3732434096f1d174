//! HTTP client for the TMDB v3 API.

use super::{MovieCatalog, MovieDetail, MovieSearchPage};
use crate::config::TmdbSettings;
use crate::error::{DocmateError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// TMDB API client authenticated with a bearer read-access token.
///
/// Construction performs no network I/O.
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    language: String,
    include_adult: bool,
}

impl TmdbClient {
    /// Create a client from settings. Fails when no token is configured.
    pub fn new(settings: &TmdbSettings) -> Result<Self> {
        let token = settings.token().ok_or_else(|| {
            DocmateError::Config(format!(
                "TMDB token not set. Set tmdb.api_key in the config or export {}",
                settings.api_key_env
            ))
        })?;

        let mut client = Self::new_with_base_url(
            token,
            &settings.base_url,
            Duration::from_secs(settings.timeout_secs),
        )?;
        client.language = settings.language.clone();
        client.include_adult = settings.include_adult;
        Ok(client)
    }

    /// Create a client against an explicit base URL.
    pub fn new_with_base_url(token: String, base_url: &str, timeout: Duration) -> Result<Self> {
        // Url::join drops the last path segment unless it ends with '/'.
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)
            .map_err(|e| DocmateError::Config(format!("Invalid TMDB base URL {:?}: {}", base_url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url,
            token,
            language: "en-US".to_string(),
            include_adult: false,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DocmateError::Tmdb(format!("Invalid endpoint {}: {}", path, e)))
    }

    async fn get(&self, url: Url, query: &[(&str, String)]) -> Result<reqwest::Response> {
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;
        Ok(response)
    }
}

/// Turn a non-success response into an error, preferring TMDB's `status_message`.
async fn status_error(response: reqwest::Response) -> DocmateError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("status_message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED => {
            DocmateError::Tmdb(format!("authentication failed: {}", message))
        }
        _ => DocmateError::Tmdb(format!("HTTP {}: {}", status.as_u16(), message)),
    }
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    #[instrument(skip(self))]
    async fn search_movies(&self, query: &str, page: u32) -> Result<MovieSearchPage> {
        let url = self.endpoint("search/movie")?;
        let response = self
            .get(
                url,
                &[
                    ("query", query.to_string()),
                    ("page", page.max(1).to_string()),
                    ("include_adult", self.include_adult.to_string()),
                    ("language", self.language.clone()),
                ],
            )
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let page: MovieSearchPage = response.json().await?;
        debug!("TMDB search {:?} returned {} results", query, page.results.len());
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn movie_detail(&self, movie_id: i64) -> Result<Option<MovieDetail>> {
        let url = self.endpoint(&format!("movie/{}", movie_id))?;
        let response = self
            .get(
                url,
                &[
                    ("include_adult", self.include_adult.to_string()),
                    ("language", self.language.clone()),
                ],
            )
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(Some(response.json().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TmdbClient {
        TmdbClient::new_with_base_url("test-token".to_string(), &server.uri(), Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn test_search_sends_auth_and_params() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("accept", "application/json"))
            .and(query_param("query", "blade runner"))
            .and(query_param("page", "1"))
            .and(query_param("include_adult", "false"))
            .and(query_param("language", "en-US"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 1,
                "results": [
                    {"id": 78, "title": "Blade Runner", "release_date": "1982-06-25"},
                    {"id": 335984, "title": "Blade Runner 2049", "release_date": "2017-10-04"}
                ],
                "total_results": 2,
                "total_pages": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client(&server).search_movies("blade runner", 1).await.unwrap();
        assert_eq!(page.total_results, Some(2));
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[1].title, "Blade Runner 2049");
    }

    #[tokio::test]
    async fn test_search_results_pass_through_unread_fields() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 1,
                "results": [
                    {
                        "id": 603,
                        "title": "The Matrix",
                        "adult": false,
                        "backdrop_path": "/fNG7i7RqMErkcqhohV2a6cV1Ehy.jpg",
                        "original_language": "en",
                        "vote_count": 26280,
                        "genre_ids": null
                    }
                ],
                "total_results": 1,
                "total_pages": 1
            })))
            .mount(&server)
            .await;

        let page = client(&server).search_movies("matrix", 1).await.unwrap();
        let movie = serde_json::to_value(&page.results[0]).unwrap();
        assert_eq!(movie["id"], 603);
        assert_eq!(movie["adult"], false);
        assert_eq!(movie["backdrop_path"], "/fNG7i7RqMErkcqhohV2a6cV1Ehy.jpg");
        assert_eq!(movie["original_language"], "en");
        assert_eq!(movie["vote_count"], 26280);
    }

    #[tokio::test]
    async fn test_base_url_path_is_preserved() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/3/movie/603"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 603,
                "title": "The Matrix",
                "runtime": 136,
                "genres": [{"id": 28, "name": "Action"}]
            })))
            .mount(&server)
            .await;

        let client = TmdbClient::new_with_base_url(
            "t".to_string(),
            &format!("{}/3", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap();

        let detail = client.movie_detail(603).await.unwrap().unwrap();
        assert_eq!(detail.title, "The Matrix");
        assert_eq!(detail.runtime, Some(136));
        assert_eq!(detail.genres[0].name, "Action");
    }

    #[tokio::test]
    async fn test_detail_not_found_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/movie/999999999"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "status_code": 34,
                "status_message": "The resource you requested could not be found."
            })))
            .mount(&server)
            .await;

        assert!(client(&server).movie_detail(999999999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_surfaces_status_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "status_code": 7,
                "status_message": "Invalid API key: You must be granted a valid key."
            })))
            .mount(&server)
            .await;

        let err = client(&server).search_movies("alien", 1).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("authentication failed"));
        assert!(message.contains("Invalid API key"));
    }

    #[test]
    fn test_new_requires_token() {
        let settings = TmdbSettings {
            api_key: None,
            api_key_env: "DOCMATE_TEST_UNSET_TMDB_VAR".to_string(),
            ..Default::default()
        };
        assert!(matches!(TmdbClient::new(&settings), Err(DocmateError::Config(_))));
    }
}
