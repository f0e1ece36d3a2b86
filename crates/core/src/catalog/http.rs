//! HTTP client for a Radarr-style movie catalog.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CatalogError, Movie, MovieCatalog};

/// Catalog client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the library manager (e.g. "http://localhost:7878").
    pub url: String,
    /// API key, sent as X-Api-Key.
    pub api_key: String,
    /// Request timeout in seconds (default: 10).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    10
}

/// Movie catalog backed by the library manager's v3 HTTP API.
pub struct HttpMovieCatalog {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpMovieCatalog {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        if config.api_key.is_empty() {
            return Err(CatalogError::NotConfigured(
                "catalog API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| CatalogError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, CatalogError> {
        let url = format!("{}/api/v3/{}", self.base_url, path);
        debug!(url = %url, "Querying catalog");

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CatalogError::Timeout
                } else {
                    CatalogError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl MovieCatalog for HttpMovieCatalog {
    fn name(&self) -> &str {
        "radarr"
    }

    async fn movies(&self) -> Result<Vec<Movie>, CatalogError> {
        let dtos: Vec<MovieDto> = self.get_json("movie").await?;
        Ok(dtos.into_iter().map(Movie::from).collect())
    }

    async fn movie(&self, movie_id: i64) -> Result<Option<Movie>, CatalogError> {
        match self.get_json::<MovieDto>(&format!("movie/{}", movie_id)).await {
            Ok(dto) => Ok(Some(Movie::from(dto))),
            Err(CatalogError::ApiError { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovieDto {
    id: i64,
    tmdb_id: i64,
    title: String,
    year: u32,
    folder_name: PathBuf,
    #[serde(default)]
    has_file: bool,
    #[serde(default)]
    movie_file: Option<MovieFileDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovieFileDto {
    path: PathBuf,
}

impl From<MovieDto> for Movie {
    fn from(dto: MovieDto) -> Self {
        Movie {
            id: dto.id,
            tmdb_id: dto.tmdb_id,
            title: dto.title,
            year: dto.year,
            folder: dto.folder_name,
            movie_file: dto.movie_file.map(|f| f.path),
            has_file: dto.has_file,
        }
    }
}
