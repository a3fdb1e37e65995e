//! Upstream catalog over HTTP.
//!
//! One attempt per call with a request timeout. Retries and backoff belong
//! to whatever sits in front of this client, not to the search pipeline.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use kibble_core::domain::Product;
use kibble_core::ports::{Catalog, CatalogError, CatalogPage, CatalogQuery};

#[derive(Debug, Clone)]
pub struct HttpCatalogConfig {
    /// Base URL, e.g. `https://catalog.example.com/v1`.
    pub base_url: String,
    pub timeout: Duration,
}

impl HttpCatalogConfig {
    /// `None` when `CATALOG_BASE_URL` is not set.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("CATALOG_BASE_URL").ok()?;
        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(
                std::env::var("CATALOG_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        })
    }
}

pub struct HttpCatalog {
    client: Client,
    config: HttpCatalogConfig,
}

impl HttpCatalog {
    pub fn new(config: HttpCatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::Invalid(format!("HTTP client setup failed: {e}")))?;

        tracing::info!(url = %config.base_url, "Using upstream catalog");
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let response = self
            .client
            .get(self.url(path))
            .query(params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, path));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Invalid(format!("undecodable response from {path}: {e}")))
    }
}

/// Query string parameters understood by the catalog.
fn query_params(query: &CatalogQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("limit", query.limit.to_string()),
        ("offset", query.offset.to_string()),
    ];
    if let Some(search) = &query.search {
        params.push(("search", search.clone()));
    }
    if let Some(form) = query.form {
        params.push(("form", form.to_string()));
    }
    if !query.conditions.is_empty() {
        params.push(("conditions", query.conditions.join(",")));
    }
    if let Some(min) = query.min_protein {
        params.push(("minProtein", min.to_string()));
    }
    if let Some(max) = query.max_carbs {
        params.push(("maxCarbs", max.to_string()));
    }
    params
}

fn transport_error(err: reqwest::Error) -> CatalogError {
    if err.is_timeout() {
        CatalogError::Unavailable("catalog request timed out".to_string())
    } else if err.is_connect() {
        CatalogError::Unavailable("could not connect to catalog".to_string())
    } else {
        CatalogError::Unavailable(format!("catalog request failed: {err}"))
    }
}

/// Map a non-success status. Upstream bodies are never passed through.
fn status_error(status: StatusCode, path: &str) -> CatalogError {
    if status == StatusCode::NOT_FOUND {
        CatalogError::NotFound(path.to_string())
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        CatalogError::Unavailable(format!("catalog returned {status}"))
    } else {
        CatalogError::Invalid(format!("catalog rejected request with {status}"))
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn fetch_batch(&self, query: &CatalogQuery) -> Result<CatalogPage, CatalogError> {
        self.get_json("products", &query_params(query)).await
    }

    async fn fetch_product(&self, id: &str) -> Result<Product, CatalogError> {
        self.get_json(&format!("products/{id}"), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kibble_core::domain::ProductForm;

    #[test]
    fn test_query_params_skip_unset_filters() {
        let params = query_params(&CatalogQuery {
            limit: 50,
            offset: 0,
            ..Default::default()
        });
        assert_eq!(
            params,
            vec![("limit", "50".to_string()), ("offset", "0".to_string())]
        );
    }

    #[test]
    fn test_query_params_forward_supported_filters() {
        let params = query_params(&CatalogQuery {
            search: Some("salmon".to_string()),
            form: Some(ProductForm::Wet),
            conditions: vec!["kitten".to_string(), "growth".to_string()],
            min_protein: Some(30.0),
            max_carbs: Some(12.5),
            limit: 10,
            offset: 20,
        });
        assert!(params.contains(&("form", "wet".to_string())));
        assert!(params.contains(&("conditions", "kitten,growth".to_string())));
        assert!(params.contains(&("minProtein", "30".to_string())));
        assert!(params.contains(&("maxCarbs", "12.5".to_string())));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "products/x"),
            CatalogError::NotFound(_)
        ));
        assert!(status_error(StatusCode::BAD_GATEWAY, "products").is_transient());
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS, "products").is_transient());
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, "products"),
            CatalogError::Invalid(_)
        ));
    }

    #[test]
    fn test_url_joining() {
        let catalog = HttpCatalog::new(HttpCatalogConfig {
            base_url: "http://catalog.local/v1".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(catalog.url("/products"), "http://catalog.local/v1/products");
    }
}
