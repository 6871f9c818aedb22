//! GKE v1 REST client.

use std::time::Duration;

use async_trait::async_trait;
use cleanup_reminder_core::{ClusterKey, ClusterRecord};
use reqwest::{Client, Response};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::GkeError;
use super::auth::TokenProvider;
use crate::config::GcpConfig;

/// Cluster operations the handlers depend on.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// List every cluster in every location of `project`.
    async fn list_clusters(&self, project: &str) -> Result<Vec<ClusterRecord>, GkeError>;

    /// Start deleting one cluster. Returns the long-running operation.
    async fn delete_cluster(&self, project: &str, key: &ClusterKey)
    -> Result<Operation, GkeError>;
}

/// Long-running GKE operation returned by mutating calls.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Operation ID.
    #[serde(default)]
    pub name: String,
    /// e.g. `DELETE_CLUSTER`.
    #[serde(default)]
    pub operation_type: Option<String>,
    /// e.g. `RUNNING`, `DONE`.
    #[serde(default)]
    pub status: Option<String>,
    /// Resource the operation acts on.
    #[serde(default)]
    pub target_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListClustersResponse {
    /// Absent when the project has no clusters.
    #[serde(default)]
    clusters: Vec<ClusterRecord>,
    /// Zones that could not be reached; their clusters are missing.
    #[serde(default)]
    missing_zones: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    #[serde(default)]
    message: String,
}

/// GKE API client.
#[derive(Debug, Clone)]
pub struct GkeClient {
    client: Client,
    /// API base URL, without trailing slash.
    api_base: String,
    tokens: TokenProvider,
}

impl GkeClient {
    /// Create a client from configuration.
    ///
    /// Uses `config.access_token` when set, the metadata server otherwise.
    ///
    /// # Errors
    ///
    /// Returns `GkeError::Config` if the HTTP client cannot be built.
    pub fn new(config: &GcpConfig, timeout: Duration) -> Result<Self, GkeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GkeError::Config(e.to_string()))?;

        let tokens = match &config.access_token {
            Some(token) => TokenProvider::fixed(token.clone()),
            None => TokenProvider::metadata(client.clone(), &config.metadata_host),
        };

        Ok(Self::with_tokens(client, &config.api_base, tokens))
    }

    /// Create a client with an explicit token provider.
    #[must_use]
    pub fn with_tokens(client: Client, api_base: &str, tokens: TokenProvider) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    async fn check(response: Response) -> Result<Response, GkeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GoogleErrorResponse>(&text)
            .map(|e| e.error.message)
            .unwrap_or(text);

        Err(GkeError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ClusterApi for GkeClient {
    #[instrument(skip(self))]
    async fn list_clusters(&self, project: &str) -> Result<Vec<ClusterRecord>, GkeError> {
        let project = path_segment(project)?;
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .get(format!(
                "{}/v1/projects/{project}/locations/-/clusters",
                self.api_base
            ))
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        let body: ListClustersResponse = Self::check(response).await?.json().await?;

        if !body.missing_zones.is_empty() {
            warn!(zones = ?body.missing_zones, "Cluster listing is missing zones");
        }

        debug!(count = body.clusters.len(), "Listed clusters");

        Ok(body.clusters)
    }

    #[instrument(skip(self), fields(cluster = %key))]
    async fn delete_cluster(
        &self,
        project: &str,
        key: &ClusterKey,
    ) -> Result<Operation, GkeError> {
        let project = path_segment(project)?;
        let location = path_segment(key.location())?;
        let name = path_segment(key.name())?;
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .delete(format!(
                "{}/v1/projects/{project}/locations/{location}/clusters/{name}",
                self.api_base
            ))
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        let operation: Operation = Self::check(response).await?.json().await?;

        debug!(operation = %operation.name, status = ?operation.status, "Cluster deletion started");

        Ok(operation)
    }
}

/// Accept only identifiers GCP can actually issue.
fn path_segment(value: &str) -> Result<&str, GkeError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
        && value.chars().any(|c| c != '.');

    if valid {
        Ok(value)
    } else {
        Err(GkeError::InvalidIdentifier(value.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cleanup_reminder_core::ClusterStatus;
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GkeClient {
        GkeClient::with_tokens(
            Client::new(),
            &server.uri(),
            TokenProvider::fixed(SecretString::from("ya29.test")),
        )
    }

    #[tokio::test]
    async fn list_clusters_across_all_locations() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/demo-project/locations/-/clusters"))
            .and(header("authorization", "Bearer ya29.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "clusters": [
                    {"name": "a", "location": "loc1", "status": "RUNNING", "nodePools": []},
                    {"name": "b", "location": "loc2", "status": "STOPPING"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let clusters = client(&server).list_clusters("demo-project").await.unwrap();

        assert_eq!(
            clusters,
            vec![
                ClusterRecord::new("a", "loc1", ClusterStatus::Running),
                ClusterRecord::new("b", "loc2", ClusterStatus::Stopping),
            ]
        );
    }

    #[tokio::test]
    async fn empty_project_lists_no_clusters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let clusters = client(&server).list_clusters("demo-project").await.unwrap();
        assert!(clusters.is_empty());
    }

    #[tokio::test]
    async fn api_error_message_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "Permission denied", "status": "PERMISSION_DENIED"}
            })))
            .mount(&server)
            .await;

        match client(&server).list_clusters("demo-project").await {
            Err(GkeError::Api { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "Permission denied");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_cluster_targets_location_and_name() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/projects/demo-project/locations/loc1/clusters/a"))
            .and(header("authorization", "Bearer ya29.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "operation-123",
                "operationType": "DELETE_CLUSTER",
                "status": "RUNNING"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let operation = client(&server)
            .delete_cluster("demo-project", &ClusterKey::new("loc1", "a"))
            .await
            .unwrap();

        assert_eq!(operation.name, "operation-123");
        assert_eq!(operation.operation_type.as_deref(), Some("DELETE_CLUSTER"));
    }

    #[tokio::test]
    async fn delete_rejects_path_traversal_without_calling_api() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let result = client(&server)
            .delete_cluster("demo-project", &ClusterKey::new("..", "a"))
            .await;

        assert!(matches!(result, Err(GkeError::InvalidIdentifier(_))));
    }

    #[test]
    fn path_segment_validation() {
        assert!(path_segment("us-central1-a").is_ok());
        assert!(path_segment("my_project.v2").is_ok());
        assert!(path_segment("example.com:legacy-project").is_ok());
        assert!(path_segment("").is_err());
        assert!(path_segment("..").is_err());
        assert!(path_segment("a?b").is_err());
        assert!(path_segment("a b").is_err());
    }
}
