use reqwest::{Client, StatusCode};
use std::sync::OnceLock;
use tokio::time::Duration;
use crate::error::PlanError;
use crate::sync::{SnapshotDocument, SnapshotStore};

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Reusable HTTP client singleton (created once, reused for all requests)
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

fn get_http_client() -> &'static Client {
    HTTP_CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            })
    })
}

/// Remote document store speaking `GET`/`PUT {base_url}/users/{user_id}`.
#[derive(Debug, Clone)]
pub struct HttpSnapshotStore {
    base_url: String,
}

impl HttpSnapshotStore {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        let base_url: String = base_url.into();
        HttpSnapshotStore {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn document_url(&self, user_id: &str) -> String {
        format!("{}/users/{}", self.base_url, user_id)
    }
}

impl SnapshotStore for HttpSnapshotStore {
    async fn load(&self, user_id: &str) -> Result<Option<SnapshotDocument>, PlanError> {
        let url = self.document_url(user_id);
        let response = get_http_client().get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(user = %user_id, "No remote snapshot yet");
            return Ok(None);
        }
        let document = response
            .error_for_status()?
            .json::<SnapshotDocument>()
            .await?;
        tracing::info!(user = %user_id, subjects = document.subjects.len(), "Remote snapshot loaded");
        Ok(Some(document))
    }

    async fn save(&self, user_id: &str, document: &SnapshotDocument) -> Result<(), PlanError> {
        let url = self.document_url(user_id);
        get_http_client()
            .put(&url)
            .json(document)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
