//! PostgREST-dialect client for the hosted key collection.
//!
//! Every response is decoded against the record schema at this boundary;
//! anything that does not fit becomes `StoreError::Malformed`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use super::{DeleteOutcome, KeyStore};
use crate::errors::StoreError;
use crate::models::api_key::{ApiKeyRecord, KeyId, KeyUpdate, NewApiKey};

const RETURN_REPRESENTATION: &str = "return=representation";

pub struct RestKeyStore {
    client: reqwest::Client,
    collection_url: Url,
    credential: Zeroizing<String>,
}

/// Error body PostgREST sends with non-2xx responses.
#[derive(Deserialize)]
struct PostgrestError {
    message: Option<String>,
    details: Option<String>,
}

#[derive(Deserialize)]
struct IdRow {
    #[allow(dead_code)]
    id: KeyId,
}

impl RestKeyStore {
    /// `base_url` is the project endpoint (e.g. `https://abc.supabase.co`);
    /// the collection lives at `{base_url}/rest/v1/{table}`.
    pub fn new(base_url: &str, table: &str, credential: Zeroizing<String>) -> anyhow::Result<Self> {
        let collection_url = collection_url(base_url, table)?;

        // No overall request timeout: a slow store leaves the caller waiting.
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("keydash/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            collection_url,
            credential,
        })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", self.credential.as_str())
            .bearer_auth(self.credential.as_str())
    }

    /// Collection URL filtered to a single id.
    fn row_url(&self, id: &KeyId) -> Url {
        let mut url = self.collection_url.clone();
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", id))
            .append_pair("select", "id");
        url
    }
}

fn collection_url(base_url: &str, table: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(base_url)?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("store URL must be http(s), got '{}'", url.scheme());
    }
    if table.trim().is_empty() {
        anyhow::bail!("store table name is empty");
    }
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("store URL cannot be a base: {}", base_url))?
        .pop_if_empty()
        .extend(["rest", "v1", table]);
    Ok(url)
}

/// Pass 2xx through; turn anything else into `StoreError::Rejected`.
async fn check_status(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<PostgrestError>(&body) {
        Ok(PostgrestError {
            message: Some(m),
            details,
        }) => match details {
            Some(d) if !d.is_empty() => format!("{} ({})", m, d),
            _ => m,
        },
        _ if body.is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        _ => body,
    };

    tracing::warn!(status = status.as_u16(), "store rejected request: {}", message);
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

async fn decode_rows<T: serde::de::DeserializeOwned>(resp: Response) -> Result<Vec<T>, StoreError> {
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::warn!("store returned a body that does not match the key schema: {}", e);
        StoreError::Malformed(e.to_string())
    })
}

#[async_trait]
impl KeyStore for RestKeyStore {
    async fn list_all(&self) -> Result<Vec<ApiKeyRecord>, StoreError> {
        let mut url = self.collection_url.clone();
        url.query_pairs_mut().append_pair("select", "*");

        let resp = self.authorized(self.client.get(url)).send().await?;
        let rows: Vec<ApiKeyRecord> = decode_rows(check_status(resp).await?).await?;
        tracing::debug!(count = rows.len(), "listed API keys");
        Ok(rows)
    }

    async fn insert(&self, record: &NewApiKey) -> Result<ApiKeyRecord, StoreError> {
        let mut url = self.collection_url.clone();
        url.query_pairs_mut().append_pair("select", "*");

        let resp = self
            .authorized(self.client.post(url))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[record])
            .send()
            .await?;

        let mut rows: Vec<ApiKeyRecord> = decode_rows(check_status(resp).await?).await?;
        if rows.is_empty() {
            return Err(StoreError::Malformed("no data returned from insert".into()));
        }
        let created = rows.swap_remove(0);
        tracing::info!(id = %created.id, name = %created.name, "inserted API key");
        Ok(created)
    }

    async fn update_fields(&self, id: &KeyId, update: &KeyUpdate) -> Result<(), StoreError> {
        let resp = self
            .authorized(self.client.patch(self.row_url(id)))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(update)
            .send()
            .await?;

        let resp = check_status(resp).await?;
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(());
        }
        let rows: Vec<IdRow> = decode_rows(resp).await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        tracing::info!(id = %id, "updated API key");
        Ok(())
    }

    async fn delete_by_id(&self, id: &KeyId) -> Result<DeleteOutcome, StoreError> {
        let resp = self
            .authorized(self.client.delete(self.row_url(id)))
            .header("Prefer", RETURN_REPRESENTATION)
            .send()
            .await?;

        let resp = check_status(resp).await?;
        if resp.status() == StatusCode::NO_CONTENT {
            // Store did not report affected rows.
            return Ok(DeleteOutcome::Deleted);
        }
        let rows: Vec<IdRow> = decode_rows(resp).await?;
        if rows.is_empty() {
            tracing::info!(id = %id, "delete matched no API key");
            return Ok(DeleteOutcome::NotFound);
        }
        tracing::info!(id = %id, "deleted API key");
        Ok(DeleteOutcome::Deleted)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let mut url = self.collection_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "id")
            .append_pair("limit", "1");

        let resp = self.authorized(self.client.get(url)).send().await?;
        check_status(resp).await?;
        Ok(())
    }
}
