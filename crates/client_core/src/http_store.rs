use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use shared::{
    domain::{Record, RecordFields, RecordId},
    error::ApiError,
    protocol::{CreateRecordResponse, ListRecordsResponse},
};
use tracing::debug;
use url::Url;

use crate::{
    config::{normalize_collection_path, StoreSettings},
    error::StoreError,
    RemoteStore,
};

/// JSON-over-HTTP client for a single document collection.
pub struct HttpRemoteStore {
    http: Client,
    collection: Url,
    auth_token: Option<String>,
}

impl HttpRemoteStore {
    pub fn new(base_url: &str, collection_path: &str) -> Result<Self, StoreError> {
        Self::with_client(Client::new(), base_url, collection_path)
    }

    pub fn from_settings(settings: &StoreSettings) -> Result<Self, StoreError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let store = Self::with_client(
            builder.build()?,
            &settings.base_url,
            &settings.collection_path,
        )?;
        Ok(match &settings.auth_token {
            Some(token) => store.with_auth_token(token.clone()),
            None => store,
        })
    }

    fn with_client(
        http: Client,
        base_url: &str,
        collection_path: &str,
    ) -> Result<Self, StoreError> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|err| StoreError::InvalidConfig(format!("base url '{base_url}': {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StoreError::InvalidConfig(format!(
                "base url '{base_url}' must use http or https"
            )));
        }

        let collection = format!(
            "{}{}",
            parsed.as_str().trim_end_matches('/'),
            normalize_collection_path(collection_path)
        );
        let collection = Url::parse(&collection).map_err(|err| {
            StoreError::InvalidConfig(format!("collection url '{collection}': {err}"))
        })?;
        if collection.cannot_be_a_base() {
            return Err(StoreError::InvalidConfig(format!(
                "collection url '{collection}' cannot hold document paths"
            )));
        }

        Ok(Self {
            http,
            collection,
            auth_token: None,
        })
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn collection_url(&self) -> &str {
        self.collection.as_str()
    }

    /// The id is pushed as one percent-encoded path segment, so reserved
    /// characters stay part of the id.
    fn document_url(&self, id: &RecordId) -> Result<Url, StoreError> {
        let mut url = self.collection.clone();
        url.path_segments_mut()
            .map_err(|()| {
                StoreError::InvalidConfig(format!(
                    "collection url '{}' cannot hold document paths",
                    self.collection
                ))
            })?
            .pop_if_empty()
            .push(id.as_str());
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

async fn ensure_success(response: Response, id: Option<&RecordId>) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return Err(StoreError::NotFound { id: id.clone() });
        }
    }

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(err) => {
            debug!(status = status.as_u16(), error = %err, "failed to read error response body");
            return Err(StoreError::Status {
                status: status.as_u16(),
            });
        }
    };
    match serde_json::from_slice::<ApiError>(&body) {
        Ok(api_error) => Err(StoreError::Api {
            status: status.as_u16(),
            source: api_error.into(),
        }),
        Err(_) => Err(StoreError::Status {
            status: status.as_u16(),
        }),
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        let res = self
            .request(Method::GET, self.collection.clone())
            .send()
            .await?;
        let records: ListRecordsResponse = ensure_success(res, None).await?.json().await?;
        debug!(count = records.len(), "listed remote collection");
        Ok(records)
    }

    async fn create(&self, fields: &RecordFields) -> Result<RecordId, StoreError> {
        let res = self
            .request(Method::POST, self.collection.clone())
            .json(fields)
            .send()
            .await?;
        let body: CreateRecordResponse = ensure_success(res, None).await?.json().await?;
        Ok(body.id)
    }

    async fn replace_fields(&self, id: &RecordId, fields: &RecordFields) -> Result<(), StoreError> {
        let res = self
            .request(Method::PATCH, self.document_url(id)?)
            .json(fields)
            .send()
            .await?;
        ensure_success(res, Some(id)).await?;
        Ok(())
    }

    async fn remove(&self, id: &RecordId) -> Result<(), StoreError> {
        let res = self
            .request(Method::DELETE, self.document_url(id)?)
            .send()
            .await?;
        match ensure_success(res, Some(id)).await {
            Ok(_) => Ok(()),
            Err(StoreError::NotFound { .. }) => {
                debug!(record_id = %id, "remote record already absent");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
