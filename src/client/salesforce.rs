//! Salesforce REST client
//!
//! Provides [`SalesforceClient`], an authenticated handle to one org's REST API,
//! and the [`Connection`] trait the record extractor is written against.

use super::Session;
use eyre::{Context, Result, eyre};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use url::Url;

/// A live, authenticated connection to the remote service
pub trait Connection: Send + Sync {
    /// List every field name of an entity, in the order the service reports them
    fn describe(&self, entity: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Execute a SOQL query and return the first batch of results
    fn query(&self, soql: &str) -> impl Future<Output = Result<QueryResponse>> + Send;
}

/// Body of a `query` response
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub total_size: u64,
    #[serde(default = "default_done")]
    pub done: bool,
    #[serde(default)]
    pub records: Vec<Value>,
    #[serde(default)]
    pub next_records_url: Option<String>,
}

fn default_done() -> bool {
    true
}

impl QueryResponse {
    pub fn with_records(records: Vec<Value>) -> Self {
        Self {
            total_size: records.len() as u64,
            done: true,
            records,
            next_records_url: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DescribeResponse {
    fields: Vec<FieldDescribe>,
}

#[derive(Debug, Deserialize)]
struct FieldDescribe {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiError {
    message: String,
    #[serde(default)]
    error_code: Option<String>,
}

/// Authenticated Salesforce REST client
#[derive(Clone, Debug)]
pub struct SalesforceClient {
    client: Client,
    session: Session,
}

impl SalesforceClient {
    /// Build a client that sends the session id as a bearer token
    pub fn try_new(session: Session) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", session.session_id).parse()?,
        );
        headers.insert(reqwest::header::ACCEPT, "application/json".parse()?);
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { client, session })
    }

    /// Get the org instance URL.
    pub fn instance_url(&self) -> &Url {
        &self.session.instance_url
    }

    pub fn api_version(&self) -> &str {
        &self.session.api_version
    }

    /// Build the URL for a path under `/services/data/v<version>/`
    fn data_url(&self, path: &str) -> Result<Url> {
        let path = path.strip_prefix('/').unwrap_or(path);
        let full = format!("/services/data/v{}/{}", self.session.api_version, path);
        self.session
            .instance_url
            .join(&full)
            .with_context(|| format!("Invalid API path: {}", full))
    }

    /// Send a request and decode a JSON body, surfacing API error payloads
    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.data_url(path)?;
        log::trace!("{} {}", method, url);

        let response = self
            .client
            .request(method, url)
            .query(query)
            .send()
            .await
            .map_err(|e| eyre!("Failed to send request: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| "Failed to read response body")?;

        if !status.is_success() {
            eyre::bail!("{} ({})", api_error_message(&body), status);
        }

        serde_json::from_str(&body).with_context(|| format!("Unexpected response: {}", body))
    }
}

impl Connection for SalesforceClient {
    async fn describe(&self, entity: &str) -> Result<Vec<String>> {
        let path = format!("sobjects/{}/describe/", entity);
        let response: DescribeResponse = self.request(Method::GET, &path, &[]).await?;
        Ok(response.fields.into_iter().map(|f| f.name).collect())
    }

    async fn query(&self, soql: &str) -> Result<QueryResponse> {
        self.request(Method::GET, "query/", &[("q", soql)]).await
    }
}

impl std::fmt::Display for SalesforceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (v{})", self.session.instance_url, self.session.api_version)
    }
}

/// Flatten a REST error payload (`[{"message": ..., "errorCode": ...}]`)
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<Vec<ApiError>>(body) {
        Ok(errors) if !errors.is_empty() => errors
            .into_iter()
            .map(|e| match e.error_code {
                Some(code) => format!("{}: {}", code, e.message),
                None => e.message,
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => body.to_string(),
    }
}
