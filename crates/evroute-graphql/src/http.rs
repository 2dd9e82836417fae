//! Queries and mutations over HTTP POST

use crate::config::GraphqlConfig;
use crate::error::GraphqlError;
use crate::protocol::{GraphqlRequest, GraphqlResponse};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, instrument};

const MAX_ERROR_BODY: usize = 512;

/// HTTP side of the client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    /// Build a client that sends the configured headers on every request
    ///
    /// # Errors
    /// `GraphqlError::Config` if a header value is not valid,
    /// `GraphqlError::Http` if the client cannot be built
    pub fn new(config: &GraphqlConfig) -> Result<Self, GraphqlError> {
        let mut headers = HeaderMap::new();
        for (name, value) in config.auth_headers() {
            let value = HeaderValue::from_str(&value)
                .map_err(|_| GraphqlError::Config(format!("invalid value for header {name}")))?;
            headers.insert(HeaderName::from_static(name), value);
        }
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            url: config.http_url.clone(),
        })
    }

    /// Run one operation and return its `data`
    ///
    /// # Errors
    /// - `GraphqlError::Http` on network failure
    /// - `GraphqlError::Status` on a non-success status
    /// - `GraphqlError::Graphql` if the response lists errors
    /// - `GraphqlError::MalformedResponse` if `data` is missing
    #[instrument(skip_all, fields(operation = request.operation_name.as_deref().unwrap_or("anonymous")))]
    pub async fn execute(&self, request: &GraphqlRequest) -> Result<Value, GraphqlError> {
        let response = self.client.post(&self.url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(GraphqlError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: GraphqlResponse = response.json().await?;
        debug!(errors = body.errors.len(), "http response");
        into_data(body)
    }
}

/// `data` of a response, or its errors
pub(crate) fn into_data(response: GraphqlResponse) -> Result<Value, GraphqlError> {
    if !response.errors.is_empty() {
        return Err(GraphqlError::Graphql(response.error_messages()));
    }
    match response.data {
        Some(Value::Null) | None => Err(GraphqlError::MalformedResponse(
            "response has no data".into(),
        )),
        Some(data) => Ok(data),
    }
}
