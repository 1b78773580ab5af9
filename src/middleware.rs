// Request editors

use crate::types::*;
use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::Request;

/// Hook that may modify an outbound request before it is sent.
///
/// Editors run in registration order. The first one to return an error
/// aborts the call and the request is never dispatched.
#[async_trait]
pub trait RequestEditor: Send + Sync {
    async fn edit_request(&self, request: &mut Request) -> IpSonarResult<()>;
}

#[async_trait]
impl<F> RequestEditor for F
where
    F: Fn(&mut Request) -> IpSonarResult<()> + Send + Sync,
{
    async fn edit_request(&self, request: &mut Request) -> IpSonarResult<()> {
        self(request)
    }
}

/// Attaches the API key header to every request
#[derive(Debug, Clone)]
pub struct ApiKeyEditor {
    api_key: ApiKey,
}

impl ApiKeyEditor {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: ApiKey::new(api_key) }
    }
}

#[async_trait]
impl RequestEditor for ApiKeyEditor {
    async fn edit_request(&self, request: &mut Request) -> IpSonarResult<()> {
        let mut value = HeaderValue::from_str(self.api_key.as_str())
            .map_err(|_| IpSonarError::RequestEditor("API key is not a valid header value".into()))?;
        value.set_sensitive(true);
        request.headers_mut().insert(API_KEY_HEADER, value);
        Ok(())
    }
}
