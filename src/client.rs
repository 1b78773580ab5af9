// Core Client Implementation

use crate::middleware::RequestEditor;
use crate::types::*;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Body, Method, Request, Response};
use std::fmt;
use std::sync::Arc;
use url::Url;

const LOOKUP_PATH: &str = "v1/lookup/";
const LOOKUP_MY_PATH: &str = "v1/lookup/me";
const BATCH_LOOKUP_PATH: &str = "v1/lookup/batch";

/// Executes a prepared HTTP request.
///
/// This is the only thing the client needs from an HTTP stack, so tests can
/// swap in a double that returns canned responses or errors. Implementations
/// must not retry or interpret status codes.
#[async_trait]
pub trait HttpRequestDoer: Send + Sync {
    async fn execute(&self, request: Request) -> IpSonarResult<Response>;
}

#[async_trait]
impl HttpRequestDoer for reqwest::Client {
    async fn execute(&self, request: Request) -> IpSonarResult<Response> {
        reqwest::Client::execute(self, request).await.map_err(IpSonarError::from)
    }
}

/// Mutable state the [`ClientOption`]s operate on
pub struct ClientConfig {
    pub server: String,
    pub http_client: Option<Arc<dyn HttpRequestDoer>>,
    pub request_editors: Vec<Arc<dyn RequestEditor>>,
}

/// A configuration step applied by [`Client::new`], in order
pub type ClientOption = Box<dyn FnOnce(&mut ClientConfig) -> IpSonarResult<()> + Send>;

/// Use a custom transport instead of the default `reqwest::Client`
pub fn with_http_client(doer: impl HttpRequestDoer + 'static) -> ClientOption {
    Box::new(move |config: &mut ClientConfig| {
        config.http_client = Some(Arc::new(doer));
        Ok(())
    })
}

/// Override the server URL passed to [`Client::new`]
pub fn with_base_url(base_url: impl Into<String>) -> ClientOption {
    let base_url = base_url.into();
    Box::new(move |config: &mut ClientConfig| {
        parse_server(&base_url)?;
        config.server = base_url;
        Ok(())
    })
}

/// Register a hook that runs on every request before it is sent
pub fn with_request_editor_fn(editor: impl RequestEditor + 'static) -> ClientOption {
    Box::new(move |config: &mut ClientConfig| {
        config.request_editors.push(Arc::new(editor));
        Ok(())
    })
}

/// Low-level IP Sonar client.
///
/// Every operation returns the raw `reqwest::Response`; see
/// [`crate::ClientWithResponses`] for decoded results. A non-success status
/// is not an error here. The client is cheap to clone and can be shared
/// across tasks.
#[derive(Clone)]
pub struct Client {
    server: String,
    base_url: Url,
    pub(crate) http_client: Arc<dyn HttpRequestDoer>,
    pub(crate) request_editors: Vec<Arc<dyn RequestEditor>>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("server", &self.server)
            .field("request_editors", &self.request_editors.len())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client for `server`, applying `options` in order.
    ///
    /// The server URL always ends up with exactly one trailing `/` added
    /// when it is missing.
    pub fn new(
        server: impl Into<String>,
        options: impl IntoIterator<Item = ClientOption>,
    ) -> IpSonarResult<Self> {
        let mut config = ClientConfig {
            server: server.into(),
            http_client: None,
            request_editors: Vec::new(),
        };
        for option in options {
            option(&mut config)?;
        }

        let server = normalize_server(config.server);
        let base_url = parse_server(&server)?;

        let http_client = match config.http_client {
            Some(doer) => doer,
            None => Arc::new(reqwest::Client::builder().build()?),
        };

        Ok(Self {
            server,
            base_url,
            http_client,
            request_editors: config.request_editors,
        })
    }

    /// The effective server URL, always ending in `/`
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Add an editor after construction
    pub fn with_request_editor(mut self, editor: impl RequestEditor + 'static) -> Self {
        self.request_editors.push(Arc::new(editor));
        self
    }

    /// Build the request for a single IP lookup without sending it
    pub fn build_lookup_request(
        &self,
        ip: impl fmt::Display,
        params: Option<&LookupParams>,
    ) -> IpSonarResult<Request> {
        let ip = ip.to_string();
        // The url crate drops "." and ".." segments, which would retarget the request
        if matches!(ip.as_str(), "" | "." | "..") {
            return Err(IpSonarError::InvalidParameter(format!("{:?} is not a valid IP path segment", ip)));
        }

        let mut url = self.endpoint(LOOKUP_PATH)?;
        url.path_segments_mut()
            .map_err(|_| IpSonarError::invalid_server_url(&self.server, "cannot append path", None))?
            .pop_if_empty()
            .push(&ip);
        append_query(&mut url, params.map(LookupParams::query_pairs));
        Ok(Request::new(Method::GET, url))
    }

    /// Build the request for looking up the caller's own IP without sending it
    pub fn build_lookup_my_request(&self, params: Option<&LookupMyParams>) -> IpSonarResult<Request> {
        let mut url = self.endpoint(LOOKUP_MY_PATH)?;
        append_query(&mut url, params.map(LookupMyParams::query_pairs));
        Ok(Request::new(Method::GET, url))
    }

    /// Build a batch lookup request with a JSON body without sending it
    pub fn build_batch_lookup_request(
        &self,
        params: Option<&BatchLookupParams>,
        body: &BatchLookupJsonRequestBody,
    ) -> IpSonarResult<Request> {
        let json = serde_json::to_vec(body).map_err(|source| IpSonarError::Serialization { source })?;
        self.build_batch_lookup_request_with_body(params, "application/json", json)
    }

    /// Build a batch lookup request with a caller-encoded body
    pub fn build_batch_lookup_request_with_body(
        &self,
        params: Option<&BatchLookupParams>,
        content_type: &str,
        body: impl Into<Body>,
    ) -> IpSonarResult<Request> {
        let mut url = self.endpoint(BATCH_LOOKUP_PATH)?;
        append_query(&mut url, params.map(BatchLookupParams::query_pairs));

        let content_type = HeaderValue::from_str(content_type).map_err(|e| {
            IpSonarError::request_error(format!("invalid content type {:?}", content_type), Some(Box::new(e) as BoxError))
        })?;

        let mut request = Request::new(Method::POST, url);
        request.headers_mut().insert(CONTENT_TYPE, content_type);
        *request.body_mut() = Some(body.into());
        Ok(request)
    }

    /// Look up geolocation data for `ip`
    pub async fn lookup(&self, ip: impl fmt::Display, params: Option<&LookupParams>) -> IpSonarResult<Response> {
        let request = self.build_lookup_request(ip, params)?;
        self.send(request).await
    }

    /// Look up geolocation data for the IP the server sees the call from
    pub async fn lookup_my(&self, params: Option<&LookupMyParams>) -> IpSonarResult<Response> {
        let request = self.build_lookup_my_request(params)?;
        self.send(request).await
    }

    /// Look up several IPs in one request
    pub async fn batch_lookup(
        &self,
        params: Option<&BatchLookupParams>,
        body: &BatchLookupJsonRequestBody,
    ) -> IpSonarResult<Response> {
        let request = self.build_batch_lookup_request(params, body)?;
        self.send(request).await
    }

    /// Batch lookup with a body the caller has already encoded
    pub async fn batch_lookup_with_body(
        &self,
        params: Option<&BatchLookupParams>,
        content_type: &str,
        body: impl Into<Body>,
    ) -> IpSonarResult<Response> {
        let request = self.build_batch_lookup_request_with_body(params, content_type, body)?;
        self.send(request).await
    }

    /// Run the request editors, then hand the request to the transport
    pub async fn send(&self, mut request: Request) -> IpSonarResult<Response> {
        for editor in &self.request_editors {
            editor.edit_request(&mut request).await?;
        }

        tracing::debug!(method = %request.method(), url = %request.url(), "sending request");
        let response = self.http_client.execute(request).await?;
        tracing::debug!(status = %response.status(), "received response");
        Ok(response)
    }

    fn endpoint(&self, path: &str) -> IpSonarResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| IpSonarError::invalid_server_url(&self.server, format!("cannot join {:?}", path), Some(e)))
    }
}

fn normalize_server(mut server: String) -> String {
    if !server.ends_with('/') {
        server.push('/');
    }
    server
}

fn parse_server(server: &str) -> IpSonarResult<Url> {
    let url = Url::parse(server)
        .map_err(|e| IpSonarError::invalid_server_url(server, e.to_string(), Some(e)))?;
    if url.cannot_be_a_base() {
        return Err(IpSonarError::invalid_server_url(server, "URL cannot be used as a base", None));
    }
    Ok(url)
}

fn append_query(url: &mut Url, pairs: Option<Vec<(&'static str, &str)>>) {
    let pairs = match pairs {
        Some(pairs) if !pairs.is_empty() => pairs,
        _ => return,
    };
    let mut query = url.query_pairs_mut();
    for (key, value) in pairs {
        query.append_pair(key, value);
    }
}
