//! Typed responses for the IP Sonar operations.
//!
//! Each parse function drains the raw response body and, when the response
//! carries a JSON content type, decodes it into the field matching the status
//! code. The set of recognised status codes differs per operation and follows
//! the API contract:
//!
//! | Operation    | Decoded statuses          |
//! |--------------|---------------------------|
//! | lookup       | 200, 401, 404, 422, 429   |
//! | lookup-my    | 200, 401, 404, 429, 500   |
//! | batch lookup | 200, 401, 422, 429, 500   |
//!
//! Any other status leaves every typed field unset; the raw body and status
//! remain available. A non-success status is never an error at this layer.

use crate::client::{Client, ClientOption};
use crate::types::*;
use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Body, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;

/// Status line and headers of a response whose body has been read
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl ResponseHead {
    fn is_json(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(false, |ct| ct.contains("json"))
    }
}

macro_rules! typed_response {
    ($(#[$meta:meta])* $name:ident { $($field:ident: $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            /// Raw response body
            pub body: Bytes,
            pub http_response: ResponseHead,
            $(pub $field: Option<$ty>,)*
        }

        impl $name {
            fn empty(http_response: ResponseHead, body: Bytes) -> Self {
                Self {
                    body,
                    http_response,
                    $($field: None,)*
                }
            }

            /// Numeric HTTP status code
            pub fn status_code(&self) -> u16 {
                self.http_response.status.as_u16()
            }

            /// Status line text, e.g. `200 OK`
            pub fn status(&self) -> String {
                let status = self.http_response.status;
                match status.canonical_reason() {
                    Some(reason) => format!("{} {}", status.as_u16(), reason),
                    None => status.as_u16().to_string(),
                }
            }

            pub fn headers(&self) -> &HeaderMap {
                &self.http_response.headers
            }
        }
    };
}

typed_response!(
    /// Result of a single IP lookup
    LookupResponse {
        json200: IpGeolocation,
        json401: ErrorResponse,
        json404: ErrorResponse,
        json422: ErrorResponse,
        json429: ErrorResponse,
    }
);

typed_response!(
    /// Result of looking up the caller's own IP
    LookupMyResponse {
        json200: IpGeolocation,
        json401: ErrorResponse,
        json404: ErrorResponse,
        json429: ErrorResponse,
        json500: ErrorResponse,
    }
);

typed_response!(
    /// Result of a batch lookup
    BatchLookupResponse {
        json200: BatchLookupIpResponse,
        json401: ErrorResponse,
        json422: ErrorResponse,
        json429: ErrorResponse,
        json500: ErrorResponse,
    }
);

async fn read_response(response: Response) -> IpSonarResult<(ResponseHead, Bytes)> {
    let head = ResponseHead {
        status: response.status(),
        headers: response.headers().clone(),
    };
    let body = response.bytes().await.map_err(|source| {
        log::error!("failed to read response body: {}", source);
        IpSonarError::BodyRead { source }
    })?;
    tracing::debug!(status = %head.status, bytes = body.len(), "read response body");
    Ok((head, body))
}

fn decode<T: DeserializeOwned>(head: &ResponseHead, body: &Bytes) -> IpSonarResult<Option<T>> {
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| IpSonarError::parse_error(head.status.as_u16(), body, e))
}

/// Read and decode the response of a single IP lookup
pub async fn parse_lookup_response(response: Response) -> IpSonarResult<LookupResponse> {
    let (head, body) = read_response(response).await?;
    let mut parsed = LookupResponse::empty(head, body);
    let head = &parsed.http_response;
    if head.is_json() {
        match head.status.as_u16() {
            200 => parsed.json200 = decode(head, &parsed.body)?,
            401 => parsed.json401 = decode(head, &parsed.body)?,
            404 => parsed.json404 = decode(head, &parsed.body)?,
            422 => parsed.json422 = decode(head, &parsed.body)?,
            429 => parsed.json429 = decode(head, &parsed.body)?,
            _ => {}
        }
    }
    Ok(parsed)
}

/// Read and decode the response of a lookup of the caller's own IP
pub async fn parse_lookup_my_response(response: Response) -> IpSonarResult<LookupMyResponse> {
    let (head, body) = read_response(response).await?;
    let mut parsed = LookupMyResponse::empty(head, body);
    let head = &parsed.http_response;
    if head.is_json() {
        match head.status.as_u16() {
            200 => parsed.json200 = decode(head, &parsed.body)?,
            401 => parsed.json401 = decode(head, &parsed.body)?,
            404 => parsed.json404 = decode(head, &parsed.body)?,
            429 => parsed.json429 = decode(head, &parsed.body)?,
            500 => parsed.json500 = decode(head, &parsed.body)?,
            _ => {}
        }
    }
    Ok(parsed)
}

/// Read and decode the response of a batch lookup
pub async fn parse_batch_lookup_response(response: Response) -> IpSonarResult<BatchLookupResponse> {
    let (head, body) = read_response(response).await?;
    let mut parsed = BatchLookupResponse::empty(head, body);
    let head = &parsed.http_response;
    if head.is_json() {
        match head.status.as_u16() {
            200 => parsed.json200 = decode(head, &parsed.body)?,
            401 => parsed.json401 = decode(head, &parsed.body)?,
            422 => parsed.json422 = decode(head, &parsed.body)?,
            429 => parsed.json429 = decode(head, &parsed.body)?,
            500 => parsed.json500 = decode(head, &parsed.body)?,
            _ => {}
        }
    }
    Ok(parsed)
}

/// Client that decodes every response into its typed form
#[derive(Debug, Clone)]
pub struct ClientWithResponses {
    client: Client,
}

impl From<Client> for ClientWithResponses {
    fn from(client: Client) -> Self {
        Self { client }
    }
}

impl ClientWithResponses {
    /// Create a client for `server`; see [`Client::new`]
    pub fn new(
        server: impl Into<String>,
        options: impl IntoIterator<Item = ClientOption>,
    ) -> IpSonarResult<Self> {
        Client::new(server, options).map(Self::from)
    }

    /// The wrapped low-level client
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn lookup_with_response(
        &self,
        ip: impl fmt::Display,
        params: Option<&LookupParams>,
    ) -> IpSonarResult<LookupResponse> {
        let response = self.client.lookup(ip, params).await?;
        parse_lookup_response(response).await
    }

    pub async fn lookup_my_with_response(
        &self,
        params: Option<&LookupMyParams>,
    ) -> IpSonarResult<LookupMyResponse> {
        let response = self.client.lookup_my(params).await?;
        parse_lookup_my_response(response).await
    }

    pub async fn batch_lookup_with_response(
        &self,
        params: Option<&BatchLookupParams>,
        body: &BatchLookupJsonRequestBody,
    ) -> IpSonarResult<BatchLookupResponse> {
        let response = self.client.batch_lookup(params, body).await?;
        parse_batch_lookup_response(response).await
    }

    pub async fn batch_lookup_with_body_with_response(
        &self,
        params: Option<&BatchLookupParams>,
        content_type: &str,
        body: impl Into<Body>,
    ) -> IpSonarResult<BatchLookupResponse> {
        let response = self.client.batch_lookup_with_body(params, content_type, body).await?;
        parse_batch_lookup_response(response).await
    }
}
