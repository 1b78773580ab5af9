//! # ipsonar: Rust client for the IP Sonar geolocation API
//!
//! Look up country, city, coordinates, timezone and EU membership for an IP
//! address, for the caller's own address, or for a batch of addresses.
//!
//! ## Key Features
//!
//! - [`Client`] builds requests and returns raw `reqwest` responses
//! - [`ClientWithResponses`] decodes responses into status-keyed typed fields
//! - Pluggable transport through [`HttpRequestDoer`]
//! - Request editors for headers such as the API key
//!
//! ## Basic Usage
//!
//! ```no_run
//! use ipsonar::{ClientWithResponses, LookupParams, API_SERVER, with_request_editor_fn, ApiKeyEditor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientWithResponses::new(
//!         API_SERVER,
//!         vec![with_request_editor_fn(ApiKeyEditor::new("your-api-key"))],
//!     )?;
//!
//!     let params = LookupParams::new().with_fields(["ip", "country_code", "city_name"]);
//!     let response = client.lookup_with_response("8.8.8.8", Some(&params)).await?;
//!
//!     if let Some(geo) = &response.json200 {
//!         println!("{:?} is in {:?}", geo.ip, geo.country_code);
//!     } else {
//!         println!("lookup failed: {}", response.status());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Calls have no built-in timeout. Wrap a call in `tokio::time::timeout`, or
//! set one per request from an editor with `reqwest::Request::timeout_mut`.

pub mod types;
pub mod client;
pub mod responses;
mod middleware;

pub use client::{
    with_base_url, with_http_client, with_request_editor_fn, Client, ClientConfig, ClientOption,
    HttpRequestDoer,
};
pub use middleware::{ApiKeyEditor, RequestEditor};
pub use responses::{
    parse_batch_lookup_response, parse_lookup_my_response, parse_lookup_response,
    BatchLookupResponse, ClientWithResponses, LookupMyResponse, LookupResponse, ResponseHead,
};
pub use types::{
    ApiKey, BatchLookupIpResponse, BatchLookupJsonRequestBody, BatchLookupParams,
    BatchLookupRequestBody, BoxError, ErrorResponse, IpGeolocation, IpSonarError, IpSonarResult,
    LookupMyParams, LookupParams, API_KEY_ENV_VAR, API_KEY_HEADER, API_SERVER,
};

pub mod prelude {
    //! Convenient imports for commonly used types and functions
    pub use crate::{
        from_env, from_env_with, with_base_url, with_http_client, with_request_editor_fn, ApiKeyEditor, Client,
        ClientWithResponses, IpGeolocation, IpSonarError, IpSonarResult, LookupMyParams,
        LookupParams, BatchLookupParams, BatchLookupRequestBody, API_SERVER,
    };
}

/// Create a typed client for [`API_SERVER`] using the key in `IPSONAR_API_KEY`.
///
/// When the variable is unset or empty, requests are sent without a key.
pub fn from_env() -> IpSonarResult<ClientWithResponses> {
    from_env_with(Vec::new())
}

/// Like [`from_env`], applying `options` before the API key editor is added
pub fn from_env_with(options: impl IntoIterator<Item = ClientOption>) -> IpSonarResult<ClientWithResponses> {
    let mut options: Vec<ClientOption> = options.into_iter().collect();
    match std::env::var(API_KEY_ENV_VAR) {
        Ok(key) if !key.is_empty() => options.push(with_request_editor_fn(ApiKeyEditor::new(key))),
        _ => log::debug!("{} not set, sending requests without an API key", API_KEY_ENV_VAR),
    }
    ClientWithResponses::new(API_SERVER, options)
}
