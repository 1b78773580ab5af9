// Core types and errors

use serde::{Deserialize, Serialize};
use thiserror::Error;
use std::fmt;

/// Default IP Sonar API server
pub const API_SERVER: &str = "https://api.ip-sonar.com/";

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Environment variable read by [`crate::from_env`]
pub const API_KEY_ENV_VAR: &str = "IPSONAR_API_KEY";

/// The result type used throughout the IP Sonar SDK
pub type IpSonarResult<T> = Result<T, IpSonarError>;

/// Boxed error used for transport failures coming from arbitrary doers
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Convert reqwest::Error to our IpSonarError
impl From<reqwest::Error> for IpSonarError {
    fn from(err: reqwest::Error) -> Self {
        IpSonarError::RequestError {
            message: err.to_string(),
            source: Some(Box::new(err) as BoxError),
        }
    }
}

/// An API key that never shows up in logs or debug output
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    key: String,
}

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Get a reference to the underlying key
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED API KEY]")
    }
}

#[derive(Debug, Error)]
pub enum IpSonarError {
    #[error("Invalid server URL {url:?}: {message}")]
    InvalidServerUrl {
        url: String,
        message: String,
        #[source]
        source: Option<url::ParseError>,
    },

    #[error("HTTP request failed: {message}")]
    RequestError {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Request editor failed: {0}")]
    RequestEditor(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to serialize request body: {source}")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read response body: {source}")]
    BodyRead {
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse {status} response: {message}")]
    ParseError {
        status: u16,
        message: String,
        source_text: Option<String>,
        #[source]
        source: serde_json::Error,
    },
}

impl IpSonarError {
    pub fn invalid_server_url(
        url: impl Into<String>,
        message: impl Into<String>,
        source: Option<url::ParseError>,
    ) -> Self {
        let error = Self::InvalidServerUrl {
            url: url.into(),
            message: message.into(),
            source,
        };
        log::error!("{}", error);
        error
    }

    pub fn request_error(message: impl Into<String>, source: Option<BoxError>) -> Self {
        let error = Self::RequestError {
            message: message.into(),
            source,
        };
        log::error!("{}", error);
        error
    }

    pub fn parse_error(status: u16, body: &[u8], source: serde_json::Error) -> Self {
        let error = Self::ParseError {
            status,
            message: source.to_string(),
            source_text: Some(String::from_utf8_lossy(body).into_owned()),
            source,
        };
        log::error!("{}", error);
        error
    }

    /// HTTP status of the body that failed to decode, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ParseError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Geolocation data for a single IP address.
///
/// Every field is optional. `None` means the API did not report the value,
/// which is different from `Some(String::new())`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpGeolocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continent_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    /// Accuracy radius in meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_radius: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_in_eu: Option<bool>,
    #[serde(rename = "subdivision_1_code", skip_serializing_if = "Option::is_none")]
    pub subdivision1_code: Option<String>,
    #[serde(rename = "subdivision_1_name", skip_serializing_if = "Option::is_none")]
    pub subdivision1_name: Option<String>,
    #[serde(rename = "subdivision_2_code", skip_serializing_if = "Option::is_none")]
    pub subdivision2_code: Option<String>,
    #[serde(rename = "subdivision_2_name", skip_serializing_if = "Option::is_none")]
    pub subdivision2_name: Option<String>,
}

/// Error body returned by the API for non-success statuses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: String,
}

/// Body of a batch lookup request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLookupRequestBody {
    pub data: Vec<String>,
}

impl BatchLookupRequestBody {
    pub fn new<I, S>(ips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            data: ips.into_iter().map(Into::into).collect(),
        }
    }
}

/// JSON body accepted by [`crate::Client::batch_lookup`]
pub type BatchLookupJsonRequestBody = BatchLookupRequestBody;

/// Successful batch lookup result, in request order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchLookupIpResponse {
    #[serde(default)]
    pub data: Vec<IpGeolocation>,
}

// The three operations share the same optional query parameters.
macro_rules! query_params {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            /// Comma-separated list of fields to return
            #[serde(skip_serializing_if = "Option::is_none")]
            pub fields: Option<String>,
            /// Locale for country, continent and subdivision names
            #[serde(skip_serializing_if = "Option::is_none")]
            pub locale_code: Option<String>,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            /// Restrict the response to the given fields
            pub fn with_fields<I, S>(mut self, fields: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: AsRef<str>,
            {
                let joined = fields
                    .into_iter()
                    .map(|f| f.as_ref().to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                self.fields = Some(joined);
                self
            }

            pub fn with_locale_code(mut self, locale_code: impl Into<String>) -> Self {
                self.locale_code = Some(locale_code.into());
                self
            }

            /// Query pairs for the parameters that are set
            pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
                let mut pairs = Vec::new();
                if let Some(fields) = &self.fields {
                    pairs.push(("fields", fields.as_str()));
                }
                if let Some(locale_code) = &self.locale_code {
                    pairs.push(("locale_code", locale_code.as_str()));
                }
                pairs
            }
        }
    };
}

query_params!(
    /// Query parameters for a single IP lookup
    LookupParams
);
query_params!(
    /// Query parameters for looking up the caller's own IP
    LookupMyParams
);
query_params!(
    /// Query parameters for a batch lookup
    BatchLookupParams
);
