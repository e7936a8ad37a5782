//! Request descriptors.
//!
//! An [`ApiRequest`] captures everything needed for one ZAPI call. It is built
//! fresh for every call and discarded once the call completes.

use crate::Result;
use reqwest::Method;
use serde::Serialize;
use url::Url;

/// Content type sent with JSON request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A single ZAPI call described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute request URL
    pub url: Url,
    /// Serialized request body
    pub body: Option<String>,
    /// Content type, only present alongside a body
    pub content_type: Option<&'static str>,
}

impl ApiRequest {
    /// Create a request without a body.
    #[must_use]
    pub const fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            body: None,
            content_type: None,
        }
    }

    /// Attach a JSON body.
    ///
    /// `<`, `>` and `&` are written literally; the appliance stores field values
    /// verbatim and does not undo HTML escaping.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ParseError`] if `body` cannot be serialized.
    pub fn with_json<B>(mut self, body: &B) -> Result<Self>
    where
        B: Serialize + ?Sized,
    {
        self.body = Some(encode_json(body)?);
        self.content_type = Some(JSON_CONTENT_TYPE);
        Ok(self)
    }

    /// Returns the request path below the host, for logging.
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// Serialize a request body the way the appliance expects it.
///
/// # Errors
///
/// Returns [`crate::Error::ParseError`] if `body` cannot be serialized.
pub fn encode_json<B>(body: &B) -> Result<String>
where
    B: Serialize + ?Sized,
{
    let mut encoded = serde_json::to_string(body)?;
    if encoded.ends_with('\n') {
        encoded.pop();
    }
    Ok(encoded)
}
