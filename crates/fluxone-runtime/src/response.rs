//! Response helpers, registered as the `response` utility.

use fluxone_core::{FluxError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Utility name in the container (`util.response`).
pub const RESPONSE_UTIL: &str = "response";

/// Helpers for responses coming back from the API.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseUtils;

impl ResponseUtils {
    /// Parse a JSON body. Anything but a 200 status is rejected.
    pub fn parse_json(&self, status: u16, body: &str) -> Result<Value> {
        self.parse_json_as(status, body)
    }

    /// [`ResponseUtils::parse_json`] into a concrete type.
    pub fn parse_json_as<T>(&self, status: u16, body: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if status != 200 {
            return Err(FluxError::InvalidArgument("Bad response from server".into()));
        }
        serde_json::from_str(body)
            .map_err(|e| FluxError::InvalidArgument(format!("Malformed response body: {e}")))
    }
}
