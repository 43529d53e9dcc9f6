//! Normalized fetch forwarding.
//!
//! Callers get a `{success, status, data, error}` outcome whatever happens;
//! a network-level failure is reported with status 0 rather than an `Err`.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Options for a forwarded request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchOptions {
    /// HTTP method; empty means GET.
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Normalized result of a forwarded request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub success: bool,
    pub status: u16,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl FetchOutcome {
    fn network_error(message: String) -> Self {
        Self {
            success: false,
            status: 0,
            data: None,
            error: Some(format!("Network error: {message}")),
        }
    }
}

pub(crate) async fn run_fetch(
    client: &reqwest::Client,
    url: &str,
    options: FetchOptions,
) -> FetchOutcome {
    let method = if options.method.is_empty() {
        reqwest::Method::GET
    } else {
        match reqwest::Method::from_bytes(options.method.to_uppercase().as_bytes()) {
            Ok(method) => method,
            Err(_) => {
                return FetchOutcome::network_error(format!(
                    "invalid method: {}",
                    options.method
                ));
            }
        }
    };

    let mut request = client.request(method, url);
    for (name, value) in &options.headers {
        request = request.header(name, value);
    }
    if let Some(body) = options.body {
        request = request.body(body);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(err) => return FetchOutcome::network_error(err.to_string()),
    };

    let status = response.status().as_u16();
    let success = response.status().is_success();
    // Some responses legitimately carry no JSON body.
    let data: Option<serde_json::Value> = response.json().await.ok();

    let error = if success {
        None
    } else {
        let detail = data
            .as_ref()
            .and_then(|d| d.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error");
        debug!(status, "forwarded request failed");
        Some(format!("API error: {status} - {detail}"))
    };

    FetchOutcome {
        success,
        status,
        data,
        error,
    }
}
