//! Locally synthesized responses.

use crate::error::EncodingError;
use crate::routing::FaultSpec;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};

pub const SUCCESS_MESSAGE: &str = "Request processed successfully";

static APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");
static TEXT_PLAIN: HeaderValue = HeaderValue::from_static("text/plain; charset=utf-8");
static NOSNIFF: HeaderValue = HeaderValue::from_static("nosniff");

/// JSON payload of every locally answered request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: u16,
    pub service: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl Envelope {
    /// Payload of a terminal hop.
    pub fn success(service: &str) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            service: service.to_string(),
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    /// Payload of a fault that fired.
    pub fn fault(fault: &FaultSpec, service: &str) -> Self {
        let status = fault.status().as_u16();
        Self {
            status,
            service: service.to_string(),
            message: format!("Fault injected: {status} {}", fault.reason()),
        }
    }
}

/// Payload of the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

impl HealthStatus {
    pub fn healthy(service: &str) -> Self {
        Self {
            status: "healthy".to_string(),
            service: service.to_string(),
        }
    }
}

/// Serialize `payload` into a JSON response with the given status.
pub fn json_response<T: Serialize>(
    status: StatusCode,
    payload: &T,
) -> Result<Response<Full<Bytes>>, EncodingError> {
    let mut body = serde_json::to_vec(payload)?;
    body.push(b'\n');

    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, APPLICATION_JSON.clone());
    Ok(response)
}

/// Response for a terminal hop.
pub fn success_response(service: &str) -> Result<Response<Full<Bytes>>, EncodingError> {
    json_response(StatusCode::OK, &Envelope::success(service))
}

/// Response for a fault that fired.
pub fn fault_response(
    fault: &FaultSpec,
    service: &str,
) -> Result<Response<Full<Bytes>>, EncodingError> {
    json_response(fault.status(), &Envelope::fault(fault, service))
}

/// Response for the health endpoint.
pub fn health_response(service: &str) -> Result<Response<Full<Bytes>>, EncodingError> {
    json_response(StatusCode::OK, &HealthStatus::healthy(service))
}

/// Plain-text error response.
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(format!("{message}\n"))));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, TEXT_PLAIN.clone());
    headers.insert(X_CONTENT_TYPE_OPTIONS, NOSNIFF.clone());
    response
}
