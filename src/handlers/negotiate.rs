//! Content negotiation for API responses
//!
//! The `Accept` header picks one of a small set of serializers. Anything
//! unsupported or absent falls back to JSON.

use serde::Serialize;
use serde_json::Value;
use warp::http::header::CONTENT_TYPE;
use warp::http::{HeaderValue, StatusCode};
use warp::hyper::Body;
use warp::reply::Response;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Json,
    PlainText,
}

impl MediaType {
    /// First supported media range in the header, JSON otherwise
    pub fn from_accept(accept: Option<&str>) -> Self {
        let accept = match accept {
            Some(value) => value,
            None => return MediaType::Json,
        };

        for range in accept.split(',') {
            let essence = range.split(';').next().unwrap_or("").trim().to_lowercase();
            match essence.as_str() {
                "application/json" | "application/*" | "*/*" => return MediaType::Json,
                "text/plain" | "text/*" => return MediaType::PlainText,
                _ => continue,
            }
        }

        MediaType::Json
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            MediaType::Json => "application/json",
            MediaType::PlainText => "text/plain; charset=utf-8",
        }
    }

    /// Serialize `body` into a response with this media type
    pub fn render<T: Serialize>(&self, body: &T, status: StatusCode) -> Response {
        let encoded = match self {
            MediaType::Json => serde_json::to_string(body),
            MediaType::PlainText => serde_json::to_value(body).map(|value| plain_text(&value)),
        };

        match encoded {
            Ok(text) => {
                let mut response = Response::new(Body::from(text));
                *response.status_mut() = status;
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(self.content_type()));
                response
            }
            Err(e) => {
                log::error!("Failed to serialize response body: {}", e);
                let mut response = Response::new(Body::from("Internal Server Error"));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}

/// One `key: value` line per top-level field
fn plain_text(value: &Value) -> String {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| format!("{}: {}", key, scalar(value)))
            .collect::<Vec<_>>()
            .join("\n"),
        other => scalar(other),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
