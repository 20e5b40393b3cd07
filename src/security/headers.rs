//! Security headers for HTTP responses
//!
//! Every response of the session API goes through `with_security_headers`.

use warp::http::HeaderValue;
use warp::reply::Response;
use warp::Reply;

/// Strict Content Security Policy for API endpoints
const STRICT_CSP: &str = "default-src 'none'; frame-ancestors 'none';";

/// Add security headers to a response
pub fn add_security_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();

    // Prevent clickjacking
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));

    // Prevent MIME type sniffing
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));

    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));
    headers.insert("Content-Security-Policy", HeaderValue::from_static(STRICT_CSP));

    // Bodies may carry bearer tokens
    headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    headers.insert("Pragma", HeaderValue::from_static("no-cache"));

    // Remove server information disclosure
    headers.remove("Server");

    response
}

/// Wrap any reply with the security headers
pub fn with_security_headers<T: Reply>(reply: T) -> Response {
    add_security_headers(reply.into_response())
}
