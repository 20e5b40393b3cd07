//! Security utilities and middleware

pub mod headers;
pub mod timing;

pub use headers::{add_security_headers, with_security_headers};
pub use timing::{constant_time_eq, AuthTimer};
