//! Grepable error codes shared by service errors.

/// Implemented by service errors that surface to clients. Codes are stable
/// `E_*` strings suitable for log searches and client-side matching.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}
