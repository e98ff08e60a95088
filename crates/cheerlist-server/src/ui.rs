//! Browser UI, embedded at compile time.

/// The single page served at `/`.
pub const INDEX_HTML: &str = include_str!("../assets/index.html");
