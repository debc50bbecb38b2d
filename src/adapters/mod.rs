//! Concrete [`crate::adapter::AdapterContract`] implementors.
//!
//! Each is a thin `reqwest`-based struct: a client, a credential, and a
//! `parse_results` free function over the provider's JSON shape. They
//! share nothing beyond the two helpers already exposed by
//! [`crate::adapter`] (`map_http_status`, `parse_retry_after_seconds`) and
//! the cache-key helper in [`crate::cache`] — adapters are siblings, not
//! a hierarchy.

pub mod brave;
pub mod github;
pub mod stackexchange;
pub mod tavily;
pub mod wikipedia;

pub use brave::BraveAdapter;
pub use github::GithubAdapter;
pub use stackexchange::StackExchangeAdapter;
pub use tavily::TavilyAdapter;
pub use wikipedia::WikipediaAdapter;

use reqwest::Response;
use std::time::Duration;

/// Pull `Retry-After` off a response, if present and well-formed.
pub(crate) fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(crate::adapter::parse_retry_after_seconds)
}

/// Percent-encode a query string for use in a URL's query component. The
/// crate's only other URL-handling dependency, `url::Url`, is reserved for
/// *parsing* (validating `SearchResult.url`), not query construction.
pub(crate) fn url_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            b' ' => encoded.push_str("%20"),
            _ => {
                use std::fmt::Write as _;
                let _ = write!(encoded, "%{byte:02X}");
            }
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encode_leaves_unreserved_untouched() {
        assert_eq!(url_encode("rust-async_2024.0~x"), "rust-async_2024.0~x");
    }

    #[test]
    fn url_encode_escapes_space_and_special_chars() {
        assert_eq!(url_encode("rust async"), "rust%20async");
        assert_eq!(url_encode("a&b=c"), "a%26b%3Dc");
    }
}
