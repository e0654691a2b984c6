use reqwest::{Client, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
    Retryable, RetryableStrategy, RetryTransientMiddleware, default_on_request_failure,
    default_on_request_success, policies::ExponentialBackoff,
};
use std::time::Duration;

/// Retries 5xx and connection failures but hands 429 straight back, so every
/// upstream hit goes through the provider's rate limiter.
pub struct RateLimitAwareStrategy;

impl RetryableStrategy for RateLimitAwareStrategy {
    fn handle(
        &self,
        res: &Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                Some(Retryable::Fatal)
            }
            Ok(response) => default_on_request_success(response),
            Err(error) => default_on_request_failure(error),
        }
    }
}

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates a new HTTP client with retry middleware
    pub fn create_client() -> ClientWithMiddleware {
        Self::create_client_with_timeout(Duration::from_secs(30))
    }

    /// Aggregate queries over two years of bars can be slow on the free tier,
    /// so providers may ask for a longer request timeout.
    pub fn create_client_with_timeout(timeout: Duration) -> ClientWithMiddleware {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("stockcast/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                RateLimitAwareStrategy,
            ))
            .build()
    }
}

/// Builds a URL with percent-encoded query parameters.
/// `ClientWithMiddleware` has no `.query()`, so the string is assembled here.
pub fn build_url_with_query<K, V>(base_url: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        return base_url.to_string();
    }

    let query_string: String = params
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k.as_ref()), encode_component(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&");

    if base_url.contains('?') {
        format!("{}&{}", base_url, query_string)
    } else {
        format!("{}?{}", base_url, query_string)
    }
}

fn encode_component(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_appended() {
        let url = build_url_with_query(
            "https://api.polygon.io/v2/aggs/ticker/AAPL/range/1/day/2024-01-01/2025-01-01",
            &[("adjusted", "true"), ("sort", "asc"), ("limit", "5000")],
        );
        assert!(url.ends_with("/2025-01-01?adjusted=true&sort=asc&limit=5000"));
    }

    #[test]
    fn test_existing_query_is_extended() {
        let url = build_url_with_query("https://host/path?a=1", &[("b", "2")]);
        assert_eq!(url, "https://host/path?a=1&b=2");
    }

    #[test]
    fn test_values_are_encoded() {
        let url = build_url_with_query("https://host", &[("apiKey", "a b&c/é")]);
        assert_eq!(url, "https://host?apiKey=a%20b%26c%2F%C3%A9");
    }

    #[test]
    fn test_no_params() {
        let params: [(&str, &str); 0] = [];
        assert_eq!(build_url_with_query("https://host", &params), "https://host");
    }
}
