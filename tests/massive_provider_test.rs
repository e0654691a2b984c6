use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stockcast::domain::errors::MarketDataError;
use stockcast::domain::ports::HistoricalDataProvider;
use stockcast::domain::types::{BarInterval, HistoryPeriod};
use stockcast::infrastructure::MassiveDataProvider;
use stockcast::infrastructure::observability::Metrics;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const TWO_BARS: &str = r#"{"status":"OK","resultsCount":2,"results":[
    {"t":1736139600000,"o":243.36,"h":245.0,"l":241.1,"c":244.31,"v":45045571},
    {"t":1736226000000,"o":242.98,"h":245.55,"l":241.35,"c":242.21,"v":40855960}]}"#;

const PREV_CLOSE: &str = r#"{"ticker":"AAPL","status":"DELAYED","resultsCount":1,"results":[
    {"T":"AAPL","t":1736226000000,"o":240.0,"h":245.55,"l":239.0,"c":246.0,"v":40855960}]}"#;

const RATE_LIMITED: &str = r#"{"status":"ERROR","error":"You've exceeded the maximum requests per minute"}"#;

/// Local upstream that answers each request with the next scripted
/// `(status, body)`, repeating the last one, and records request lines.
struct ScriptedUpstream {
    base_url: String,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedUpstream {
    async fn start(script: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let (counter, log) = (hits.clone(), requests.clone());
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = vec![0u8; 16 * 1024];
                let mut read = 0;
                while read < buf.len() {
                    match socket.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => read += n,
                    }
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                if read == 0 {
                    continue;
                }

                let head = String::from_utf8_lossy(&buf[..read]).to_string();
                let request_line = head.lines().next().unwrap_or_default().to_string();
                log.lock().unwrap().push(request_line);

                let n = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = script[n.min(script.len() - 1)];
                let reason = match status {
                    200 => "OK",
                    429 => "Too Many Requests",
                    _ => "Error",
                };
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            hits,
            requests,
        }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn provider(&self, metrics: Metrics) -> MassiveDataProvider {
        MassiveDataProvider::builder()
            .api_key("test-key".to_string())
            .base_url(self.base_url.clone())
            .max_calls_per_minute(100)
            .rate_limit_backoff(Duration::from_millis(10))
            .metrics(metrics)
            .build()
    }
}

#[tokio::test]
async fn test_successful_aggregates_are_parsed() {
    let upstream = ScriptedUpstream::start(vec![(200, TWO_BARS)]).await;
    let provider = upstream.provider(Metrics::new().unwrap());

    let bars = provider
        .get_historical_data("AAPL", HistoryPeriod::OneYear, BarInterval::Daily)
        .await
        .unwrap();

    assert_eq!(upstream.hits(), 1);
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].date, "2025-01-06 05:00:00");
    assert_eq!(bars[0].close, 244.31);
    assert_eq!(bars[1].volume, 40_855_960);

    let requests = upstream.requests.lock().unwrap().clone();
    assert!(requests[0].starts_with("GET /v2/aggs/ticker/AAPL/range/1/day/"));
}

#[tokio::test]
async fn test_rate_limited_request_is_retried_once() {
    let upstream = ScriptedUpstream::start(vec![(429, RATE_LIMITED), (200, TWO_BARS)]).await;
    let metrics = Metrics::new().unwrap();
    let provider = upstream.provider(metrics.clone());

    let bars = provider
        .get_historical_data("AAPL", HistoryPeriod::OneYear, BarInterval::Daily)
        .await
        .unwrap();

    assert_eq!(upstream.hits(), 2);
    assert_eq!(bars.len(), 2);
    let rendered = metrics.render();
    assert!(rendered.contains(
        "stockcast_provider_requests_total{provider=\"massive\",status=\"rate_limited\"} 1"
    ));
    assert!(rendered.contains("stockcast_provider_requests_total{provider=\"massive\",status=\"ok\"} 1"));
}

#[tokio::test]
async fn test_persistent_rate_limit_makes_exactly_two_requests() {
    let upstream = ScriptedUpstream::start(vec![(429, RATE_LIMITED)]).await;
    let provider = upstream.provider(Metrics::new().unwrap());

    let err = provider
        .get_historical_data("AAPL", HistoryPeriod::OneYear, BarInterval::Daily)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<MarketDataError>(),
        Some(MarketDataError::RateLimited { .. })
    ));
    // Give a stray retry time to show up
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(upstream.hits(), 2);
}

#[tokio::test]
async fn test_quote_reads_previous_close() {
    let upstream = ScriptedUpstream::start(vec![(200, PREV_CLOSE)]).await;
    let provider = upstream.provider(Metrics::new().unwrap());

    let quote = provider.get_quote("AAPL").await.unwrap().unwrap();

    assert_eq!(quote.symbol, "AAPL");
    assert_eq!(quote.current_price, 246.0);
    assert_eq!(quote.change, 6.0);
    assert_eq!(quote.change_percent, 2.5);
    assert_eq!(quote.day_low, 239.0);

    let requests = upstream.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("GET /v2/aggs/ticker/AAPL/prev?adjusted=true&apiKey=test-key "));
}

#[tokio::test]
async fn test_empty_results_are_an_empty_history() {
    let upstream = ScriptedUpstream::start(vec![(200, r#"{"status":"DELAYED","resultsCount":0}"#)]).await;
    let provider = upstream.provider(Metrics::new().unwrap());

    let bars = provider
        .get_historical_data("ZZZZ", HistoryPeriod::OneMonth, BarInterval::Daily)
        .await
        .unwrap();
    assert!(bars.is_empty());
    assert!(provider.get_quote("ZZZZ").await.unwrap().is_none());
}
