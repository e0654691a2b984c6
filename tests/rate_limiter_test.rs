use std::sync::Arc;
use std::time::Duration;
use stockcast::infrastructure::core::RateLimiter;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_burst_is_spread_over_windows() {
    let limiter = Arc::new(RateLimiter::with_window(5, Duration::from_secs(60)));
    let start = Instant::now();

    let mut handles = Vec::new();
    for _ in 0..11 {
        let limiter = limiter.clone();
        handles.push(tokio::spawn(async move {
            limiter.acquire().await;
            start.elapsed()
        }));
    }

    let mut waits = Vec::new();
    for handle in handles {
        waits.push(handle.await.unwrap());
    }
    waits.sort();

    // 5 immediately, 5 after one window, the last after two
    assert!(waits[..5].iter().all(|w| *w < Duration::from_secs(1)));
    assert!(waits[5..10].iter().all(|w| *w >= Duration::from_secs(60) && *w < Duration::from_secs(61)));
    assert!(waits[10] >= Duration::from_secs(120));
}
