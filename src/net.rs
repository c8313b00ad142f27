//! Small helpers for rate-limit friendly requests against the indexer.

use rand::{thread_rng, Rng};
use std::time::Duration;

/// Send a request, waiting out HTTP 429 with jittered exponential backoff.
/// Transport failures and every other response go straight back to the
/// caller; a failed poll is retried by the next tick, not here.
pub async fn send_with_backoff(
    rb: reqwest::RequestBuilder,
    label: &str,
    max_retries: u8,
) -> Result<reqwest::Response, reqwest::Error> {
    let mut attempt = 0u8;
    loop {
        // Streaming bodies can't be cloned; those get a single shot.
        let Some(this_try) = rb.try_clone() else {
            return rb.send().await;
        };
        let r = this_try.send().await?;
        if !rate_limited(r.status().as_u16()) || attempt >= max_retries {
            return Ok(r);
        }
        attempt += 1;
        let back_ms = backoff_delay_ms(attempt);
        log::warn!("[net] 429 {label} retry={attempt} backoff={back_ms}ms");
        tokio::time::sleep(Duration::from_millis(back_ms)).await;
    }
}

fn rate_limited(status: u16) -> bool {
    status == 429
}

fn backoff_delay_ms(attempt: u8) -> u64 {
    let base = backoff_base_ms(attempt);
    let jitter: u64 = thread_rng().gen_range(0..=250);
    base + jitter
}

// 300,600,1200,2400,4800 then flat
fn backoff_base_ms(attempt: u8) -> u64 {
    300u64.saturating_mul(1u64 << (attempt.clamp(1, 5) - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn backoff_grows_then_caps() {
        assert_eq!(backoff_base_ms(1), 300);
        assert_eq!(backoff_base_ms(2), 600);
        assert_eq!(backoff_base_ms(5), 4800);
        assert_eq!(backoff_base_ms(9), 4800);
    }

    #[test]
    fn jitter_stays_bounded() {
        for _ in 0..50 {
            let d = backoff_delay_ms(1);
            assert!((300..=550).contains(&d));
        }
    }

    #[test]
    fn only_rate_limits_are_retried() {
        assert!(rate_limited(429));
        assert!(!rate_limited(500));
        assert!(!rate_limited(503));
        assert!(!rate_limited(404));
    }

    #[tokio::test]
    async fn dropped_connection_is_reported_once() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                counter.fetch_add(1, Ordering::SeqCst);
                drop(stream);
            }
        });

        let rb = reqwest::Client::new()
            .get(format!("http://{addr}/block/1000"))
            .timeout(Duration::from_secs(2));
        let res = send_with_backoff(rb, "block/1000", 3).await;
        assert!(res.is_err());
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }
}
