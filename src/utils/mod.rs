use std::future::Future;

use tracing::warn;

pub fn remove_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url[..url.len() - 1].to_string()
    } else {
        url.to_string()
    }
}

/// Await every probe concurrently; failed probes are logged and dropped.
pub async fn join_best_effort<T, F>(probes: Vec<(String, F)>) -> Vec<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    let (labels, futures): (Vec<String>, Vec<F>) = probes.into_iter().unzip();
    let results = futures::future::join_all(futures).await;

    labels
        .into_iter()
        .zip(results)
        .filter_map(|(label, result)| match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(probe = %label, "probe failed, treating as empty: {:#}", e);
                None
            }
        })
        .collect()
}

pub async fn retry<T, E, F, Fut>(mut retries: u32, base_delay_ms: u64, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
{
    let mut attempt = 0u32;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if retries == 0 => return Err(e),
            Err(e) => {
                // Exponential backoff: base_delay * 2^attempt, capped at 30s
                let delay = (base_delay_ms * (1u64 << attempt.min(5))).min(30_000);
                warn!(attempt = attempt + 1, delay_ms = delay, "request failed ({:?}), retrying", e);
                tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
                retries -= 1;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_remove_trailing_slash() {
        assert_eq!(remove_trailing_slash("http://localhost:8080/"), "http://localhost:8080");
        assert_eq!(remove_trailing_slash("http://localhost:8080"), "http://localhost:8080");
    }

    fn probe(result: anyhow::Result<i32>) -> impl Future<Output = anyhow::Result<i32>> {
        async move { result }
    }

    #[tokio::test]
    async fn test_join_best_effort_keeps_successes() {
        let probes = vec![
            ("a".to_string(), probe(Ok(1))),
            ("b".to_string(), probe(Err(anyhow!("boom")))),
            ("c".to_string(), probe(Ok(3))),
        ];
        assert_eq!(join_best_effort(probes).await, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_retry_stops_after_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<u32, String> = retry(3, 1, move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(format!("attempt {}", n))
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), &str> = retry(2, 1, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("down")
        })
        .await;
        assert_eq!(result, Err("down"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
