use crate::source::{Result, SourceError};

/// A panic in `f` comes back as [`SourceError::Worker`].
pub async fn run_blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => {
            let payload = e.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            Err(SourceError::Worker(message))
        }
        Err(e) => Err(SourceError::Worker(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_returns_value() {
        let value = run_blocking(|| Ok(21 * 2)).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_propagates_error() {
        let result: Result<()> = run_blocking(|| Err(SourceError::Worker("boom".into()))).await;
        assert!(matches!(result, Err(SourceError::Worker(ref m)) if m == "boom"));
    }

    #[tokio::test]
    async fn test_panic_becomes_error() {
        let result: Result<()> = run_blocking(|| panic!("library crashed")).await;
        match result {
            Err(SourceError::Worker(message)) => assert_eq!(message, "library crashed"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_does_not_stall_the_runtime() {
        let slow = tokio::spawn(run_blocking(|| {
            std::thread::sleep(Duration::from_millis(300));
            Ok("slow")
        }));

        // The only scheduler thread keeps running timers while the slow call is parked.
        tokio::time::timeout(
            Duration::from_millis(200),
            tokio::time::sleep(Duration::from_millis(20)),
        )
        .await
        .unwrap();
        assert!(!slow.is_finished());
        assert_eq!(slow.await.unwrap().unwrap(), "slow");
    }
}
