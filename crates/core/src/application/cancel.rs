// Cancellation Token & Per-Call Options

use crate::error::{ErrorContext, Result, StudyError};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Cancellation signal shared by every call of one caller
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for cancellation
    ///
    /// Never resolves if the sender is dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Cancellation sender
pub struct CancelSender {
    tx: watch::Sender<bool>,
}

impl CancelSender {
    /// Signal cancellation to every outstanding call
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Create a cancellation channel
pub fn cancel_channel() -> (CancelSender, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelSender { tx }, CancelToken { rx })
}

/// Deadline and cancellation for one operation
#[derive(Clone, Default)]
pub struct CallOptions {
    pub timeout: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Run `operation` under the deadline and cancellation of `options`
///
/// The operation future is dropped (aborting any in-flight request) as soon
/// as the token fires or the deadline passes.
pub async fn guarded<T, F>(context: &ErrorContext, options: &CallOptions, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if options.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
        return Err(StudyError::Cancelled {
            context: context.clone(),
        });
    }

    let cancelled = async {
        match &options.cancel {
            Some(token) => token.cancelled().await,
            None => std::future::pending::<()>().await,
        }
    };

    let bounded = async {
        match options.timeout {
            Some(limit) => match tokio::time::timeout(limit, operation).await {
                Ok(result) => result,
                Err(_) => Err(StudyError::DeadlineExceeded {
                    context: context.clone(),
                    timeout_ms: limit.as_millis(),
                }),
            },
            None => operation.await,
        }
    };

    tokio::select! {
        result = bounded => result,
        _ = cancelled => Err(StudyError::Cancelled {
            context: context.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Operation};
    use tokio::time::sleep;

    fn ctx() -> ErrorContext {
        ErrorContext::new(Operation::LaunchTask, "s1")
    }

    async fn slow() -> Result<u32> {
        sleep(Duration::from_secs(30)).await;
        Ok(1)
    }

    #[tokio::test]
    async fn test_passes_through_without_options() {
        let result = guarded(&ctx(), &CallOptions::new(), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_deadline_aborts_slow_call() {
        let options = CallOptions::new().with_timeout(Duration::from_millis(20));
        let err = guarded(&ctx(), &options, slow()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
        assert_eq!(err.context().unwrap().operation, Operation::LaunchTask);
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_call() {
        let (sender, token) = cancel_channel();
        let options = CallOptions::new().with_cancel(token);

        tokio::spawn(async move {
            sleep(Duration::from_millis(10)).await;
            sender.cancel();
        });

        let err = guarded(&ctx(), &options, slow()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_already_cancelled_never_starts() {
        let (sender, token) = cancel_channel();
        sender.cancel();
        let options = CallOptions::new().with_cancel(token);

        let started = std::sync::atomic::AtomicBool::new(false);
        let err = guarded(&ctx(), &options, async {
            started.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(!started.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_dropped_sender_does_not_cancel() {
        let (sender, token) = cancel_channel();
        drop(sender);
        let options = CallOptions::new().with_cancel(token);
        let result = guarded(&ctx(), &options, async { Ok("done") }).await;
        tokio_test::assert_ok!(result);
    }
}
