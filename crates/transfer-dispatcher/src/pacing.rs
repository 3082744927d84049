use std::time::Duration;

use async_trait::async_trait;

/// Suspends the dispatch loop between submissions so the sender's pending nonce can settle.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

#[async_trait]
impl<T: Pacer + ?Sized> Pacer for &T {
    async fn pause(&self, duration: Duration) {
        (**self).pause(duration).await
    }
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
