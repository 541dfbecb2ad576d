use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Sends operator alerts for an execution result.
#[async_trait]
pub trait Notify<P>: Send + Sync {
    async fn notify(&self, p: &P) -> Result<()>;
}

pub(crate) fn spawn_notifier<P>(
    subsystem: Arc<str>,
    notify: Arc<dyn Notify<P>>,
    mut rx: mpsc::Receiver<P>,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    P: Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let p = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                p = rx.recv() => match p {
                    Some(p) => p,
                    None => break,
                },
            };
            if let Err(e) = notify.notify(&p).await {
                tracing::warn!(subsystem = %subsystem, error = %e, "notification failed");
            }
        }
        tracing::debug!(subsystem = %subsystem, "notifier stopped");
    })
}
