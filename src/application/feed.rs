use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A send that did not happen; the item is handed back to the caller.
#[derive(Debug)]
pub enum FeedError<T> {
    Cancelled(T),
    Closed(T),
}

impl<T> FeedError<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Cancelled(item) | Self::Closed(item) => item,
        }
    }
}

/// Sends `item` on `tx`, giving up as soon as `cancel` fires.
///
/// Waits for channel capacity without taking ownership of the item so it can
/// be returned untouched when the send is abandoned.
pub async fn cancelable_feed<T>(
    cancel: &CancellationToken,
    tx: &mpsc::Sender<T>,
    item: T,
) -> Result<(), FeedError<T>> {
    let permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(FeedError::Cancelled(item)),
        permit = tx.reserve() => match permit {
            Ok(permit) => permit,
            Err(_) => return Err(FeedError::Closed(item)),
        },
    };
    permit.send(item);
    Ok(())
}

/// Fire-and-forget variant of [`cancelable_feed`] running on its own task so
/// the producer never waits for a slow consumer.
pub fn async_feed<T>(cancel: CancellationToken, tx: mpsc::Sender<T>, item: T) -> JoinHandle<()>
where
    T: Send + 'static,
{
    tokio::spawn(async move {
        if let Err(FeedError::Closed(_)) = cancelable_feed(&cancel, &tx, item).await {
            tracing::debug!("async feed dropped: channel closed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_feed_delivers() {
        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(1);
        cancelable_feed(&cancel, &tx, 7).await.unwrap();
        assert_eq!(rx.recv().await, Some(7));
    }

    #[tokio::test]
    async fn test_feed_returns_item_on_cancel() {
        let cancel = CancellationToken::new();
        let (tx, _rx) = mpsc::channel(1);
        cancelable_feed(&cancel, &tx, 1).await.unwrap();

        let child = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            child.cancel();
        });
        // Channel is full, so only cancellation can end the wait.
        let err = cancelable_feed(&cancel, &tx, 2).await.unwrap_err();
        assert!(matches!(err, FeedError::Cancelled(2)));
    }

    #[tokio::test]
    async fn test_feed_closed_channel() {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel::<u8>(1);
        drop(rx);
        let err = cancelable_feed(&cancel, &tx, 3).await.unwrap_err();
        assert_eq!(err.into_inner(), 3);
    }

    #[tokio::test]
    async fn test_async_feed_does_not_block() {
        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(1);
        let handle = async_feed(cancel.clone(), tx.clone(), 1);
        let second = async_feed(cancel.clone(), tx, 2);
        let mut got = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        got.sort();
        assert_eq!(got, vec![1, 2]);
        handle.await.unwrap();
        second.await.unwrap();
    }
}
