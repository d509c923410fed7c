//! Multi-consumer work queue.
//!
//! A bounded tokio mpsc channel whose receiver is shared by a worker pool
//! behind an async mutex. Receives are bounded by a poll interval so idle
//! workers get a chance to look at their stop signal.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

/// Capacity of both pipeline queues. Kept minimal so a full downstream
/// pool pushes back on its producers.
pub const QUEUE_CAPACITY: usize = 1;

/// Result of one bounded receive.
#[derive(Debug)]
pub enum Received<T> {
    Item(T),
    /// Nothing arrived within the poll interval.
    Idle,
    /// Every sender is gone and the queue is empty.
    Closed,
}

/// Receiving half shared by every worker of one pool.
pub struct WorkReceiver<T> {
    inner: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for WorkReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> WorkReceiver<T> {
    /// Wait at most `poll` for the next item.
    pub async fn recv_timeout(&self, poll: Duration) -> Received<T> {
        let next = tokio::time::timeout(poll, async {
            let mut rx = self.inner.lock().await;
            rx.recv().await
        })
        .await;

        match next {
            Ok(Some(item)) => Received::Item(item),
            Ok(None) => Received::Closed,
            Err(_) => Received::Idle,
        }
    }
}

/// Create a work queue with [`QUEUE_CAPACITY`].
pub fn work_queue<T>() -> (mpsc::Sender<T>, WorkReceiver<T>) {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    (
        tx,
        WorkReceiver {
            inner: Arc::new(Mutex::new(rx)),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLL: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn receives_items_in_fifo_order() {
        let (tx, rx) = work_queue::<u32>();
        tokio::spawn(async move {
            for i in 0..3 {
                tx.send(i).await.unwrap();
            }
        });

        let mut got = Vec::new();
        while got.len() < 3 {
            if let Received::Item(i) = rx.recv_timeout(Duration::from_secs(1)).await {
                got.push(i);
            }
        }
        assert_eq!(got, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn idle_when_nothing_arrives() {
        let (_tx, rx) = work_queue::<u32>();
        assert!(matches!(rx.recv_timeout(POLL).await, Received::Idle));
    }

    #[tokio::test]
    async fn closed_after_senders_drop_and_queue_drains() {
        let (tx, rx) = work_queue::<u32>();
        tx.send(7).await.unwrap();
        drop(tx);
        assert!(matches!(rx.recv_timeout(POLL).await, Received::Item(7)));
        assert!(matches!(rx.recv_timeout(POLL).await, Received::Closed));
    }

    #[tokio::test]
    async fn each_item_goes_to_exactly_one_consumer() {
        let (tx, rx) = work_queue::<u32>();
        let total = 50u32;

        let mut handles = Vec::new();
        for _ in 0..4 {
            let rx = rx.clone();
            handles.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                loop {
                    match rx.recv_timeout(POLL).await {
                        Received::Item(i) => seen.push(i),
                        Received::Idle => continue,
                        Received::Closed => break,
                    }
                }
                seen
            }));
        }
        drop(rx);

        for i in 0..total {
            tx.send(i).await.unwrap();
        }
        drop(tx);

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        all.sort();
        assert_eq!(all, (0..total).collect::<Vec<_>>());
    }
}
