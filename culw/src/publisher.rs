//! Bus publishing

use async_trait::async_trait;
use culw_types::NormalizedEvent;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::{Error, Result};

/// Sink for decoded events
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, event: &NormalizedEvent) -> Result<()>;
}

/// Publisher forwarding events into a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::Sender<NormalizedEvent>,
}

impl ChannelPublisher {
    pub fn new(tx: mpsc::Sender<NormalizedEvent>) -> Self {
        Self { tx }
    }

    /// Publisher plus the receiving end of its channel
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NormalizedEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Publisher for ChannelPublisher {
    /// Never waits for the consumer; the event is dropped when the channel
    /// is full or closed
    async fn publish(&self, event: &NormalizedEvent) -> Result<()> {
        self.tx.try_send(event.clone()).map_err(|e| match e {
            TrySendError::Full(_) => Error::Publish(format!("bus channel full, {} dropped", event)),
            TrySendError::Closed(_) => {
                Error::Publish(format!("bus channel closed, {} dropped", event))
            }
        })
    }
}
