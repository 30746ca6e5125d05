//! Message Consumer
//!
//! Channel-fed task that answers inbound messages in arrival order, plus a
//! small client for putting messages on the channel.

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Result, ServiceError};
use crate::messaging::{Envelope, MessageDispatcher};

/// One message off the transport. Events carry no reply channel.
#[derive(Debug)]
pub struct InboundMessage {
    pub pattern: String,
    pub payload: Value,
    pub reply: Option<oneshot::Sender<Envelope>>,
}

/// Spawns the consumer loop. It stops once every sender is dropped.
pub fn spawn_message_consumer(
    dispatcher: MessageDispatcher,
    mut inbox: mpsc::Receiver<InboundMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Message consumer started");

        while let Some(message) = inbox.recv().await {
            let envelope = dispatcher.dispatch(&message.pattern, message.payload).await;
            match message.reply {
                Some(reply) => {
                    if reply.send(envelope).is_err() {
                        warn!(pattern = %message.pattern, "requester went away before the reply");
                    }
                }
                None if !envelope.success => {
                    warn!(pattern = %message.pattern, error = ?envelope.error, "event failed");
                }
                None => debug!(pattern = %message.pattern, "event handled"),
            }
        }

        info!("Message consumer stopped");
    })
}

// == Message Client ==
#[derive(Debug, Clone)]
pub struct MessageClient {
    outbox: mpsc::Sender<InboundMessage>,
}

impl MessageClient {
    pub fn new(outbox: mpsc::Sender<InboundMessage>) -> Self {
        Self { outbox }
    }

    /// A client and the receiver to hand to [`spawn_message_consumer`].
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<InboundMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Request/reply: waits for the consumer's envelope.
    pub async fn send(&self, pattern: &str, payload: Value) -> Result<Envelope> {
        let (reply, response) = oneshot::channel();
        self.push(InboundMessage {
            pattern: pattern.to_string(),
            payload,
            reply: Some(reply),
        })
        .await?;
        response
            .await
            .map_err(|_| ServiceError::Internal("message consumer dropped the reply".to_string()))
    }

    /// Fire-and-forget event.
    pub async fn emit(&self, pattern: &str, payload: Value) -> Result<()> {
        self.push(InboundMessage {
            pattern: pattern.to_string(),
            payload,
            reply: None,
        })
        .await
    }

    async fn push(&self, message: InboundMessage) -> Result<()> {
        self.outbox
            .send(message)
            .await
            .map_err(|_| ServiceError::Internal("message consumer is not running".to_string()))
    }
}
