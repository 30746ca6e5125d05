//! Messaging Module
//!
//! Message-pattern transport mirroring the HTTP surface. Patterns read
//! `<family>.<operation>` (`categories.findAll`, `genders.create`) and every
//! reply is an [`Envelope`].

mod consumer;
mod dispatcher;
mod envelope;

pub use consumer::{spawn_message_consumer, InboundMessage, MessageClient};
pub use dispatcher::{MessageDispatcher, Operation};
pub use envelope::Envelope;
