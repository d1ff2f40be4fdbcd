//! Warden-Notify: operator notification boundary
//!
//! Defines the abstract message model (attachments, confirmation controls,
//! message references) and the [`NotificationGateway`] trait the core posts
//! through. Vendor-specific payload shapes live behind gateway
//! implementations; the core never references them.
//!
//! Two gateways ship here:
//! - [`TracingGateway`] — renders to the log, returns synthetic message
//!   references (default for tests and the CLI)
//! - [`WebhookGateway`] — POSTs the abstract model as JSON to a configured
//!   endpoint, which adapts it to the chat vendor

mod error;
mod gateway;
mod message;
mod webhook;

pub use error::{NotifyError, NotifyResult};
pub use gateway::{NotificationGateway, TracingGateway};
pub use message::{
    MessageAction, MessageAttachment, MessageColor, MessageRef, OutboundMessage, UpdatedMessage,
};
pub use webhook::WebhookGateway;
