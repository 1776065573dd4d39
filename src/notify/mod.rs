// src/notify/mod.rs

//! Outbound notification channel.

pub mod telegram;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DeliveryReceipt, MessageOptions};

pub use telegram::TelegramNotifier;

/// Trait for notification backends.
///
/// One delivery attempt per invocation; no retry or backoff. A transport
/// failure propagates with context so that callers can confirm delivery
/// before marking state as notified.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a message to the configured destination.
    async fn notify(&self, message: &str, options: &MessageOptions) -> Result<DeliveryReceipt>;
}
