//! Development fallback that prints verification messages instead of sending them
//!
//! This is the only place where a raw verification code is written to any
//! output. It is wired in as the dispatcher fallback when
//! `DELIVERY_DEV_FALLBACK` is enabled.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use af_core::domain::Channel;
use af_core::errors::ProviderError;
use af_core::services::{NotificationProvider, RenderedMessage};
use af_shared::utils::contact::mask_contact;

const NAME: &str = "console";
const DEFAULT_CAPACITY: usize = 50;

/// A message captured by the console provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleMessage {
    pub message_id: String,
    pub contact: String,
    pub message: RenderedMessage,
    pub sent_at: DateTime<Utc>,
}

pub struct ConsoleProvider {
    outbox: Mutex<VecDeque<ConsoleMessage>>,
    capacity: usize,
    message_count: AtomicU64,
    print: bool,
}

impl ConsoleProvider {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Keep at most `capacity` messages in the outbox
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outbox: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
            message_count: AtomicU64::new(0),
            print: true,
        }
    }

    /// Capture messages without printing the banner to stdout
    pub fn quiet(mut self) -> Self {
        self.print = false;
        self
    }

    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }

    /// Captured messages, oldest first
    pub fn recent(&self) -> Vec<ConsoleMessage> {
        match self.outbox.lock() {
            Ok(outbox) => outbox.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    /// Most recent message sent to `contact`
    pub fn last_for(&self, contact: &str) -> Option<ConsoleMessage> {
        self.recent().into_iter().rev().find(|m| m.contact == contact)
    }

    fn record(&self, entry: ConsoleMessage) {
        let mut outbox = match self.outbox.lock() {
            Ok(outbox) => outbox,
            Err(poisoned) => poisoned.into_inner(),
        };
        if outbox.len() == self.capacity {
            outbox.pop_front();
        }
        outbox.push_back(entry);
    }
}

impl Default for ConsoleProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationProvider for ConsoleProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, _channel: Channel) -> bool {
        true
    }

    async fn send(&self, contact: &str, message: &RenderedMessage) -> Result<String, ProviderError> {
        let message_id = format!("console_{}", Uuid::new_v4());
        let count = self.message_count.fetch_add(1, Ordering::SeqCst) + 1;
        let masked = mask_contact(contact);

        if self.print {
            println!("\n{}", "=".repeat(60));
            println!("DEV VERIFICATION MESSAGE #{}", count);
            println!("{}", "=".repeat(60));
            println!("To: {} (masked: {})", contact, masked);
            println!("Subject: {}", message.subject);
            println!("Message ID: {}", message_id);
            println!("{}", message.text);
            println!("{}\n", "=".repeat(60));
        }

        info!(
            provider = NAME,
            contact = %masked,
            message_id = %message_id,
            message_count = count,
            body = %message.text,
            event = "console_delivery",
            "Verification message written to console"
        );

        self.record(ConsoleMessage {
            message_id: message_id.clone(),
            contact: contact.to_string(),
            message: message.clone(),
            sent_at: Utc::now(),
        });
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> RenderedMessage {
        RenderedMessage {
            subject: "subject".into(),
            text: text.into(),
            html: String::new(),
        }
    }

    #[tokio::test]
    async fn test_captures_messages() {
        let console = ConsoleProvider::new().quiet();
        let id = console.send("01012345678", &message("code 042917")).await.unwrap();

        assert!(id.starts_with("console_"));
        assert_eq!(console.message_count(), 1);
        let last = console.last_for("01012345678").unwrap();
        assert_eq!(last.message.text, "code 042917");
        assert_eq!(last.message_id, id);
        assert!(console.supports(Channel::Email) && console.supports(Channel::Sms));
    }

    #[tokio::test]
    async fn test_outbox_is_bounded() {
        let console = ConsoleProvider::with_capacity(2).quiet();
        for i in 0..3 {
            console.send("a@b.co", &message(&i.to_string())).await.unwrap();
        }

        let texts: Vec<String> = console.recent().into_iter().map(|m| m.message.text).collect();
        assert_eq!(texts, vec!["1", "2"]);
        assert_eq!(console.message_count(), 3);
    }
}
