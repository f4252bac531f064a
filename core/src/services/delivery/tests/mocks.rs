//! Mock providers for testing the dispatcher

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::entities::verification_code::Channel;
use crate::errors::ProviderError;
use crate::services::delivery::{NotificationProvider, RenderedMessage};

#[derive(Debug, Clone, Copy)]
pub enum Behaviour {
    Succeed,
    FailHttp,
    Hang,
}

/// Provider whose behaviour is fixed at construction
pub struct ScriptedProvider {
    name: String,
    channels: Vec<Channel>,
    configured: bool,
    behaviour: Behaviour,
    pub sent: Arc<Mutex<Vec<(String, RenderedMessage)>>>,
}

impl ScriptedProvider {
    pub fn new(name: &str, channel: Channel, behaviour: Behaviour) -> Self {
        Self {
            name: name.to_string(),
            channels: vec![channel],
            configured: true,
            behaviour,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn console() -> Self {
        Self {
            channels: vec![Channel::Email, Channel::Sms],
            ..Self::new("console", Channel::Email, Behaviour::Succeed)
        }
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn call_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_message(&self) -> Option<RenderedMessage> {
        self.sent.lock().unwrap().last().map(|(_, message)| message.clone())
    }
}

#[async_trait]
impl NotificationProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, channel: Channel) -> bool {
        self.channels.contains(&channel)
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn send(&self, contact: &str, message: &RenderedMessage) -> Result<String, ProviderError> {
        self.sent
            .lock()
            .unwrap()
            .push((contact.to_string(), message.clone()));
        match self.behaviour {
            Behaviour::Succeed => Ok(format!("{}-{}", self.name, uuid::Uuid::new_v4())),
            Behaviour::FailHttp => Err(ProviderError::http(self.name.clone(), 502, "bad gateway")),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok("never".to_string())
            }
        }
    }
}
