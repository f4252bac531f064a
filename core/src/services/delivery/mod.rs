//! Notification delivery
//!
//! Renders verification messages and hands them to an ordered list of
//! providers per channel, falling back to the next provider on failure.

mod dispatcher;
mod provider;
mod templates;

#[cfg(test)]
pub(crate) mod tests;

pub use dispatcher::{DeliveryDispatcher, DispatchReport};
pub use provider::{NotificationProvider, RenderedMessage};
pub use templates::MessageTemplates;
