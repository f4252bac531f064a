//! Business services containing domain logic and use cases.

pub mod clock;
pub mod delivery;
pub mod flow;
pub mod verification;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use delivery::{
    DeliveryDispatcher, DispatchReport, MessageTemplates, NotificationProvider, RenderedMessage,
};
pub use flow::{SendCodeResult, VerificationFlow};
pub use verification::{
    CodeSnapshot, ExpirySweeper, InMemoryVerificationStore, IssuedCode, SweeperHandle,
    VerificationFailure, VerificationService, VerificationServiceConfig, VerificationStore,
    VerifyCodeResult,
};
