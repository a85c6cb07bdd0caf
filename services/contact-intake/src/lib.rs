//! Juniper Broz Contact Intake Service
//!
//! Library modules behind the `juniper-contact-intake` binary:
//! contact-form processing, AI-assisted inbound-reply handling, rate
//! limiting, and dual-channel email dispatch.

pub mod composer;
pub mod dispatch;
pub mod handlers;
pub mod middleware;
pub mod parser;
pub mod rate_limit;
pub mod service;
pub mod templates;

pub use dispatch::{EmailDispatcher, EmailMessage, SendReceipt};
pub use handlers::AppState;
pub use service::{ContactSubmission, InboundEmailEvent, IntakeService, ReplyOutcome};
