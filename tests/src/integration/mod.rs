//! Cross-crate integration flows.

pub mod flows;
pub mod hydration;
pub mod subscriptions;
