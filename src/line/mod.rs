//! LINE Messaging API plumbing: webhook types, signature checks, event
//! dispatch and the reply client.

pub mod client;
pub mod dispatch;
pub mod signature;
pub mod types;
