//! CDP protocol domain types.
//!
//! One module per domain, typed params/results/events for the methods the
//! session core drives. Unknown methods stay on the untyped wire layer.

pub mod accessibility;
pub mod browser;
pub mod dom;
pub mod input;
pub mod network;
pub mod page;
pub mod performance;
pub mod runtime;
pub mod target_domain;
