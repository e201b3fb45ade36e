//! Chrome DevTools Protocol message envelope and domain types.
//!
//! CDP is flatten-multiplexed: every command/response/event after the
//! initial `Target.attachToTarget` carries a `sessionId` identifying which
//! target it belongs to, all over one transport connection. This module
//! models that envelope and the slice of the Target/Page/Debugger/Runtime
//! domains the adapter actually speaks.

pub mod client;
pub mod messages;

pub use client::{CdpClient, CdpError};
pub use messages::*;
