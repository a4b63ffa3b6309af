//! WaReply core library — configuration, webhook signature verification,
//! payload types, dispatch, and the outbound WhatsApp sender used by the CLI.

pub mod config;
pub mod dispatch;
pub mod sender;
pub mod server;
pub mod verify;
pub mod webhook;
