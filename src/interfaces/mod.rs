//! Interfaces layer: the line-oriented JSON protocol and the TCP server exposing it.

pub mod dispatch;
pub mod protocol;
pub mod server;
