//! Messenger abstractions (inbound updates, outbound port).

pub mod port;
pub mod types;
