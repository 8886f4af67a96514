//! Bounded in-memory store for reconstructed log events.

mod log_store;
mod records;
mod ring;

pub use log_store::{LogStore, CONSOLE_CAPACITY, NETWORK_CAPACITY};
pub use records::{
    ConsoleKind, ConsoleLogRecord, NetworkLogRecord, NetworkResponse, NetworkUpdate,
};
pub use ring::RingBuffer;
