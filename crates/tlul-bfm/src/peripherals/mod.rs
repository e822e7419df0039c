//! Reference devices for exercising the bus-functional model without an
//! external simulator.

/// Byte-addressed memory behind a TL-UL slave port.
pub mod memory_slave;
pub use memory_slave::{MemorySlave, MemorySlaveConfig};
