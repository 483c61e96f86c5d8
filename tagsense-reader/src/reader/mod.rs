//! Reader adapter contract
//!
//! The engine talks to the physical reader only through [`ReaderAdapter`].
//! Calls are blocking (serial I/O behind a vendor driver); the session
//! controller runs them on the blocking thread pool.
//!
//! In-tree adapters:
//! - [`DisconnectedReader`]: no driver linked, every call fails
//! - [`SimulatedReader`]: in-process reader staging synthetic tags

pub mod disconnected;
pub mod frame;
pub mod simulated;

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::config::{ReaderConfig, ReaderDriver};

pub use disconnected::DisconnectedReader;
pub use frame::{parse_epc_buffer, ParsedEpc};
pub use simulated::SimulatedReader;

/// Address that asks the reader to answer on whatever address it has
pub const BROADCAST_ADDRESS: u8 = 0xFF;

/// Status code returned by reader operations (0 = success)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderCode(pub u8);

impl ReaderCode {
    pub const OK: ReaderCode = ReaderCode(0x00);
    /// Inventory scan time elapsed; expected on every inventory round
    pub const INVENTORY_TIMEOUT: ReaderCode = ReaderCode(0x02);
    /// Serial communication failure
    pub const COMM_ERROR: ReaderCode = ReaderCode(0x30);
    /// Port is not open
    pub const PORT_CLOSED: ReaderCode = ReaderCode(0x36);

    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    pub fn is_inventory_timeout(self) -> bool {
        self == Self::INVENTORY_TIMEOUT
    }
}

impl fmt::Display for ReaderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Serial baud rates understood by the reader, with their protocol codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
pub enum BaudRate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
}

impl BaudRate {
    /// Code sent to the driver for this rate
    pub fn code(self) -> u8 {
        match self {
            BaudRate::B9600 => 0,
            BaudRate::B19200 => 1,
            BaudRate::B38400 => 2,
            BaudRate::B57600 => 5,
            BaudRate::B115200 => 6,
        }
    }

    pub fn bits_per_second(self) -> u32 {
        match self {
            BaudRate::B9600 => 9600,
            BaudRate::B19200 => 19200,
            BaudRate::B38400 => 38400,
            BaudRate::B57600 => 57600,
            BaudRate::B115200 => 115200,
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            9600 => Ok(BaudRate::B9600),
            19200 => Ok(BaudRate::B19200),
            38400 => Ok(BaudRate::B38400),
            57600 => Ok(BaudRate::B57600),
            115200 => Ok(BaudRate::B115200),
            other => Err(format!("Unsupported baud rate: {}", other)),
        }
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        BaudRate::B57600
    }
}

/// An open connection to a reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderLink {
    /// Address negotiated during open (never the broadcast address)
    pub address: u8,
    /// Driver handle for subsequent calls
    pub handle: i32,
}

/// Raw result of a buffer read
#[derive(Debug, Clone, Default)]
pub struct BufferRead {
    /// Number of meaningful bytes in `raw`
    pub total_length: usize,
    /// Number of tag records the reader reports
    pub card_count: usize,
    pub raw: Vec<u8>,
}

/// Result of an inventory round
#[derive(Debug, Clone, Copy, Default)]
pub struct InventorySummary {
    pub total_length: usize,
    pub card_count: usize,
}

/// Memory bank targeted by an inventory round
pub const MEM_BANK_EPC: u8 = 0x01;

/// Inventory target flag A
pub const TARGET_A: u8 = 0x00;

/// Parameters of the inventory command
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InventoryParams {
    /// Q value (0-15)
    pub q_value: u8,
    /// Session (0-3)
    pub session: u8,
    pub memory_bank: u8,
    pub target: u8,
    pub antenna: u8,
    /// Scan time in 100 ms units (3-255)
    pub scan_time: u8,
    pub fast_mode: bool,
}

impl Default for InventoryParams {
    fn default() -> Self {
        Self {
            q_value: 4,
            session: 0,
            memory_bank: MEM_BANK_EPC,
            target: TARGET_A,
            antenna: 0x80,
            scan_time: 20,
            fast_mode: true,
        }
    }
}

/// Contract of the hardware binding
///
/// Every operation returns the reader's status code on failure. Adapters
/// must be shareable across threads; they are called from one polling task
/// at a time, never concurrently.
pub trait ReaderAdapter: Send + Sync {
    /// Short name for logs ("disconnected", "simulated", ...)
    fn name(&self) -> &str;

    /// Open the serial port. `address == BROADCAST_ADDRESS` requests discovery.
    fn open(&self, port: u8, address: u8, baud: BaudRate) -> Result<ReaderLink, ReaderCode>;

    fn close(&self) -> Result<(), ReaderCode>;

    /// Discard everything staged in the reader's onboard buffer
    fn clear_buffer(&self, link: &ReaderLink) -> Result<(), ReaderCode>;

    /// Fetch the onboard buffer without clearing it
    fn read_buffer(&self, link: &ReaderLink) -> Result<BufferRead, ReaderCode>;

    /// Run an inventory round that stages detected tags in the onboard buffer
    fn inventory(
        &self,
        link: &ReaderLink,
        params: &InventoryParams,
    ) -> Result<InventorySummary, ReaderCode>;
}

/// Build the adapter selected in the reader configuration
pub fn build_adapter(config: &ReaderConfig) -> Arc<dyn ReaderAdapter> {
    match config.driver {
        ReaderDriver::Disconnected => Arc::new(DisconnectedReader::new()),
        ReaderDriver::Simulated => Arc::new(SimulatedReader::new(config.simulated_tags_per_round)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_code_display() {
        assert_eq!(ReaderCode(0x02).to_string(), "0x02");
        assert_eq!(ReaderCode(0xFB).to_string(), "0xFB");
        assert!(ReaderCode::OK.is_ok());
        assert!(ReaderCode::INVENTORY_TIMEOUT.is_inventory_timeout());
    }

    #[test]
    fn test_baud_rate_codes() {
        assert_eq!(BaudRate::try_from(57600).unwrap().code(), 5);
        assert_eq!(BaudRate::try_from(9600).unwrap().code(), 0);
        assert_eq!(BaudRate::try_from(115200).unwrap().code(), 6);
        assert!(BaudRate::try_from(4800).is_err());
    }

    #[test]
    fn test_default_inventory_params() {
        let params = InventoryParams::default();
        assert_eq!(params.q_value, 4);
        assert_eq!(params.memory_bank, MEM_BANK_EPC);
        assert_eq!(params.antenna, 0x80);
        assert_eq!(params.scan_time, 20);
    }

    #[test]
    fn test_build_adapter_follows_driver() {
        let mut config = ReaderConfig::default();
        assert_eq!(build_adapter(&config).name(), "disconnected");

        config.driver = ReaderDriver::Simulated;
        assert_eq!(build_adapter(&config).name(), "simulated");
    }
}
