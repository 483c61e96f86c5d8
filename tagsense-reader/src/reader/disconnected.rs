//! Adapter used when no hardware driver is linked into the process
//!
//! Every call fails with a communication error, so the session always runs
//! on the fallback source.

use super::{
    BaudRate, BufferRead, InventoryParams, InventorySummary, ReaderAdapter, ReaderCode, ReaderLink,
};

#[derive(Debug, Default)]
pub struct DisconnectedReader;

impl DisconnectedReader {
    pub fn new() -> Self {
        Self
    }
}

impl ReaderAdapter for DisconnectedReader {
    fn name(&self) -> &str {
        "disconnected"
    }

    fn open(&self, _port: u8, _address: u8, _baud: BaudRate) -> Result<ReaderLink, ReaderCode> {
        Err(ReaderCode::COMM_ERROR)
    }

    fn close(&self) -> Result<(), ReaderCode> {
        Err(ReaderCode::PORT_CLOSED)
    }

    fn clear_buffer(&self, _link: &ReaderLink) -> Result<(), ReaderCode> {
        Err(ReaderCode::PORT_CLOSED)
    }

    fn read_buffer(&self, _link: &ReaderLink) -> Result<BufferRead, ReaderCode> {
        Err(ReaderCode::PORT_CLOSED)
    }

    fn inventory(
        &self,
        _link: &ReaderLink,
        _params: &InventoryParams,
    ) -> Result<InventorySummary, ReaderCode> {
        Err(ReaderCode::PORT_CLOSED)
    }
}
