//! In-process reader that behaves like the hardware
//!
//! Inventory rounds stage synthetic tags in an onboard buffer that is read
//! and cleared exactly like the real device's, so the full buffer parsing
//! path runs without hardware attached.

use std::sync::Mutex;

use rand::Rng;

use super::{
    BaudRate, BufferRead, InventoryParams, InventorySummary, ReaderAdapter, ReaderCode, ReaderLink,
};
use crate::fallback::FallbackGenerator;

#[derive(Debug, Default)]
struct DeviceState {
    link: Option<ReaderLink>,
    buffer: Vec<u8>,
    card_count: usize,
}

#[derive(Debug)]
pub struct SimulatedReader {
    generator: FallbackGenerator,
    max_tags_per_round: usize,
    state: Mutex<DeviceState>,
}

impl SimulatedReader {
    /// `max_tags_per_round` caps how many tags one inventory round stages
    pub fn new(max_tags_per_round: usize) -> Self {
        Self {
            generator: FallbackGenerator::new(),
            max_tags_per_round,
            state: Mutex::new(DeviceState::default()),
        }
    }

    fn with_open_device<T>(
        &self,
        link: &ReaderLink,
        f: impl FnOnce(&mut DeviceState) -> Result<T, ReaderCode>,
    ) -> Result<T, ReaderCode> {
        let mut state = self.state.lock().map_err(|_| ReaderCode::COMM_ERROR)?;
        match state.link {
            Some(open) if open == *link => f(&mut state),
            _ => Err(ReaderCode::PORT_CLOSED),
        }
    }
}

impl Default for SimulatedReader {
    fn default() -> Self {
        Self::new(2)
    }
}

impl ReaderAdapter for SimulatedReader {
    fn name(&self) -> &str {
        "simulated"
    }

    fn open(&self, port: u8, address: u8, _baud: BaudRate) -> Result<ReaderLink, ReaderCode> {
        let link = self
            .generator
            .acquire(port, address)
            .map_err(|_| ReaderCode::COMM_ERROR)?;

        let mut state = self.state.lock().map_err(|_| ReaderCode::COMM_ERROR)?;
        *state = DeviceState {
            link: Some(link),
            ..DeviceState::default()
        };
        Ok(link)
    }

    fn close(&self) -> Result<(), ReaderCode> {
        let mut state = self.state.lock().map_err(|_| ReaderCode::COMM_ERROR)?;
        if state.link.take().is_none() {
            return Err(ReaderCode::PORT_CLOSED);
        }
        state.buffer.clear();
        state.card_count = 0;
        Ok(())
    }

    fn clear_buffer(&self, link: &ReaderLink) -> Result<(), ReaderCode> {
        self.with_open_device(link, |state| {
            state.buffer.clear();
            state.card_count = 0;
            Ok(())
        })
    }

    fn read_buffer(&self, link: &ReaderLink) -> Result<BufferRead, ReaderCode> {
        self.with_open_device(link, |state| {
            Ok(BufferRead {
                total_length: state.buffer.len(),
                card_count: state.card_count,
                raw: state.buffer.clone(),
            })
        })
    }

    fn inventory(
        &self,
        link: &ReaderLink,
        _params: &InventoryParams,
    ) -> Result<InventorySummary, ReaderCode> {
        let found = rand::thread_rng().gen_range(0..=self.max_tags_per_round);
        let records = self.generator.generate_buffer(found);

        self.with_open_device(link, |state| {
            if found == 0 {
                return Err(ReaderCode::INVENTORY_TIMEOUT);
            }
            state.buffer.extend_from_slice(&records);
            state.card_count += found;
            Ok(InventorySummary {
                total_length: state.buffer.len(),
                card_count: state.card_count,
            })
        })
    }
}
