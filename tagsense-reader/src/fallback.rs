//! Synthetic tag source used when the reader is unreachable
//!
//! Produces plausible EPC reads so everything downstream of the polling
//! cycle (store, threshold, events, notification) keeps working without
//! hardware.

use rand::seq::SliceRandom;
use rand::Rng;
use tagsense_common::TagRecord;

use crate::error::Result;
use crate::reader::frame::decode_hex;
use crate::reader::{ReaderLink, BROADCAST_ADDRESS};

/// EPC prefixes of the tag stock used on site
const SAMPLE_EPC_PREFIXES: [&str; 8] = [
    "E200001A75012345",
    "E200001A75012346",
    "E200001A75012347",
    "E200001A75012348",
    "E200001A75012349",
    "E200001B85023456",
    "E200001C95034567",
    "E200001D05045678",
];

/// RSSI band of synthetic reads, dBm (upper bound exclusive)
const RSSI_RANGE: std::ops::Range<i32> = -80..-30;

/// EPC length written into synthetic device buffers
const SIMULATED_EPC_LEN: usize = 12;

/// Antenna reported for synthetic reads
const SIMULATED_ANTENNA: u8 = 1;

#[derive(Debug, Clone, Default)]
pub struct FallbackGenerator;

impl FallbackGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Synthetic counterpart of opening the reader; never fails
    ///
    /// A broadcast open resolves to a random concrete address, mirroring
    /// what a real reader answers with.
    pub fn acquire(&self, _port: u8, address: u8) -> Result<ReaderLink> {
        let mut rng = rand::thread_rng();
        let address = if address == BROADCAST_ADDRESS {
            rng.gen_range(0x01..0xFE)
        } else {
            address
        };

        Ok(ReaderLink {
            address,
            handle: rng.gen_range(1000..=9999),
        })
    }

    /// One synthetic tag read stamped with the current time
    pub fn generate(&self) -> TagRecord {
        TagRecord::new(self.random_tag_id(), self.random_rssi(), SIMULATED_ANTENNA.to_string())
    }

    /// Prefix from the sample pool followed by a four digit suffix
    pub fn random_tag_id(&self) -> String {
        let mut rng = rand::thread_rng();
        let prefix = SAMPLE_EPC_PREFIXES
            .choose(&mut rng)
            .copied()
            .unwrap_or(SAMPLE_EPC_PREFIXES[0]);
        format!("{}{}", prefix, rng.gen_range(1000..=9999))
    }

    pub fn random_rssi(&self) -> i32 {
        rand::thread_rng().gen_range(RSSI_RANGE)
    }

    /// Encode `tag_count` synthetic reads in the reader's raw buffer layout
    ///
    /// EPCs are truncated or zero-padded to 12 bytes.
    pub fn generate_buffer(&self, tag_count: usize) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        let mut buffer = Vec::with_capacity(tag_count * (SIMULATED_EPC_LEN + 4));

        for _ in 0..tag_count {
            let mut epc = decode_hex(&self.random_tag_id()).unwrap_or_default();
            epc.resize(SIMULATED_EPC_LEN, 0);

            buffer.push(SIMULATED_ANTENNA);
            buffer.push(SIMULATED_EPC_LEN as u8);
            buffer.extend_from_slice(&epc);
            buffer.push(self.random_rssi() as i8 as u8);
            buffer.push(rng.gen_range(1..100));
        }

        buffer
    }
}
