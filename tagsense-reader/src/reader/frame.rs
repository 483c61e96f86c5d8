//! Onboard buffer decoding
//!
//! Buffer layout, repeated `card_count` times:
//!
//! ```text
//! [antenna:1][epc_len:1][epc:epc_len][rssi:1 signed][count:1]
//! ```

use tagsense_common::TagRecord;

/// Smallest record that can be decoded (header + rssi + count, empty EPC)
const MIN_RECORD_LEN: usize = 5;

/// One decoded buffer record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEpc {
    pub antenna: u8,
    pub epc: Vec<u8>,
    pub rssi: i8,
    /// How many times the reader saw this tag since the last clear
    pub count: u8,
}

impl ParsedEpc {
    /// EPC as uppercase hexadecimal, the tag's identity
    pub fn tag_id(&self) -> String {
        encode_hex(&self.epc)
    }

    pub fn into_record(self) -> TagRecord {
        TagRecord::new(self.tag_id(), i32::from(self.rssi), self.antenna.to_string())
    }
}

/// Decode up to `card_count` records from the first `total_length` bytes
///
/// Decoding stops early, without error, at the first record that would run
/// past `total_length`.
pub fn parse_epc_buffer(raw: &[u8], total_length: usize, card_count: usize) -> Vec<ParsedEpc> {
    let limit = total_length.min(raw.len());
    let mut parsed = Vec::with_capacity(card_count);
    let mut offset = 0;

    while parsed.len() < card_count && offset < limit {
        if offset + MIN_RECORD_LEN > limit {
            break;
        }

        let antenna = raw[offset];
        let epc_len = raw[offset + 1] as usize;
        offset += 2;

        if offset + epc_len + 2 > limit {
            break;
        }

        let epc = raw[offset..offset + epc_len].to_vec();
        offset += epc_len;

        let rssi = raw[offset] as i8;
        let count = raw[offset + 1];
        offset += 2;

        parsed.push(ParsedEpc {
            antenna,
            epc,
            rssi,
            count,
        });
    }

    parsed
}

/// Uppercase hex rendering without separators
pub fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Decode pairs of hex digits; a trailing odd digit is ignored
pub fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    let digits = hex.as_bytes();
    digits
        .chunks_exact(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
        })
        .collect()
}
