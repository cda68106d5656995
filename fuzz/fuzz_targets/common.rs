// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(dead_code)]

/// Sequential reader over fuzzer input; yields zeros once exhausted.
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn next_u8(&mut self) -> u8 {
        let value = self.data.get(self.pos).copied().unwrap_or(0);
        self.pos = self.pos.saturating_add(1);
        value
    }

    pub fn next_i16(&mut self) -> i16 {
        i16::from_le_bytes([self.next_u8(), self.next_u8()])
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        for byte in &mut bytes {
            *byte = self.next_u8();
        }
        u64::from_le_bytes(bytes)
    }

    /// Next `len` bytes, zero-padded past the end of input.
    pub fn take_padded(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.next_u8()).collect()
    }
}

/// Maps `seed` into `[low, high]`.
pub fn bounded(seed: u8, low: usize, high: usize) -> usize {
    if high <= low {
        return low;
    }
    low + usize::from(seed) % (high - low + 1)
}

/// Decodes up to `max` little-endian f64 values from `bytes`.
pub fn decode_f64_chunks(bytes: &[u8], max: usize) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .take(max)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect()
}
