//! CRC-64/XZ: ECMA-182 polynomial in reflected form, all-ones init and
//! final xor.

use crate::algorithm::{Algorithm, Digest};
use crate::engine::RunningHash;

const POLY: u64 = 0xC96C_5795_D787_0F42;
const SEED: u64 = 0xFFFF_FFFF_FFFF_FFFF;

const TABLE: [u64; 256] = {
    let mut table = [0u64; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u64;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

pub(crate) struct Crc64 {
    crc: u64,
}

impl Default for Crc64 {
    fn default() -> Self {
        Crc64 { crc: SEED }
    }
}

impl RunningHash for Crc64 {
    const ALGORITHM: Algorithm = Algorithm::Crc64;

    fn update(&mut self, data: &[u8]) {
        let mut crc = self.crc;
        for &byte in data {
            crc = TABLE[((crc ^ byte as u64) & 0xFF) as usize] ^ (crc >> 8);
        }
        self.crc = crc;
    }

    fn finish(&mut self) -> Digest {
        Digest::from_bytes(Self::ALGORITHM, (self.crc ^ SEED).to_be_bytes().to_vec())
    }

    fn reset(&mut self) {
        self.crc = SEED;
    }
}
