//! CRC-16/ARC: reflected polynomial 0xA001 (0x8005), init 0, no final xor.

use crate::algorithm::{Algorithm, Digest};
use crate::engine::RunningHash;

const POLY: u16 = 0xA001;
const SEED: u16 = 0x0000;

const TABLE: [u16; 256] = {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
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

pub(crate) struct Crc16 {
    crc: u16,
}

impl Default for Crc16 {
    fn default() -> Self {
        Crc16 { crc: SEED }
    }
}

impl RunningHash for Crc16 {
    const ALGORITHM: Algorithm = Algorithm::Crc16;

    fn update(&mut self, data: &[u8]) {
        let mut crc = self.crc;
        for &byte in data {
            crc = (crc >> 8) ^ TABLE[((crc ^ byte as u16) & 0xFF) as usize];
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
