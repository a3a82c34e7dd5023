//! SpamSum context-triggered piecewise hash, compatible with ssdeep.
//!
//! A rolling hash over a 7-byte window decides where piece boundaries fall.
//! Block hashes for every candidate block size (3, 6, 12, ...) run side by
//! side, so the final block size can be chosen once the total length is known
//! without a second pass over the data.
//!
//! Output format: `blocksize:hash1:hash2`, where `hash1` uses `blocksize`
//! and `hash2` uses twice that.

use crate::algorithm::{Algorithm, Digest};
use crate::engine::RunningHash;

const ROLLING_WINDOW: usize = 7;
const MIN_BLOCKSIZE: u64 = 3;
const HASH_PRIME: u32 = 0x0100_0193;
const HASH_INIT: u32 = 0x2802_1967;
const SPAMSUM_LENGTH: usize = 64;
const NUM_BLOCKHASHES: usize = 31;

const B64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn block_size(index: usize) -> u64 {
    MIN_BLOCKSIZE << index
}

fn sum_hash(c: u8, h: u32) -> u32 {
    h.wrapping_mul(HASH_PRIME) ^ c as u32
}

#[derive(Clone, Default)]
struct Roll {
    window: [u8; ROLLING_WINDOW],
    h1: u32,
    h2: u32,
    h3: u32,
    n: usize,
}

impl Roll {
    fn push(&mut self, c: u8) {
        let c32 = c as u32;
        self.h2 = self.h2.wrapping_sub(self.h1);
        self.h2 = self.h2.wrapping_add((ROLLING_WINDOW as u32).wrapping_mul(c32));

        self.h1 = self.h1.wrapping_add(c32);
        self.h1 = self.h1.wrapping_sub(self.window[self.n % ROLLING_WINDOW] as u32);

        self.window[self.n % ROLLING_WINDOW] = c;
        self.n = (self.n + 1) % ROLLING_WINDOW;

        self.h3 <<= 5;
        self.h3 ^= c32;
    }

    fn sum(&self) -> u32 {
        self.h1.wrapping_add(self.h2).wrapping_add(self.h3)
    }
}

#[derive(Clone, Copy)]
struct BlockHash {
    digest: [u8; SPAMSUM_LENGTH],
    dindex: usize,
    h: u32,
    half_h: u32,
    half_digest: u8,
}

impl BlockHash {
    const fn new() -> Self {
        BlockHash {
            digest: [0; SPAMSUM_LENGTH],
            dindex: 0,
            h: HASH_INIT,
            half_h: HASH_INIT,
            half_digest: 0,
        }
    }
}

/// Streaming SpamSum state.
pub(crate) struct SpamSum {
    bh: [BlockHash; NUM_BLOCKHASHES],
    bh_start: usize,
    bh_end: usize,
    total_size: u64,
    roll: Roll,
}

impl Default for SpamSum {
    fn default() -> Self {
        SpamSum {
            bh: [BlockHash::new(); NUM_BLOCKHASHES],
            bh_start: 0,
            bh_end: 1,
            total_size: 0,
            roll: Roll::default(),
        }
    }
}

impl SpamSum {
    /// Start tracking the next larger block size, seeded from the current
    /// largest one.
    fn try_fork(&mut self) {
        if self.bh_end >= NUM_BLOCKHASHES {
            return;
        }
        let prev = self.bh[self.bh_end - 1];
        let next = &mut self.bh[self.bh_end];
        next.h = prev.h;
        next.half_h = prev.half_h;
        next.digest[0] = 0;
        next.half_digest = 0;
        next.dindex = 0;
        self.bh_end += 1;
    }

    /// Drop the smallest block size once it can no longer be selected.
    fn try_reduce(&mut self) {
        if self.bh_end - self.bh_start < 2 {
            return;
        }
        if block_size(self.bh_start) * SPAMSUM_LENGTH as u64 >= self.total_size {
            return;
        }
        if self.bh[self.bh_start + 1].dindex < SPAMSUM_LENGTH / 2 {
            return;
        }
        self.bh_start += 1;
    }

    fn step(&mut self, c: u8) {
        self.total_size += 1;
        self.roll.push(c);
        let h = self.roll.sum() as u64;

        for bh in &mut self.bh[self.bh_start..self.bh_end] {
            bh.h = sum_hash(c, bh.h);
            bh.half_h = sum_hash(c, bh.half_h);
        }

        // 0xffffffff is not -1 (mod 3), so test the smallest block size first
        if h % MIN_BLOCKSIZE != MIN_BLOCKSIZE - 1 {
            return;
        }

        let mut i = self.bh_start;
        while i < self.bh_end {
            let bs = block_size(i);
            if h % bs != bs - 1 {
                break;
            }
            if self.bh[i].dindex == 0 {
                self.try_fork();
            }

            let bh = &mut self.bh[i];
            bh.digest[bh.dindex] = B64[(bh.h % 64) as usize];
            bh.half_digest = B64[(bh.half_h % 64) as usize];
            if bh.dindex < SPAMSUM_LENGTH - 1 {
                bh.dindex += 1;
                bh.digest[bh.dindex] = 0;
                bh.h = HASH_INIT;
                if bh.dindex < SPAMSUM_LENGTH / 2 {
                    bh.half_h = HASH_INIT;
                    bh.half_digest = 0;
                }
            } else {
                self.try_reduce();
            }
            i += 1;
        }
    }

    fn signature(&self) -> String {
        let roll = self.roll.sum();
        let mut bi = self.bh_start;

        while bi < NUM_BLOCKHASHES - 1
            && block_size(bi) * (SPAMSUM_LENGTH as u64) < self.total_size
        {
            bi += 1;
        }
        while bi >= self.bh_end {
            bi -= 1;
        }
        while bi > self.bh_start && self.bh[bi].dindex < SPAMSUM_LENGTH / 2 {
            bi -= 1;
        }

        let mut out = format!("{}:", block_size(bi));

        let first = &self.bh[bi];
        out.extend(first.digest[..first.dindex].iter().map(|&b| b as char));
        if roll != 0 {
            out.push(B64[(first.h % 64) as usize] as char);
        } else if first.digest[first.dindex] != 0 {
            // a full hash keeps its last piece outside the copied prefix
            out.push(first.digest[first.dindex] as char);
        }
        out.push(':');

        if bi < self.bh_end - 1 {
            let second = &self.bh[bi + 1];
            let len = second.dindex.min(SPAMSUM_LENGTH / 2 - 1);
            out.extend(second.digest[..len].iter().map(|&b| b as char));
            if roll != 0 {
                out.push(B64[(second.half_h % 64) as usize] as char);
            } else if second.half_digest != 0 {
                out.push(second.half_digest as char);
            }
        } else if roll != 0 {
            out.push(B64[(first.h % 64) as usize] as char);
        }

        out
    }
}

impl RunningHash for SpamSum {
    const ALGORITHM: Algorithm = Algorithm::SpamSum;

    fn update(&mut self, data: &[u8]) {
        for &c in data {
            self.step(c);
        }
    }

    fn finish(&mut self) -> Digest {
        Digest::from_text(Self::ALGORITHM, self.signature())
    }

    fn reset(&mut self) {
        *self = SpamSum::default();
    }
}
