// Copyright 2025 The unboxing authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Trailing-checksum integrity codec based on CRC-64.
//!
//! The codec appends an 8-byte big-endian CRC to each block on encode. On
//! decode it runs the register over payload and trailer together; a correct
//! block leaves the register at zero.

use super::{Codec, Config, DecodeStats, Properties, PropertyValue, PROP_POLYNOM, PROP_SEED};
use crate::error::{Result, UnboxError};
use bytes::{BufMut, BytesMut};
use log::error;

/// Name of the CRC-64 codec in the codec registry.
pub const CODEC_NAME: &str = "CRC64";

/// Size of the appended checksum in bytes.
const CRC_SIZE: usize = 8;

/// Bitwise MSB-first CRC-64 with a configurable polynomial and seed.
///
/// No input or output reflection and no final XOR, so the checksum of a
/// block with its own CRC appended is zero.
#[derive(Debug, Clone, Copy)]
pub struct Crc64 {
    polynom: u64,
    seed: u64,
}

impl Crc64 {
    /// Creates a calculator for the given seed and polynomial.
    pub fn new(seed: u64, polynom: u64) -> Self {
        Self { polynom, seed }
    }

    /// Runs the register over `data`, starting from the seed.
    pub fn checksum(&self, data: &[u8]) -> u64 {
        let mut reg = self.seed;
        for &byte in data {
            reg ^= u64::from(byte) << 56;
            for _ in 0..8 {
                if reg & (1 << 63) != 0 {
                    reg = (reg << 1) ^ self.polynom;
                } else {
                    reg <<= 1;
                }
            }
        }
        reg
    }
}

/// Integrity codec appending a CRC-64 trailer to each block.
///
/// Requires the properties `polynom` and `seed` (64-bit unsigned). The
/// block size is set through [`Codec::init_capacity`]; encoded and decoded
/// sizes differ by the 8-byte trailer. This codec does not correct errors
/// and ignores erasure information.
#[derive(Debug)]
pub struct Crc64Codec {
    crc: Crc64,
    encoded_size: usize,
    decoded_size: usize,
}

impl Crc64Codec {
    /// Creates a CRC-64 codec from the property bag.
    pub fn new(properties: &Properties, _config: &Config) -> Result<Self> {
        let polynom = require_u64(properties, PROP_POLYNOM)?;
        let seed = require_u64(properties, PROP_SEED)?;

        let mut codec = Self {
            crc: Crc64::new(seed, polynom),
            encoded_size: 0,
            decoded_size: 0,
        };
        codec.init_capacity(CRC_SIZE)?;
        Ok(codec)
    }
}

fn require_u64(properties: &Properties, name: &'static str) -> Result<u64> {
    match properties.get(name) {
        None => {
            error!("({CODEC_NAME}) required property '{name}' not set");
            Err(UnboxError::MissingProperty(name))
        }
        Some(value) => value.as_ulonglong().ok_or_else(|| {
            error!("({CODEC_NAME}) property '{name}' is not an unsigned integer");
            UnboxError::InvalidProperty(name)
        }),
    }
}

impl Codec for Crc64Codec {
    fn name(&self) -> &'static str {
        CODEC_NAME
    }

    fn is_error_correcting(&self) -> bool {
        false
    }

    fn decoded_block_size(&self) -> usize {
        self.decoded_size
    }

    fn encoded_block_size(&self) -> usize {
        self.encoded_size
    }

    fn decoded_symbol_size(&self) -> usize {
        8
    }

    fn encoded_symbol_size(&self) -> usize {
        8
    }

    fn decoded_data_size(&self) -> usize {
        self.decoded_size
    }

    fn encoded_data_size(&self) -> usize {
        self.encoded_size
    }

    fn init_capacity(&mut self, size: usize) -> Result<()> {
        if size < CRC_SIZE {
            return Err(UnboxError::Capacity {
                size,
                overhead: CRC_SIZE,
            });
        }
        self.encoded_size = size;
        self.decoded_size = size - CRC_SIZE;
        Ok(())
    }

    fn set_property(&mut self, _name: &str, _value: &PropertyValue) -> Result<()> {
        Ok(())
    }

    fn encode(&self, data: &mut BytesMut) -> Result<()> {
        let crc = self.crc.checksum(data);
        data.put_u64(crc);
        Ok(())
    }

    fn decode(
        &self,
        data: &mut BytesMut,
        _erasures: Option<&[u8]>,
        stats: &mut DecodeStats,
    ) -> Result<()> {
        let crc = self.crc.checksum(data);
        data.truncate(data.len().saturating_sub(CRC_SIZE));

        *stats = DecodeStats::default();

        if crc != 0 {
            return Err(UnboxError::ChecksumMismatch);
        }
        Ok(())
    }
}
