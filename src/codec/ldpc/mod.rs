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

//! LDPC error-correcting codec.
//!
//! The codec owns a randomly constructed sparse parity-check matrix and the
//! dense generator derived from it. Payload bytes are spread into one
//! codeword bit per stream byte on encode; on decode each stream byte is a
//! signed log-likelihood ratio in tenths of a nat, fed through probability
//! propagation.

use super::{Codec, Config, DecodeStats, Properties, PROP_MESSAGE_SIZE, PROP_PARITY_SIZE};
use crate::error::{Result, UnboxError};
use bytes::BytesMut;
use log::error;

pub mod distrib;
pub mod gen;
pub mod mod2dense;
pub mod mod2sparse;
pub mod pchk;
pub mod prp;

use distrib::Distribution;
use gen::GeneratorMatrix;
use mod2sparse::Mod2Sparse;
use pchk::PchkMethod;
use prp::{Graph, Workspace};

/// Name of the LDPC codec in the codec registry.
pub const CODEC_NAME: &str = "LDPC";

/// Fixed code design: construction seed.
const SEED: u32 = 1;
/// Fixed code design: column weight distribution.
const WEIGHT_DISTRIBUTION: &str = "3";
/// Fixed code design: probability propagation passes per block.
const ITERATIONS: u32 = 25;

/// Spreads packed payload bytes into codeword bits, one byte per bit,
/// most significant bit first.
fn unpack_data(src: &[u8], dst: &mut [u8]) {
    debug_assert_eq!(dst.len(), src.len() * 8);
    for (i, &byte) in src.iter().enumerate() {
        for k in 0..8 {
            dst[i * 8 + k] = byte >> (7 - k) & 1;
        }
    }
}

/// Packs a stream of bits (one byte per bit) back into payload bytes; the
/// exact inverse of [`unpack_data`].
fn pack_data(src: &[u8], dst: &mut [u8]) {
    debug_assert_eq!(src.len(), dst.len() * 8);
    for (i, byte) in dst.iter_mut().enumerate() {
        let mut packed = 0;
        for k in 0..8 {
            packed |= (src[i * 8 + k] & 1) << (7 - k);
        }
        *byte = packed;
    }
}

/// Error-correcting codec over a low-density parity-check code.
///
/// Requires the properties `message_size` and `parity_size`, both in bytes.
/// The code itself is fixed: seed 1, three 1s per column balanced over rows
/// and columns, length-4 cycles eliminated, dense generator, 25 decoder
/// iterations. The parity-check and generator matrices are immutable after
/// construction.
pub struct LdpcCodec {
    h: Mod2Sparse,
    graph: Graph,
    generator: GeneratorMatrix,
    iterations: u32,
    decoded_block_size: usize,
    encoded_block_size: usize,
    decoded_data_size: usize,
    encoded_data_size: usize,
}

impl LdpcCodec {
    /// Creates an LDPC codec from the property bag.
    pub fn new(properties: &Properties, _config: &Config) -> Result<Self> {
        let message_bytes = require_uint(properties, PROP_MESSAGE_SIZE)?;
        let parity_bytes = require_uint(properties, PROP_PARITY_SIZE)?;

        let message_bits = message_bytes as usize * 8;
        let parity_bits = parity_bytes as usize * 8;

        let d = Distribution::from_spec(WEIGHT_DISTRIBUTION)?;
        let h = pchk::make(
            SEED,
            PchkMethod::EvenBoth,
            &d,
            true,
            parity_bits,
            parity_bits + message_bits,
        )?;
        let generator = GeneratorMatrix::make_dense(&h);
        let graph = Graph::new(&h);

        let decoded_block_size = message_bits / 8;
        let encoded_block_size = message_bits + parity_bits;

        Ok(Self {
            h,
            graph,
            generator,
            iterations: ITERATIONS,
            decoded_block_size,
            encoded_block_size,
            decoded_data_size: decoded_block_size,
            encoded_data_size: encoded_block_size,
        })
    }

    fn blocks(&self) -> usize {
        self.encoded_data_size / self.encoded_block_size
    }
}

fn require_uint(properties: &Properties, name: &'static str) -> Result<u32> {
    match properties.get(name) {
        None => {
            error!("({CODEC_NAME}) required property '{name}' not set");
            Err(UnboxError::MissingProperty(name))
        }
        Some(value) => value.as_uint().ok_or_else(|| {
            error!("({CODEC_NAME}) property '{name}' is not an unsigned integer");
            UnboxError::InvalidProperty(name)
        }),
    }
}

impl Codec for LdpcCodec {
    fn name(&self) -> &'static str {
        CODEC_NAME
    }

    fn is_error_correcting(&self) -> bool {
        true
    }

    fn decoded_block_size(&self) -> usize {
        self.decoded_block_size
    }

    fn encoded_block_size(&self) -> usize {
        self.encoded_block_size
    }

    fn decoded_symbol_size(&self) -> usize {
        8
    }

    fn encoded_symbol_size(&self) -> usize {
        1
    }

    fn decoded_data_size(&self) -> usize {
        self.decoded_data_size
    }

    fn encoded_data_size(&self) -> usize {
        self.encoded_data_size
    }

    fn init_capacity(&mut self, size: usize) -> Result<()> {
        let blocks = size / self.encoded_block_size;
        if blocks == 0 {
            return Err(UnboxError::Capacity {
                size,
                overhead: self.encoded_block_size,
            });
        }
        // A trailing partial block cannot carry a codeword and is dropped.
        self.encoded_data_size = blocks * self.encoded_block_size;
        self.decoded_data_size = blocks * self.decoded_block_size;
        Ok(())
    }

    fn encode(&self, data: &mut BytesMut) -> Result<()> {
        if data.len() < self.decoded_data_size {
            return Err(UnboxError::InvalidInput(format!(
                "encode input holds {} bytes, capacity needs {}",
                data.len(),
                self.decoded_data_size
            )));
        }

        let mut encoded = BytesMut::zeroed(self.encoded_data_size);
        let mut unpacked = vec![0u8; self.decoded_block_size * 8];

        for b in 0..self.blocks() {
            let src = &data[b * self.decoded_block_size..][..self.decoded_block_size];
            unpack_data(src, &mut unpacked);

            let cblk = &mut encoded[b * self.encoded_block_size..][..self.encoded_block_size];
            self.generator.encode(&self.h, &unpacked, cblk)?;
        }

        *data = encoded;
        Ok(())
    }

    fn decode(
        &self,
        data: &mut BytesMut,
        _erasures: Option<&[u8]>,
        stats: &mut DecodeStats,
    ) -> Result<()> {
        if data.len() < self.encoded_data_size {
            return Err(UnboxError::InvalidInput(format!(
                "decode input holds {} bytes, capacity needs {}",
                data.len(),
                self.encoded_data_size
            )));
        }

        let n = self.generator.n();
        let m = self.generator.m();
        let cols = self.generator.cols();

        let mut decoded = BytesMut::zeroed(self.decoded_data_size);
        let mut ws = Workspace::new(&self.graph);
        let mut lratio = vec![0.0; n];
        let mut hard = vec![0u8; n];
        let mut data_block = vec![0u8; n - m];
        let mut failed_checks = 0u32;

        for b in 0..self.blocks() {
            let src = &data[b * self.encoded_block_size..][..self.encoded_block_size];

            // Stream bytes are log-likelihood ratios in tenths of a nat.
            for (bit, &raw) in src.iter().enumerate() {
                lratio[bit] = f64::from(raw as i8 as f32 / 10.0).exp();
                hard[bit] = u8::from(lratio[bit] > 1.0);
            }

            prp::decode_prprp(&self.graph, &lratio, &mut ws, self.iterations);

            let alterations = hard
                .iter()
                .zip(&ws.dblk)
                .filter(|(h, d)| h != d)
                .count() as u32;

            for (k, &c) in cols[m..].iter().enumerate() {
                data_block[k] = ws.dblk[c];
            }

            let unsatisfied: u32 = ws.pchk.iter().map(|&p| u32::from(p)).sum();
            if unsatisfied != 0 {
                stats.unresolved_errors += alterations;
                failed_checks += unsatisfied;
            } else {
                stats.resolved_errors += alterations;
            }

            pack_data(
                &data_block,
                &mut decoded[b * self.decoded_block_size..][..self.decoded_block_size],
            );
        }

        *data = decoded;
        if failed_checks != 0 {
            return Err(UnboxError::Unverified(failed_checks));
        }
        Ok(())
    }
}
