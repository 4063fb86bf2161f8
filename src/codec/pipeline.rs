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

//! Composition of codecs into a fixed processing order.
//!
//! Encode walks the codecs in construction order, so the first codec's
//! output feeds the second; decode walks them in reverse. The codec list is
//! fixed once the pipeline is built, only block capacities change.

use super::{Codec, DecodeStats};
use crate::error::Result;
use bytes::BytesMut;

/// An ordered chain of codecs applied as one unit.
pub struct CodecPipeline {
    codecs: Vec<Box<dyn Codec>>,
}

impl CodecPipeline {
    /// Builds a pipeline over the given codecs, in encode order.
    pub fn new(codecs: Vec<Box<dyn Codec>>) -> Self {
        Self { codecs }
    }

    /// Number of codecs in the chain.
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// The codec whose encoded output goes on the wire, if any.
    pub fn outermost(&self) -> Option<&dyn Codec> {
        self.codecs.last().map(|codec| &**codec)
    }

    /// Sizes the whole chain for an encoded stream of `size` bytes.
    ///
    /// Capacities propagate inward: the last codec is sized for the stream,
    /// each earlier codec for the decoded size of its successor. Fails when
    /// any codec cannot fit the size handed to it; earlier codecs in the
    /// walk keep the new capacity in that case.
    pub fn init_capacity(&mut self, size: usize) -> Result<()> {
        let mut size = size;
        for codec in self.codecs.iter_mut().rev() {
            codec.init_capacity(size)?;
            size = codec.decoded_data_size();
        }
        Ok(())
    }

    /// Total payload bytes the configured chain decodes to.
    pub fn decoded_data_size(&self) -> usize {
        self.codecs.first().map_or(0, |c| c.decoded_data_size())
    }

    /// Total encoded bytes the configured chain produces.
    pub fn encoded_data_size(&self) -> usize {
        self.codecs.last().map_or(0, |c| c.encoded_data_size())
    }

    /// Encodes `data` through every codec in construction order.
    pub fn encode(&self, data: &mut BytesMut) -> Result<()> {
        for codec in &self.codecs {
            codec.encode(data)?;
        }
        Ok(())
    }

    /// Decodes `data` through every codec in reverse construction order.
    ///
    /// Each codec gets a fresh per-step statistics record that is folded
    /// into `stats` when the step finishes, so upstream codecs cannot wipe
    /// what downstream ones reported. On failure the statistics collected
    /// so far are preserved and `data` holds the failing codec's output.
    pub fn decode(
        &self,
        data: &mut BytesMut,
        erasures: Option<&[u8]>,
        stats: &mut DecodeStats,
    ) -> Result<()> {
        for codec in self.codecs.iter().rev() {
            let mut step = DecodeStats::default();
            let result = codec.decode(data, erasures, &mut step);
            stats.accumulate(&step);
            result?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{
        create_codec, Config, Properties, PropertyValue, PROP_MESSAGE_SIZE, PROP_PARITY_SIZE,
        PROP_POLYNOM, PROP_SEED,
    };
    use crate::error::UnboxError;

    /// CRC-64 followed by LDPC, the decode chain of a data frame.
    fn frame_pipeline() -> CodecPipeline {
        let config = Config::new();

        let mut crc_props = Properties::new();
        crc_props.insert(
            PROP_POLYNOM.to_owned(),
            PropertyValue::ULongLong(0x42F0_E1EB_A9EA_3693),
        );
        crc_props.insert(PROP_SEED.to_owned(), PropertyValue::ULongLong(0));
        let crc = create_codec("CRC64", &crc_props, &config).unwrap();

        let mut ldpc_props = Properties::new();
        ldpc_props.insert(PROP_MESSAGE_SIZE.to_owned(), PropertyValue::Uint(16));
        ldpc_props.insert(PROP_PARITY_SIZE.to_owned(), PropertyValue::Uint(16));
        let ldpc = create_codec("LDPC", &ldpc_props, &config).unwrap();

        CodecPipeline::new(vec![crc, ldpc])
    }

    fn to_llr(bits: &BytesMut, confidence: i8) -> BytesMut {
        let llr: Vec<u8> = bits
            .iter()
            .map(|&b| (if b != 0 { confidence } else { -confidence }) as u8)
            .collect();
        BytesMut::from(&llr[..])
    }

    #[test]
    fn test_capacity_chains_inward() {
        let mut pipeline = frame_pipeline();
        // One LDPC block: 256 encoded stream bytes -> 16 payload+crc bytes
        // -> 8 payload bytes after the trailer.
        pipeline.init_capacity(256).unwrap();
        assert_eq!(pipeline.encoded_data_size(), 256);
        assert_eq!(pipeline.decoded_data_size(), 8);
    }

    #[test]
    fn test_round_trip_through_both_codecs() {
        let mut pipeline = frame_pipeline();
        pipeline.init_capacity(256).unwrap();

        let payload = *b"archival";
        let mut data = BytesMut::from(&payload[..]);
        pipeline.encode(&mut data).unwrap();
        assert_eq!(data.len(), 256);

        let mut llr = to_llr(&data, 10);
        let mut stats = DecodeStats::default();
        pipeline.decode(&mut llr, None, &mut stats).unwrap();

        assert_eq!(&llr[..], &payload[..]);
        assert_eq!(stats.unresolved_errors, 0);
    }

    #[test]
    fn test_corrected_bit_survives_crc_step() {
        let mut pipeline = frame_pipeline();
        pipeline.init_capacity(256).unwrap();

        let mut data = BytesMut::from(&b"archival"[..]);
        pipeline.encode(&mut data).unwrap();

        // Correcting a flip needs saturated bit confidences (10 nats).
        let mut llr = to_llr(&data, 100);
        llr[11] = (llr[11] as i8).wrapping_neg() as u8;

        let mut stats = DecodeStats::default();
        pipeline.decode(&mut llr, None, &mut stats).unwrap();

        assert_eq!(&llr[..], b"archival");
        // The CRC step resets only its own slice of the statistics; the
        // correction reported by the LDPC step survives in the totals.
        assert!(stats.resolved_errors >= 1);
    }

    #[test]
    fn test_payload_tamper_is_caught_by_crc() {
        let mut pipeline = frame_pipeline();
        pipeline.init_capacity(256).unwrap();

        // Forge a frame whose codeword is valid but whose trailer does not
        // match the payload: corrupt between the CRC and LDPC stages.
        let mut forged = BytesMut::from(&b"archival"[..]);
        pipeline.codecs[0].encode(&mut forged).unwrap();
        forged[0] ^= 0xFF;
        pipeline.codecs[1].encode(&mut forged).unwrap();

        let mut llr = to_llr(&forged, 10);
        let mut stats = DecodeStats::default();
        let result = pipeline.decode(&mut llr, None, &mut stats);
        assert!(matches!(result, Err(UnboxError::ChecksumMismatch)));
        // The LDPC layer itself decoded cleanly.
        assert_eq!(stats.unresolved_errors, 0);
    }

    #[test]
    fn test_outermost_is_the_wire_codec() {
        let pipeline = frame_pipeline();
        let outer = pipeline.outermost().unwrap();
        assert_eq!(outer.name(), "LDPC");
        assert_eq!(outer.encoded_symbol_size(), 1);
    }
}
