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

//! Block codec implementations and their composition.
//!
//! A codec turns a stream of decoded blocks into encoded blocks and back.
//! Codecs are configured from a property bag at construction time, sized
//! with [`Codec::init_capacity`], and chained into a [`pipeline::CodecPipeline`]
//! that applies them in construction order on encode and in reverse on
//! decode.

use crate::error::{Result, UnboxError};
use crate::strutil;
use bytes::BytesMut;
use std::collections::HashMap;

pub mod crc64;
pub mod ldpc;
pub mod pipeline;

// Re-export codec implementations
pub use crc64::Crc64Codec;
pub use ldpc::LdpcCodec;
pub use pipeline::CodecPipeline;

/// Property name for the CRC-64 polynomial.
pub const PROP_POLYNOM: &str = "polynom";
/// Property name for the CRC-64 register seed.
pub const PROP_SEED: &str = "seed";
/// Property name for the LDPC message size in bytes.
pub const PROP_MESSAGE_SIZE: &str = "message_size";
/// Property name for the LDPC parity size in bytes.
pub const PROP_PARITY_SIZE: &str = "parity_size";

/// A tagged codec property value.
///
/// Format descriptors carry properties as text, so every numeric accessor
/// also accepts a [`PropertyValue::Str`] holding a plain decimal number.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// 32-bit unsigned integer.
    Uint(u32),
    /// 64-bit unsigned integer.
    ULongLong(u64),
    /// Double-precision float.
    Double(f64),
    /// Text value.
    Str(String),
}

impl PropertyValue {
    /// The value as a 32-bit unsigned integer, if representable.
    pub fn as_uint(&self) -> Option<u32> {
        self.as_ulonglong().and_then(|v| u32::try_from(v).ok())
    }

    /// The value as a 64-bit unsigned integer, if representable.
    pub fn as_ulonglong(&self) -> Option<u64> {
        match self {
            Self::Uint(v) => Some(u64::from(*v)),
            Self::ULongLong(v) => Some(*v),
            Self::Double(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as u64),
            Self::Double(_) => None,
            Self::Str(s) => strutil::to_integer(s),
        }
    }

    /// The value as a double, if representable.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Uint(v) => Some(f64::from(*v)),
            Self::ULongLong(v) => Some(*v as f64),
            Self::Double(v) => Some(*v),
            Self::Str(s) => s.parse().ok(),
        }
    }
}

/// A bag of named codec properties.
pub type Properties = HashMap<String, PropertyValue>;

/// A read-only bag of global settings handed to codec constructors.
///
/// The supplied codecs take their parameters from the property bag and do
/// not consult the config; it is threaded through for codecs that do.
pub type Config = HashMap<String, PropertyValue>;

/// Statistics accumulated while decoding.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DecodeStats {
    /// Codec-specific forward-error-correction bookkeeping.
    pub fec_accumulated_amount: f32,
    /// Weight of the accumulated FEC amount.
    pub fec_accumulated_weight: f32,
    /// Bit errors the error correction managed to repair.
    pub resolved_errors: u32,
    /// Bit alterations left in blocks whose parity never verified.
    pub unresolved_errors: u32,
}

impl DecodeStats {
    /// Folds the statistics of one codec invocation into the totals.
    pub fn accumulate(&mut self, step: &DecodeStats) {
        self.fec_accumulated_amount += step.fec_accumulated_amount;
        self.fec_accumulated_weight += step.fec_accumulated_weight;
        self.resolved_errors += step.resolved_errors;
        self.unresolved_errors += step.unresolved_errors;
    }
}

/// Trait defining the interface for block codec implementations.
///
/// A codec works on fixed-size blocks: `decoded_block_size` bytes of payload
/// map to `encoded_block_size` bytes on the wire. Data vectors may span
/// several blocks; [`Codec::init_capacity`] fixes the total encoded size and
/// derives the total decoded size. Encode and decode replace the vector
/// contents rather than transforming in place, so a codec controls the
/// storage sizing of its output.
pub trait Codec: Send {
    /// Codec name as used by [`create_codec`].
    fn name(&self) -> &'static str;

    /// Whether the codec can repair corrupted symbols.
    fn is_error_correcting(&self) -> bool;

    /// Payload bytes per block.
    fn decoded_block_size(&self) -> usize;

    /// Encoded bytes per block.
    fn encoded_block_size(&self) -> usize;

    /// Bits carried by one decoded element.
    fn decoded_symbol_size(&self) -> usize;

    /// Bits carried by one encoded element.
    fn encoded_symbol_size(&self) -> usize;

    /// Total payload bytes across all blocks of the current capacity.
    fn decoded_data_size(&self) -> usize;

    /// Total encoded bytes across all blocks of the current capacity.
    fn encoded_data_size(&self) -> usize;

    /// Configures the codec for an encoded stream of `size` bytes.
    ///
    /// Fails with [`UnboxError::Capacity`] when `size` is smaller than the
    /// codec overhead; no state changes in that case.
    fn init_capacity(&mut self, size: usize) -> Result<()>;

    /// Adjusts a named property after construction.
    ///
    /// The default implementation accepts and ignores everything, matching
    /// codecs whose parameters are fixed at construction time.
    fn set_property(&mut self, _name: &str, _value: &PropertyValue) -> Result<()> {
        Ok(())
    }

    /// Replaces `decoded_data_size` payload bytes with the encoded block
    /// stream of `encoded_data_size` bytes.
    fn encode(&self, data: &mut BytesMut) -> Result<()>;

    /// Replaces an encoded block stream with the decoded payload.
    ///
    /// `erasures`, when present, flags erased symbols in a vector parallel
    /// to `data`; codecs that cannot use it ignore it. Statistics for this
    /// invocation are written to `stats` even when decoding fails.
    fn decode(
        &self,
        data: &mut BytesMut,
        erasures: Option<&[u8]>,
        stats: &mut DecodeStats,
    ) -> Result<()>;
}

/// Creates a codec instance of the named kind.
///
/// Supported names are [`crc64::CODEC_NAME`] and [`ldpc::CODEC_NAME`].
/// Construction fails when a required property is missing from the bag or
/// the codec cannot be built from the given parameters.
pub fn create_codec(
    name: &str,
    properties: &Properties,
    config: &Config,
) -> Result<Box<dyn Codec>> {
    match name {
        crc64::CODEC_NAME => Ok(Box::new(Crc64Codec::new(properties, config)?)),
        ldpc::CODEC_NAME => Ok(Box::new(LdpcCodec::new(properties, config)?)),
        _ => Err(UnboxError::UnknownCodec(name.to_owned())),
    }
}
