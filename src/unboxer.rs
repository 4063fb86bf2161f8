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

//! Single-frame decode driver.
//!
//! Ties the stages of the decode path together: the frame image is
//! equalized into symbol indices, the symbols become the outermost codec's
//! encoded stream, and the codec pipeline peels its layers off in reverse
//! construction order. Distinct driver instances share no mutable state and
//! can run on separate threads.

use crate::codec::{CodecPipeline, DecodeStats};
use crate::equalizer::{equalize, measure_symbol_means};
use crate::error::{Result, UnboxError};
use crate::image::Image8;
use bytes::BytesMut;
use log::debug;

/// Frame-level decode settings.
///
/// Construction zero-initializes the whole record before the defaults are
/// applied, so unset fields can never carry stale values.
#[derive(Debug, Clone)]
pub struct UnboxerParameters {
    /// Distinct gray levels encoded per pixel.
    pub symbols_per_pixel: usize,
    /// Equalizer tile width in pixels.
    pub block_width: usize,
    /// Equalizer tile height in pixels.
    pub block_height: usize,
    /// LLR magnitude, in tenths of a nat, given to each equalized symbol
    /// when the outermost codec consumes soft bits. The default asserts
    /// one nat per symbol; at that level a clean frame verifies but
    /// propagation cannot overturn a stray equalizer flip. Raise towards
    /// 100 (10 nats) to let the error correction repair such flips.
    pub llr_confidence: i8,
}

impl Default for UnboxerParameters {
    fn default() -> Self {
        Self {
            symbols_per_pixel: 2,
            block_width: 64,
            block_height: 64,
            llr_confidence: 10,
        }
    }
}

/// The result of a successful frame decode.
#[derive(Debug)]
pub struct UnboxedFrame {
    /// The recovered payload bytes.
    pub payload: BytesMut,
    /// Statistics accumulated across the codec pipeline.
    pub stats: DecodeStats,
}

/// Decodes data frames with a fixed parameter set and codec pipeline.
pub struct Unboxer {
    params: UnboxerParameters,
    pipeline: CodecPipeline,
}

impl Unboxer {
    /// Creates a frame decoder.
    ///
    /// The pipeline must hold at least one codec. Only binary symbol
    /// alphabets are supported; demapping wider symbol alphabets onto bit
    /// codecs belongs to the format layer.
    pub fn new(params: UnboxerParameters, pipeline: CodecPipeline) -> Result<Self> {
        if pipeline.is_empty() {
            return Err(UnboxError::Config("codec pipeline is empty".to_owned()));
        }
        if params.symbols_per_pixel != 2 {
            return Err(UnboxError::Config(format!(
                "{} symbols per pixel not supported, frames must be binary",
                params.symbols_per_pixel
            )));
        }
        if params.block_width == 0 || params.block_height == 0 || params.llr_confidence <= 0 {
            return Err(UnboxError::Config(
                "block size and LLR confidence must be positive".to_owned(),
            ));
        }
        Ok(Self { params, pipeline })
    }

    /// Decodes one frame image into its payload.
    ///
    /// The image must already be cropped to the logical data area. The
    /// pipeline is re-sized to the frame's symbol capacity on every call,
    /// so one driver can decode frames of varying geometry.
    pub fn unbox(&mut self, image: &Image8) -> Result<UnboxedFrame> {
        if image.width() == 0 || image.height() == 0 {
            return Err(UnboxError::InvalidInput(
                "frame image has no pixels".to_owned(),
            ));
        }

        let p = &self.params;
        let means =
            measure_symbol_means(image, p.block_width, p.block_height, p.symbols_per_pixel)?;
        let mut symbols = Image8::new(image.width(), image.height());
        equalize(
            &mut symbols,
            image,
            &means,
            p.symbols_per_pixel,
            p.block_width,
            p.block_height,
        )?;

        let mut data = self.symbol_stream(&symbols)?;
        debug!(
            "frame {}x{} yields {} encoded stream bytes",
            image.width(),
            image.height(),
            data.len()
        );

        self.pipeline.init_capacity(data.len())?;
        let mut stats = DecodeStats::default();
        self.pipeline.decode(&mut data, None, &mut stats)?;

        Ok(UnboxedFrame {
            payload: data,
            stats,
        })
    }

    /// Turns the equalized symbol image into the outermost codec's encoded
    /// stream.
    ///
    /// Codecs with 1-bit encoded symbols take one stream byte per pixel:
    /// soft log-likelihood ratios when the codec corrects errors, plain 0/1
    /// bits otherwise. Codecs with byte-wide symbols take the pixels packed
    /// eight to a byte, most significant bit first.
    fn symbol_stream(&self, symbols: &Image8) -> Result<BytesMut> {
        let outer = self
            .pipeline
            .outermost()
            .ok_or_else(|| UnboxError::Config("codec pipeline is empty".to_owned()))?;

        let mut bits = Vec::with_capacity(symbols.width() * symbols.height());
        for y in 0..symbols.height() {
            bits.extend_from_slice(symbols.row(y));
        }

        match outer.encoded_symbol_size() {
            1 if outer.is_error_correcting() => {
                let confidence = self.params.llr_confidence;
                let llr: Vec<u8> = bits
                    .iter()
                    .map(|&b| (if b != 0 { confidence } else { -confidence }) as u8)
                    .collect();
                Ok(BytesMut::from(&llr[..]))
            }
            1 => Ok(BytesMut::from(&bits[..])),
            8 => {
                let mut packed = BytesMut::zeroed(bits.len() / 8);
                for (i, byte) in packed.iter_mut().enumerate() {
                    let mut b = 0;
                    for k in 0..8 {
                        b |= (bits[i * 8 + k] & 1) << (7 - k);
                    }
                    *byte = b;
                }
                Ok(packed)
            }
            other => Err(UnboxError::Config(format!(
                "unsupported encoded symbol size {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{
        create_codec, Config, Properties, PropertyValue, PROP_MESSAGE_SIZE, PROP_PARITY_SIZE,
        PROP_POLYNOM, PROP_SEED,
    };

    const LOW: u8 = 60;
    const HIGH: u8 = 190;

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

    /// Encodes a payload and paints the bit stream as a 16x16 frame.
    fn synthesize_frame(payload: &[u8; 8]) -> Image8 {
        let mut pipeline = frame_pipeline();
        pipeline.init_capacity(256).unwrap();

        let mut data = BytesMut::from(&payload[..]);
        pipeline.encode(&mut data).unwrap();
        assert_eq!(data.len(), 256);

        let mut image = Image8::new(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                image.row_mut(y)[x] = if data[y * 16 + x] != 0 { HIGH } else { LOW };
            }
        }
        image
    }

    fn test_params() -> UnboxerParameters {
        UnboxerParameters {
            block_width: 16,
            block_height: 16,
            ..UnboxerParameters::default()
        }
    }

    #[test]
    fn test_clean_frame_decodes_to_payload() {
        let image = synthesize_frame(b"archival");
        let mut unboxer = Unboxer::new(test_params(), frame_pipeline()).unwrap();

        let frame = unboxer.unbox(&image).unwrap();
        assert_eq!(&frame.payload[..], b"archival");
        assert_eq!(frame.stats.unresolved_errors, 0);
    }

    #[test]
    fn test_flipped_pixels_are_corrected() {
        let mut image = synthesize_frame(b"archival");
        // Invert two data pixels; the error correction absorbs them.
        for x in [3, 11] {
            let p = image.row(5)[x];
            image.row_mut(5)[x] = if p == LOW { HIGH } else { LOW };
        }

        // Repairing flips needs saturated symbol confidences.
        let params = UnboxerParameters {
            llr_confidence: 100,
            ..test_params()
        };
        let mut unboxer = Unboxer::new(params, frame_pipeline()).unwrap();
        let frame = unboxer.unbox(&image).unwrap();

        assert_eq!(&frame.payload[..], b"archival");
        assert!(frame.stats.resolved_errors >= 2);
    }

    #[test]
    fn test_decoder_instances_are_independent() {
        let image = synthesize_frame(b"12345678");
        let mut a = Unboxer::new(test_params(), frame_pipeline()).unwrap();
        let mut b = Unboxer::new(test_params(), frame_pipeline()).unwrap();

        let fa = a.unbox(&image).unwrap();
        let fb = b.unbox(&image).unwrap();
        assert_eq!(&fa.payload[..], &fb.payload[..]);
    }

    #[test]
    fn test_configuration_errors_are_rejected() {
        assert!(matches!(
            Unboxer::new(test_params(), CodecPipeline::new(Vec::new())),
            Err(UnboxError::Config(_))
        ));

        let params = UnboxerParameters {
            symbols_per_pixel: 4,
            ..test_params()
        };
        assert!(matches!(
            Unboxer::new(params, frame_pipeline()),
            Err(UnboxError::Config(_))
        ));

        let params = UnboxerParameters {
            llr_confidence: 0,
            ..test_params()
        };
        assert!(matches!(
            Unboxer::new(params, frame_pipeline()),
            Err(UnboxError::Config(_))
        ));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let mut unboxer = Unboxer::new(test_params(), frame_pipeline()).unwrap();
        let image = Image8::new(0, 0);
        assert!(matches!(
            unboxer.unbox(&image),
            Err(UnboxError::InvalidInput(_))
        ));
    }
}
