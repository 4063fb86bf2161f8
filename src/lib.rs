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


//! # unboxing
//!
//! A decoder for binary payloads stored as pixel patterns in archival film
//! frames.
//!
//! Each grayscale frame encodes a block of bytes together with
//! error-correction overhead. This library implements the decode path for a
//! single frame: an adaptive equalizer turns the raw image into symbol
//! indices, and a pipeline of block codecs (LDPC error correction, CRC-64
//! integrity check) turns the symbols back into the original bytes.
//!
//! ## Features
//!
//! - **Adaptive equalization**: per-tile 5x5 LMS filter fit tolerating
//!   illumination drift across the frame
//! - **LDPC error correction**: randomized sparse parity-check construction
//!   with 4-cycle elimination and a probability-propagation decoder
//! - **CRC-64 integrity**: trailing big-endian checksum with configurable
//!   polynomial and seed
//! - **Composable pipelines**: codecs chain in a fixed order with precise
//!   per-step decode statistics
//! - **No shared state**: decoder instances are independent; frames can be
//!   processed concurrently from separate threads
//!
//! ## Quick Start
//!
//! ```no_run
//! use unboxing::codec::{
//!     create_codec, CodecPipeline, Config, Properties, PropertyValue,
//! };
//! use unboxing::{Image8, Unboxer, UnboxerParameters};
//!
//! fn main() -> unboxing::Result<()> {
//!     let config = Config::new();
//!
//!     let mut crc = Properties::new();
//!     crc.insert("polynom".into(), PropertyValue::ULongLong(0x42F0E1EBA9EA3693));
//!     crc.insert("seed".into(), PropertyValue::ULongLong(0));
//!
//!     let mut ldpc = Properties::new();
//!     ldpc.insert("message_size".into(), PropertyValue::Uint(200));
//!     ldpc.insert("parity_size".into(), PropertyValue::Uint(200));
//!
//!     let pipeline = CodecPipeline::new(vec![
//!         create_codec("CRC64", &crc, &config)?,
//!         create_codec("LDPC", &ldpc, &config)?,
//!     ]);
//!
//!     let mut unboxer = Unboxer::new(UnboxerParameters::default(), pipeline)?;
//!     let frame = Image8::new(1024, 540); // pixels from your frame reader
//!     let decoded = unboxer.unbox(&frame)?;
//!     println!("recovered {} bytes", decoded.payload.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! grayscale frame image
//!          |
//!          v
//! +-------------------+     per-tile symbol means
//! | adaptive equalizer| <-- (measured or supplied)
//! +-------------------+
//!          |  symbol indices
//!          v
//! +-------------------+
//! |   codec pipeline  |  decode order: LDPC -> CRC-64
//! +-------------------+
//!          |
//!          v
//!   payload + statistics
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod equalizer;
pub mod error;
pub mod image;
pub mod matrix;
pub mod strutil;
pub mod unboxer;
pub mod viewport;

// Re-exports
pub use codec::{Codec, CodecPipeline, DecodeStats};
pub use error::{Result, UnboxError};
pub use image::Image8;
pub use matrix::{FilterCoeff2d, FloatMatrix, MultipageFloatMatrix};
pub use unboxer::{UnboxedFrame, Unboxer, UnboxerParameters};
pub use viewport::{Viewport, ViewportMut};
