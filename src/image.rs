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

//! 8-bit grayscale frame buffers.

use crate::error::{Result, UnboxError};

/// A row-major 8-bit grayscale image.
///
/// Scanlines are `stride` bytes apart; `stride` defaults to `width` and only
/// the first `width` bytes of each scanline carry pixels. After equalization
/// the pixel values are symbol indices rather than gray levels.
#[derive(Debug, Clone)]
pub struct Image8 {
    width: usize,
    height: usize,
    stride: usize,
    data: Vec<u8>,
}

impl Image8 {
    /// Creates a zero-filled image with contiguous scanlines.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            stride: width,
            data: vec![0; width * height],
        }
    }

    /// Wraps an existing pixel buffer with contiguous scanlines.
    ///
    /// Fails when the buffer holds fewer than `width * height` bytes or a
    /// dimension is zero.
    pub fn from_vec(data: Vec<u8>, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(UnboxError::InvalidInput(
                "image dimensions must be nonzero".to_owned(),
            ));
        }
        if data.len() < width * height {
            return Err(UnboxError::InvalidInput(format!(
                "pixel buffer holds {} bytes, {}x{} image needs {}",
                data.len(),
                width,
                height,
                width * height
            )));
        }
        Ok(Self {
            width,
            height,
            stride: width,
            data,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Distance between the starts of consecutive scanlines, in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The pixels of scanline `y`.
    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.stride..y * self.stride + self.width]
    }

    /// Mutable access to the pixels of scanline `y`.
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        &mut self.data[y * self.stride..y * self.stride + self.width]
    }

    /// The whole backing buffer, including any stride padding.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the whole backing buffer.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let img = Image8::new(4, 3);
        assert_eq!(img.width(), 4);
        assert_eq!(img.height(), 3);
        assert_eq!(img.stride(), 4);
        assert!(img.as_slice().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(Image8::from_vec(vec![0; 11], 4, 3).is_err());
        assert!(Image8::from_vec(vec![0; 12], 4, 3).is_ok());
        assert!(Image8::from_vec(vec![0; 12], 0, 3).is_err());
    }

    #[test]
    fn test_row_access() {
        let mut img = Image8::new(3, 2);
        img.row_mut(1).copy_from_slice(&[7, 8, 9]);
        assert_eq!(img.row(0), &[0, 0, 0]);
        assert_eq!(img.row(1), &[7, 8, 9]);
    }
}
