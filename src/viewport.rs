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

//! Windowed two-dimensional views over typed linear buffers.
//!
//! A viewport gives filters and codecs access to an arbitrary rectangular
//! section of a two-dimensional buffer without owning it. The buffer itself
//! is a one-dimensional slice of elements; scanlines are `scanline_size`
//! elements apart and only the leading `buffer_width` elements of each
//! scanline carry data.
//!
//! [`Viewport`] is the shared (read-only) view, [`ViewportMut`] the
//! exclusive one. Both keep the same window geometry; the window can be
//! moved and resized with [`Viewport::set_view`], which clamps silently to
//! the buffer bounds and never fails.

/// Window geometry shared by the read-only and mutable viewports.
#[derive(Debug, Clone, Copy)]
struct View {
    buffer_width: usize,
    buffer_height: usize,
    scanline_size: usize,
    width: usize,
    height: usize,
    x_offset: usize,
    y_offset: usize,
}

fn clamp(min: i64, max: i64, value: i64) -> i64 {
    value.max(min).min(max)
}

impl View {
    fn new(buffer_len: usize, width: usize, height: usize, scanline_size: usize) -> Option<Self> {
        if width == 0 || height == 0 || scanline_size == 0 {
            return None;
        }
        if width > scanline_size || buffer_len < scanline_size * height {
            return None;
        }
        Some(Self {
            buffer_width: width,
            buffer_height: height,
            scanline_size,
            width,
            height,
            x_offset: 0,
            y_offset: 0,
        })
    }

    fn reset(&mut self) {
        self.width = self.buffer_width;
        self.height = self.buffer_height;
        self.x_offset = 0;
        self.y_offset = 0;
    }

    fn set_view(&mut self, width: i32, height: i32, dx: i32, dy: i32) {
        // A negative size means "to the end", measured from the offset the
        // view had when the call was made.
        let width = if width < 0 {
            (self.buffer_width - self.x_offset) as i64
        } else {
            i64::from(width)
        };
        let height = if height < 0 {
            (self.buffer_height - self.y_offset) as i64
        } else {
            i64::from(height)
        };

        self.x_offset = clamp(
            0,
            self.buffer_width as i64,
            self.x_offset as i64 + i64::from(dx),
        ) as usize;
        self.y_offset = clamp(
            0,
            self.buffer_height as i64,
            self.y_offset as i64 + i64::from(dy),
        ) as usize;

        self.width = clamp(0, (self.buffer_width - self.x_offset) as i64, width) as usize;
        self.height = clamp(0, (self.buffer_height - self.y_offset) as i64, height) as usize;
    }

    /// Buffer index of the first element of view-row `y`.
    fn scanline_start(&self, y: usize) -> usize {
        debug_assert!(y < self.height);
        (y + self.y_offset) * self.scanline_size + self.x_offset
    }

    /// Buffer index of a view-relative element that may lie outside the
    /// view, as long as it stays inside the backing buffer.
    fn element_index(&self, x: isize, y: isize) -> usize {
        let row = y + self.y_offset as isize;
        let col = x + self.x_offset as isize;
        debug_assert!(row >= 0 && (row as usize) < self.buffer_height);
        debug_assert!(col >= 0 && (col as usize) < self.scanline_size);
        row as usize * self.scanline_size + col as usize
    }
}

/// A non-owning read-only window into a two-dimensional buffer of `T`.
#[derive(Debug)]
pub struct Viewport<'a, T> {
    buf: &'a [T],
    view: View,
}

impl<'a, T> Clone for Viewport<'a, T> {
    fn clone(&self) -> Self {
        Self {
            buf: self.buf,
            view: self.view,
        }
    }
}

impl<'a, T> Viewport<'a, T> {
    /// Creates a viewport spanning the whole buffer.
    ///
    /// `width` and `height` describe the buffer; `scanline_size` is the
    /// element distance between scanline starts and must be at least
    /// `width`. Returns `None` when a dimension is zero or the buffer is
    /// too short to hold `height` scanlines.
    pub fn new(buf: &'a [T], width: usize, height: usize, scanline_size: usize) -> Option<Self> {
        let view = View::new(buf.len(), width, height, scanline_size)?;
        Some(Self { buf, view })
    }

    /// Restores the view to the full buffer with zero offsets.
    pub fn reset(&mut self) {
        self.view.reset();
    }

    /// Moves the view by `(dx, dy)` and resizes it to `width` x `height`.
    ///
    /// Offsets are clamped to the buffer, then the size is clamped to the
    /// space remaining below the new offsets. Negative `width` or `height`
    /// selects everything to the buffer edge. Never fails.
    pub fn set_view(&mut self, width: i32, height: i32, dx: i32, dy: i32) {
        self.view.set_view(width, height, dx, dy);
    }

    /// The elements of view-row `y`, from the view's left edge to the end
    /// of the backing buffer.
    ///
    /// The slice deliberately extends past the view so that callers doing
    /// neighborhood arithmetic can read adjacent buffer data, exactly like
    /// walking a scanline pointer.
    pub fn scanline(&self, y: usize) -> &'a [T] {
        &self.buf[self.view.scanline_start(y)..]
    }

    /// Reads the element at view-relative `(x, y)`.
    ///
    /// The coordinates may leave the view (either side) as long as the
    /// addressed element stays inside the backing buffer; edge-extending
    /// filters rely on this.
    pub fn at(&self, x: isize, y: isize) -> T
    where
        T: Copy,
    {
        self.buf[self.view.element_index(x, y)]
    }

    /// Current view width.
    pub fn width(&self) -> usize {
        self.view.width
    }

    /// Current view height.
    pub fn height(&self) -> usize {
        self.view.height
    }

    /// Horizontal offset of the view inside the buffer.
    pub fn offset_x(&self) -> usize {
        self.view.x_offset
    }

    /// Vertical offset of the view inside the buffer.
    pub fn offset_y(&self) -> usize {
        self.view.y_offset
    }

    /// Width of the backing buffer.
    pub fn buffer_width(&self) -> usize {
        self.view.buffer_width
    }

    /// Height of the backing buffer.
    pub fn buffer_height(&self) -> usize {
        self.view.buffer_height
    }

    /// Element distance between consecutive scanline starts.
    pub fn scanline_size(&self) -> usize {
        self.view.scanline_size
    }

    /// Size of one buffer element in bytes.
    pub fn element_size(&self) -> usize {
        std::mem::size_of::<T>()
    }
}

/// A non-owning mutable window into a two-dimensional buffer of `T`.
///
/// Geometry behaves exactly like [`Viewport`]; writes are restricted to the
/// current view.
#[derive(Debug)]
pub struct ViewportMut<'a, T> {
    buf: &'a mut [T],
    view: View,
}

impl<'a, T> ViewportMut<'a, T> {
    /// Creates a mutable viewport spanning the whole buffer.
    ///
    /// Same failure rules as [`Viewport::new`].
    pub fn new(
        buf: &'a mut [T],
        width: usize,
        height: usize,
        scanline_size: usize,
    ) -> Option<Self> {
        let view = View::new(buf.len(), width, height, scanline_size)?;
        Some(Self { buf, view })
    }

    /// Restores the view to the full buffer with zero offsets.
    pub fn reset(&mut self) {
        self.view.reset();
    }

    /// Moves and resizes the view; see [`Viewport::set_view`].
    pub fn set_view(&mut self, width: i32, height: i32, dx: i32, dy: i32) {
        self.view.set_view(width, height, dx, dy);
    }

    /// Mutable access to the in-view elements of view-row `y`.
    pub fn scanline_mut(&mut self, y: usize) -> &mut [T] {
        let start = self.view.scanline_start(y);
        &mut self.buf[start..start + self.view.width]
    }

    /// Current view width.
    pub fn width(&self) -> usize {
        self.view.width
    }

    /// Current view height.
    pub fn height(&self) -> usize {
        self.view.height
    }

    /// Horizontal offset of the view inside the buffer.
    pub fn offset_x(&self) -> usize {
        self.view.x_offset
    }

    /// Vertical offset of the view inside the buffer.
    pub fn offset_y(&self) -> usize {
        self.view.y_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_rejects_degenerate_buffers() {
        let buf = vec![0u8; 100];
        assert!(Viewport::new(&buf, 0, 10, 10).is_none());
        assert!(Viewport::new(&buf, 10, 0, 10).is_none());
        assert!(Viewport::new(&buf, 10, 10, 0).is_none());
        assert!(Viewport::new(&buf, 11, 10, 10).is_none());
        assert!(Viewport::new(&buf, 10, 11, 10).is_none());
        assert!(Viewport::new(&buf, 10, 10, 10).is_some());
    }

    #[test]
    fn test_set_view_clamps_to_buffer() {
        let buf = vec![0u8; 100 * 100];
        let mut vp = Viewport::new(&buf, 100, 100, 100).unwrap();
        vp.reset();
        vp.set_view(50, 50, 80, 80);

        assert_eq!(vp.offset_x(), 80);
        assert_eq!(vp.offset_y(), 80);
        assert_eq!(vp.offset_x() + vp.width(), 100);
        assert_eq!(vp.offset_y() + vp.height(), 100);
    }

    #[test]
    fn test_scanline_points_into_view() {
        let mut buf = vec![0u8; 100 * 100];
        buf[80 * 100 + 80] = 42;
        let mut vp = Viewport::new(&buf, 100, 100, 100).unwrap();
        vp.set_view(50, 50, 80, 80);

        assert_eq!(vp.scanline(0)[0], 42);
    }

    #[test]
    fn test_scanline_walks_whole_buffer_rows() {
        let mut buf = vec![0u8; 8 * 4];
        buf[8] = 1; // (0, 1) of the buffer
        let mut vp = Viewport::new(&buf, 8, 4, 8).unwrap();
        vp.set_view(4, 4, 0, 0);

        // Walking scanline_size elements from (0, 0) lands on (0, 1).
        assert_eq!(vp.scanline(0)[vp.scanline_size()], 1);
    }

    #[test]
    fn test_negative_size_means_to_the_end() {
        let buf = vec![0u8; 100];
        let mut vp = Viewport::new(&buf, 10, 10, 10).unwrap();
        vp.set_view(-1, -1, 3, 4);

        assert_eq!(vp.offset_x(), 3);
        assert_eq!(vp.offset_y(), 4);
        assert_eq!(vp.width(), 7);
        assert_eq!(vp.height(), 6);
    }

    #[test]
    fn test_offsets_accumulate_and_reset() {
        let buf = vec![0u8; 100];
        let mut vp = Viewport::new(&buf, 10, 10, 10).unwrap();
        vp.set_view(4, 4, 2, 2);
        vp.set_view(4, 4, 2, 2);
        assert_eq!(vp.offset_x(), 4);
        assert_eq!(vp.offset_y(), 4);

        vp.reset();
        assert_eq!(vp.offset_x(), 0);
        assert_eq!(vp.width(), 10);
        assert_eq!(vp.height(), 10);
    }

    #[test]
    fn test_at_reads_outside_the_view() {
        let mut buf = vec![0u8; 10 * 10];
        buf[4 * 10 + 4] = 9; // (4, 4) of the buffer
        let mut vp = Viewport::new(&buf, 10, 10, 10).unwrap();
        vp.set_view(2, 2, 5, 5);

        // One element up-left of the view corner.
        assert_eq!(vp.at(-1, -1), 9);
    }

    #[test]
    fn test_mutable_rows_are_view_relative() {
        let mut buf = vec![0u8; 6 * 6];
        {
            let mut vp = ViewportMut::new(&mut buf, 6, 6, 6).unwrap();
            vp.set_view(2, 2, 3, 3);
            vp.scanline_mut(1).fill(5);
        }
        assert_eq!(buf[4 * 6 + 3], 5);
        assert_eq!(buf[4 * 6 + 4], 5);
        assert_eq!(buf[4 * 6 + 5], 0);
    }
}
