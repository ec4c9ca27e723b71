use std::sync::Arc;

use parking_lot::Mutex;

pub const BACKGROUND: u8 = 255;
pub const INK: u8 = 0;

pub type SharedCanvas = Arc<Mutex<Canvas>>;

/// Row span of the ink pixels in one column, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkExtent {
    pub top: usize,
    pub bottom: usize,
}

/// Single-channel bitmap, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![BACKGROUND; width * height],
        }
    }

    pub fn shared(width: usize, height: usize) -> SharedCanvas {
        Arc::new(Mutex::new(Self::new(width, height)))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn clear(&mut self) {
        self.pixels.fill(BACKGROUND);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = value;
        }
    }

    /// Paint rows `top..=bottom` of column `x`, clipped to the canvas.
    pub fn fill_column(&mut self, x: usize, top: usize, bottom: usize, value: u8) {
        if x >= self.width || self.height == 0 {
            return;
        }
        let bottom = bottom.min(self.height - 1);
        for y in top..=bottom {
            self.pixels[y * self.width + x] = value;
        }
    }

    /// Ink a `thickness`-wide vertical segment centred on `x`.
    pub fn draw_bar(&mut self, x: usize, top: usize, bottom: usize, thickness: usize) {
        let left = x.saturating_sub(thickness / 2);
        for column in left..left + thickness.max(1) {
            self.fill_column(column, top, bottom, INK);
        }
    }

    pub fn ink_extent(&self, x: usize) -> Option<InkExtent> {
        if x >= self.width {
            return None;
        }
        let mut rows = (0..self.height).filter(|&y| self.pixels[y * self.width + x] == INK);
        let top = rows.next()?;
        let bottom = rows.last().unwrap_or(top);
        Some(InkExtent { top, bottom })
    }

    pub fn draw_marker(&mut self, x: usize) {
        if self.height > 0 {
            self.fill_column(x, 0, self.height - 1, INK);
        }
    }

    /// Wipe a marker column and put the waveform ink back.
    pub fn restore_column(&mut self, x: usize, extent: Option<InkExtent>) {
        if self.height == 0 {
            return;
        }
        self.fill_column(x, 0, self.height - 1, BACKGROUND);
        if let Some(InkExtent { top, bottom }) = extent {
            self.fill_column(x, top, bottom, INK);
        }
    }

    /// Expand to RGBA8 for upload.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.pixels.len() * 4);
        for &value in &self.pixels {
            rgba.extend_from_slice(&[value, value, value, 255]);
        }
        rgba
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_columns_have_no_extent() {
        let canvas = Canvas::new(4, 6);
        assert_eq!(canvas.ink_extent(1), None);
        assert_eq!(canvas.ink_extent(9), None);
    }

    #[test]
    fn extent_spans_first_and_last_ink_rows() {
        let mut canvas = Canvas::new(4, 10);
        canvas.fill_column(2, 3, 6, INK);
        assert_eq!(canvas.ink_extent(2), Some(InkExtent { top: 3, bottom: 6 }));

        canvas.set(2, 8, INK);
        assert_eq!(canvas.ink_extent(2), Some(InkExtent { top: 3, bottom: 8 }));
    }

    #[test]
    fn restore_undoes_a_marker() {
        let mut canvas = Canvas::new(3, 8);
        canvas.fill_column(1, 2, 5, INK);
        let before = canvas.clone();
        let extent = canvas.ink_extent(1);

        canvas.draw_marker(1);
        assert_eq!(canvas.ink_extent(1), Some(InkExtent { top: 0, bottom: 7 }));

        canvas.restore_column(1, extent);
        assert_eq!(canvas, before);
    }

    #[test]
    fn bars_are_centred_and_clipped() {
        let mut canvas = Canvas::new(5, 5);
        canvas.draw_bar(0, 1, 9, 3);
        assert_eq!(canvas.ink_extent(0), Some(InkExtent { top: 1, bottom: 4 }));
        assert_eq!(canvas.ink_extent(1), Some(InkExtent { top: 1, bottom: 4 }));
        assert_eq!(canvas.ink_extent(2), Some(InkExtent { top: 1, bottom: 4 }));
        assert_eq!(canvas.ink_extent(3), None);

        let mut canvas = Canvas::new(5, 5);
        canvas.draw_bar(2, 2, 2, 3);
        assert_eq!(canvas.ink_extent(1), Some(InkExtent { top: 2, bottom: 2 }));
        assert_eq!(canvas.ink_extent(3), Some(InkExtent { top: 2, bottom: 2 }));
        assert_eq!(canvas.ink_extent(4), None);
    }

    #[test]
    fn rgba_is_grey_and_opaque() {
        let mut canvas = Canvas::new(2, 1);
        canvas.set(1, 0, INK);
        assert_eq!(canvas.to_rgba(), vec![255, 255, 255, 255, 0, 0, 0, 255]);
    }
}
