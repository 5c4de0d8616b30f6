/// Addressable 2D pixel surface sprites are painted onto.
pub trait RenderTarget {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Reset every pixel to fully transparent.
    fn clear(&mut self);
    /// Fill a block with a solid RGBA color. Out-of-bounds parts are clipped.
    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: u32);
}

/// CPU-side RGBA8 buffer, uploaded to the GPU when dirty.
pub struct PixelCanvas {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    dirty: bool,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; (width * height * 4) as usize],
            dirty: true,
        }
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.rgba
    }

    /// Packed `0xRRGGBBAA` at a pixel (0 when out of bounds).
    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        let i = ((y * self.width + x) * 4) as usize;
        u32::from_be_bytes([
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ])
    }

    /// Returns whether anything was painted since the last call, and resets.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

impl RenderTarget for PixelCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.rgba.fill(0);
        self.dirty = true;
    }

    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: u32) {
        let bytes = color.to_be_bytes();
        let x_end = (x + w).min(self.width);
        let y_end = (y + h).min(self.height);
        for py in y.min(y_end)..y_end {
            for px in x.min(x_end)..x_end {
                let i = ((py * self.width + px) * 4) as usize;
                self.rgba[i..i + 4].copy_from_slice(&bytes);
            }
        }
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_is_clipped() {
        let mut canvas = PixelCanvas::new(4, 4);
        canvas.fill_rect(3, 3, 5, 5, 0x11223344);
        assert_eq!(canvas.pixel(3, 3), 0x11223344);
        assert_eq!(canvas.pixel(2, 2), 0);
    }

    #[test]
    fn dirty_flag_resets() {
        let mut canvas = PixelCanvas::new(2, 2);
        assert!(canvas.take_dirty());
        assert!(!canvas.take_dirty());
        canvas.fill_rect(0, 0, 1, 1, 0xFF0000FF);
        assert!(canvas.take_dirty());
        canvas.clear();
        assert!(canvas.take_dirty());
        assert_eq!(canvas.pixel(0, 0), 0);
    }
}
