use std::collections::HashSet;
use std::path::Path;

use super::palette::Region;
use super::SpriteError;

/// Which variants a layer applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureTag {
    /// Applies to every variant.
    Base,
    /// Applies only to variants carrying this feature.
    Feature(&'static str),
}

/// Row-major grid of region indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<Region>,
}

impl Grid {
    pub fn transparent(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Region::Transparent; width * height],
        }
    }

    /// Build from rows of regions. Rows shorter than the widest are padded
    /// with `Transparent` on the right.
    #[cfg(test)]
    pub fn from_rows(rows: &[Vec<Region>]) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut grid = Self::transparent(width, rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, region) in row.iter().enumerate() {
                grid.set(x, y, *region);
            }
        }
        grid
    }

    pub fn get(&self, x: usize, y: usize) -> Region {
        self.cells[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, region: Region) {
        self.cells[y * self.width + x] = region;
    }

    fn row_is_empty(&self, y: usize) -> bool {
        (0..self.width).all(|x| self.get(x, y) == Region::Transparent)
    }
}

/// One pixel grid contributing to a composited frame.
#[derive(Debug, Clone)]
pub struct Layer {
    pub grid: Grid,
    pub tag: FeatureTag,
}

impl Layer {
    pub fn new(grid: Grid, tag: FeatureTag) -> Self {
        Self { grid, tag }
    }

    #[cfg(test)]
    pub fn base(grid: Grid) -> Self {
        Self::new(grid, FeatureTag::Base)
    }
}

/// Authoring key colors (RGB), one per region index starting at 1 (`Outline`).
const KEY_COLORS: [[u8; 3]; 15] = [
    [0x00, 0x00, 0x00], // Outline
    [0xFF, 0xFF, 0xFF], // Border
    [0x80, 0x80, 0x00], // Foot
    [0xFF, 0xFF, 0x00], // Beak
    [0x40, 0x40, 0x40], // Eye
    [0xFF, 0x00, 0x00], // Face
    [0x00, 0xFF, 0x00], // Hood
    [0xFF, 0x00, 0xFF], // Nose
    [0x00, 0xFF, 0xFF], // Belly
    [0x00, 0x80, 0x80], // Underbelly
    [0x00, 0x00, 0xFF], // Wing
    [0x00, 0x00, 0x80], // WingEdge
    [0xFF, 0x00, 0x80], // Heart
    [0x80, 0x00, 0x40], // HeartBorder
    [0xFF, 0xC0, 0xE0], // HeartShine
];

/// Alpha below this counts as an empty pixel.
const ALPHA_CUTOFF: u8 = 128;

/// A packed source image cut into fixed-width horizontal slices.
pub struct SpriteSheet {
    width: usize,
    height: usize,
    slice_width: usize,
    rgba: Vec<u8>,
}

impl SpriteSheet {
    pub fn from_rgba(
        width: usize,
        height: usize,
        rgba: Vec<u8>,
        slice_width: usize,
    ) -> Result<Self, SpriteError> {
        if slice_width == 0 || width == 0 || width % slice_width != 0 {
            return Err(SpriteError::SheetGeometry(format!(
                "sheet width {width} is not a positive multiple of slice width {slice_width}"
            )));
        }
        if rgba.len() != width * height * 4 {
            return Err(SpriteError::SheetGeometry(format!(
                "expected {} bytes of RGBA for {width}x{height}, got {}",
                width * height * 4,
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            slice_width,
            rgba,
        })
    }

    /// Decode an in-memory PNG.
    pub fn decode_png(bytes: &[u8], slice_width: usize) -> Result<Self, SpriteError> {
        let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?.to_rgba8();
        let (w, h) = img.dimensions();
        Self::from_rgba(w as usize, h as usize, img.into_raw(), slice_width)
    }

    /// Load a sheet from disk.
    pub fn open(path: &Path, slice_width: usize) -> Result<Self, SpriteError> {
        let bytes = std::fs::read(path).map_err(|source| SpriteError::SheetRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode_png(&bytes, slice_width)
    }

    pub fn slice_count(&self) -> usize {
        self.width / self.slice_width
    }

    /// Cut slice `index` into a layer. Leading empty rows are trimmed so the
    /// layer keeps only its content height; compositing re-aligns at the bottom.
    pub fn layer(&self, index: usize, tag: FeatureTag) -> Result<Layer, SpriteError> {
        if index >= self.slice_count() {
            return Err(SpriteError::SliceOutOfRange {
                index,
                count: self.slice_count(),
            });
        }

        let mut grid = Grid::transparent(self.slice_width, self.height);
        let mut unknown: HashSet<[u8; 3]> = HashSet::new();
        let x0 = index * self.slice_width;

        for y in 0..self.height {
            for x in 0..self.slice_width {
                let i = (y * self.width + x0 + x) * 4;
                let px = &self.rgba[i..i + 4];
                if px[3] < ALPHA_CUTOFF {
                    continue;
                }
                let rgb = [px[0], px[1], px[2]];
                match KEY_COLORS.iter().position(|key| *key == rgb) {
                    Some(i) => grid.set(x, y, Region::from_index(i as u8 + 1)),
                    None => {
                        if unknown.insert(rgb) {
                            log::warn!(
                                "Slice {index}: unrecognized color #{:02x}{:02x}{:02x} at ({x}, {y}), treating as transparent",
                                rgb[0],
                                rgb[1],
                                rgb[2]
                            );
                        }
                    }
                }
            }
        }

        let top = (0..grid.height)
            .find(|&y| !grid.row_is_empty(y))
            .unwrap_or(grid.height);
        if top > 0 {
            grid.cells.drain(..top * grid.width);
            grid.height -= top;
        }

        Ok(Layer::new(grid, tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba_sheet(w: usize, h: usize, pixels: &[(usize, usize, [u8; 4])]) -> Vec<u8> {
        let mut buf = vec![0u8; w * h * 4];
        for &(x, y, px) in pixels {
            let i = (y * w + x) * 4;
            buf[i..i + 4].copy_from_slice(&px);
        }
        buf
    }

    #[test]
    fn rejects_bad_geometry() {
        assert!(SpriteSheet::from_rgba(10, 2, vec![0; 80], 4).is_err());
        assert!(SpriteSheet::from_rgba(8, 2, vec![0; 10], 4).is_err());
        assert!(SpriteSheet::from_rgba(8, 2, vec![0; 64], 4).is_ok());
    }

    #[test]
    fn slices_and_trims_leading_rows() {
        // Two 2-px slices, 3 rows. Slice 1 has a face pixel on the last row.
        let buf = rgba_sheet(4, 3, &[
            (0, 0, [0, 0, 0, 255]),
            (3, 2, [0xFF, 0, 0, 255]),
        ]);
        let sheet = SpriteSheet::from_rgba(4, 3, buf, 2).unwrap();
        assert_eq!(sheet.slice_count(), 2);

        let first = sheet.layer(0, FeatureTag::Base).unwrap();
        assert_eq!(first.grid.height, 3);
        assert_eq!(first.grid.get(0, 0), Region::Outline);

        let second = sheet.layer(1, FeatureTag::Feature("tuft")).unwrap();
        assert_eq!(second.grid.height, 1);
        assert_eq!(second.grid.get(1, 0), Region::Face);
        assert_eq!(second.tag, FeatureTag::Feature("tuft"));
    }

    #[test]
    fn unknown_color_becomes_transparent() {
        let buf = rgba_sheet(2, 1, &[
            (0, 0, [0x12, 0x34, 0x56, 255]),
            (1, 0, [0, 0, 0, 255]),
        ]);
        let sheet = SpriteSheet::from_rgba(2, 1, buf, 2).unwrap();
        let layer = sheet.layer(0, FeatureTag::Base).unwrap();
        assert_eq!(layer.grid.get(0, 0), Region::Transparent);
        assert_eq!(layer.grid.get(1, 0), Region::Outline);
    }

    #[test]
    fn out_of_range_slice_is_an_error() {
        let sheet = SpriteSheet::from_rgba(4, 1, vec![0; 16], 2).unwrap();
        assert!(matches!(
            sheet.layer(2, FeatureTag::Base),
            Err(SpriteError::SliceOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn missing_sheet_file_is_fatal() {
        let result = SpriteSheet::open(Path::new("/definitely/not/here.png"), 16);
        assert!(matches!(result, Err(SpriteError::SheetRead { .. })));
    }
}
