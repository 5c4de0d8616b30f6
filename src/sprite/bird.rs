use std::path::Path;
use std::sync::Arc;

use super::animation::Animation;
use super::frame::Frame;
use super::sheet::{FeatureTag, SpriteSheet};
use super::SpriteError;

/// Sheet bundled into the binary.
pub static BUNDLED_SHEET: &[u8] = include_bytes!("../../assets/bird_sheet.png");

/// Width of one sprite slice in sheet pixels.
pub const SLICE_WIDTH: usize = 16;

// Slice indices. Animation definitions depend on these positions.
pub const SLICE_BASE: usize = 0;
pub const SLICE_HEAD_DOWN: usize = 1;
pub const SLICE_HEART_ONE: usize = 2;
pub const SLICE_HEART_TWO: usize = 3;
pub const SLICE_HEART_THREE: usize = 4;
pub const SLICE_TUFT_BASE: usize = 5;
pub const SLICE_TUFT_DOWN: usize = 6;
pub const SLICE_WINGS_UP: usize = 7;
pub const SLICE_WINGS_DOWN: usize = 8;

const TUFT: FeatureTag = FeatureTag::Feature("tuft");

/// Which animation the bird is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationKind {
    Still,
    Bob,
    Fly,
    Hop,
    Heart,
}

/// Every animation the bird uses, built once at startup.
pub struct BirdSprites {
    pub still: Animation,
    pub bob: Animation,
    pub fly: Animation,
    pub hop: Animation,
    pub heart: Animation,
    /// Size of the largest frame in sheet pixels.
    pub frame_size: (usize, usize),
}

impl BirdSprites {
    /// Build from the sheet compiled into the binary.
    pub fn bundled() -> Result<Self, SpriteError> {
        Self::from_sheet(&SpriteSheet::decode_png(BUNDLED_SHEET, SLICE_WIDTH)?)
    }

    /// Build from a sheet on disk that follows the same slice layout.
    pub fn open(path: &Path) -> Result<Self, SpriteError> {
        Self::from_sheet(&SpriteSheet::open(path, SLICE_WIDTH)?)
    }

    pub fn from_sheet(sheet: &SpriteSheet) -> Result<Self, SpriteError> {
        let base = sheet.layer(SLICE_BASE, FeatureTag::Base)?;
        let down = sheet.layer(SLICE_HEAD_DOWN, FeatureTag::Base)?;
        let heart_one = sheet.layer(SLICE_HEART_ONE, FeatureTag::Base)?;
        let heart_two = sheet.layer(SLICE_HEART_TWO, FeatureTag::Base)?;
        let heart_three = sheet.layer(SLICE_HEART_THREE, FeatureTag::Base)?;
        let tuft_base = sheet.layer(SLICE_TUFT_BASE, TUFT)?;
        let tuft_down = sheet.layer(SLICE_TUFT_DOWN, TUFT)?;
        let wings_up = sheet.layer(SLICE_WINGS_UP, FeatureTag::Base)?;
        let wings_down = sheet.layer(SLICE_WINGS_DOWN, FeatureTag::Base)?;

        let frame = |layers| Frame::new(layers).map(Arc::new);

        let standing = frame(vec![base.clone(), tuft_base.clone()])?;
        let head_down = frame(vec![down.clone(), tuft_down.clone()])?;
        let flap_down = frame(vec![base.clone(), tuft_base.clone(), wings_down])?;
        let flap_up = frame(vec![down, tuft_down, wings_up])?;
        let glow_one = frame(vec![base.clone(), tuft_base.clone(), heart_one])?;
        let glow_two = frame(vec![base.clone(), tuft_base.clone(), heart_two])?;
        let glow_three = frame(vec![base, tuft_base, heart_three])?;

        let frame_size = [&standing, &head_down, &flap_down, &flap_up, &glow_one, &glow_two, &glow_three]
            .iter()
            .fold((0, 0), |(w, h), f| (w.max(f.width()), h.max(f.height())));

        Ok(Self {
            still: Animation::new(vec![standing.clone()], vec![1000], true)?,
            bob: Animation::new(vec![standing.clone(), head_down], vec![420, 420], true)?,
            fly: Animation::new(vec![flap_up, flap_down.clone()], vec![30, 80], true)?,
            hop: Animation::new(vec![flap_down, standing], vec![60, 60], true)?,
            heart: Animation::new(vec![glow_one, glow_two, glow_three], vec![60, 80, 250], false)?,
            frame_size,
        })
    }

    pub fn get_mut(&mut self, kind: AnimationKind) -> &mut Animation {
        match kind {
            AnimationKind::Still => &mut self.still,
            AnimationKind::Bob => &mut self.bob,
            AnimationKind::Fly => &mut self.fly,
            AnimationKind::Hop => &mut self.hop,
            AnimationKind::Heart => &mut self.heart,
        }
    }

    /// Drop every paint memo, e.g. after a palette swap.
    pub fn invalidate_all(&mut self) {
        for anim in [
            &mut self.still,
            &mut self.bob,
            &mut self.fly,
            &mut self.hop,
            &mut self.heart,
        ] {
            anim.invalidate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::palette::Region;

    #[test]
    fn bundled_sheet_loads() {
        let sprites = BirdSprites::bundled().unwrap();
        assert_eq!(sprites.frame_size, (SLICE_WIDTH, 20));
        assert!(!sprites.heart.is_looping());
        assert_eq!(sprites.heart.total_duration(), 390.0);
        assert!(sprites.fly.is_looping());
    }

    #[test]
    fn bundled_sheet_has_nine_slices() {
        let sheet = SpriteSheet::decode_png(BUNDLED_SHEET, SLICE_WIDTH).unwrap();
        assert_eq!(sheet.slice_count(), 9);
    }

    #[test]
    fn tuft_only_shows_for_tufted_variants() {
        let sprites = BirdSprites::bundled().unwrap();
        let standing = sprites.still.frame(0);
        let tufted = standing.pixels(TUFT);
        let plain = standing.pixels(FeatureTag::Base);
        let differs = tufted.cells.iter().zip(&plain.cells).any(|(a, b)| a != b);
        assert!(differs);
        assert!(plain.cells.contains(&Region::Face));
    }

    #[test]
    fn garbage_sheet_is_fatal() {
        assert!(matches!(
            SpriteSheet::decode_png(b"not a png", SLICE_WIDTH),
            Err(SpriteError::SheetDecode(_))
        ));
    }
}
