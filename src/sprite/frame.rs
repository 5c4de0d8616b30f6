use std::collections::HashMap;

use super::canvas::RenderTarget;
use super::palette::{resolve_color, Region, Variant};
use super::sheet::{FeatureTag, Grid, Layer};
use super::SpriteError;

/// Which way the sprite faces. Sheets are authored facing right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

/// A composited, tag-aware pixel grid ready to paint.
#[derive(Debug, Clone)]
pub struct Frame {
    base: Grid,
    /// One composition per feature tag seen among the layers.
    features: HashMap<&'static str, Grid>,
}

impl Frame {
    /// Composite `layers` in order. The first layer must be tagged `Base`.
    pub fn new(layers: Vec<Layer>) -> Result<Self, SpriteError> {
        let first = layers.first().ok_or(SpriteError::NoLayers)?;
        if first.tag != FeatureTag::Base {
            return Err(SpriteError::FirstLayerNotBase);
        }

        let width = layers.iter().map(|l| l.grid.width).max().unwrap_or(0);
        let height = layers.iter().map(|l| l.grid.height).max().unwrap_or(0);

        let base = compose(&layers, FeatureTag::Base, width, height);
        let mut features = HashMap::new();
        for layer in &layers {
            if let FeatureTag::Feature(name) = layer.tag {
                features
                    .entry(name)
                    .or_insert_with(|| compose(&layers, layer.tag, width, height));
            }
        }

        Ok(Self { base, features })
    }

    pub fn width(&self) -> usize {
        self.base.width
    }

    pub fn height(&self) -> usize {
        self.base.height
    }

    /// Composition for `tag`, or the base composition when there is none.
    pub fn pixels(&self, tag: FeatureTag) -> &Grid {
        match tag {
            FeatureTag::Base => &self.base,
            FeatureTag::Feature(name) => self.features.get(name).unwrap_or(&self.base),
        }
    }

    /// The composition a variant sees: its first feature this frame knows about.
    fn tag_for(&self, variant: &Variant) -> FeatureTag {
        variant
            .features
            .iter()
            .find(|f| self.features.contains_key(**f))
            .map(|f| FeatureTag::Feature(*f))
            .unwrap_or(FeatureTag::Base)
    }

    /// Paint onto `target` as `pixel_size` blocks, aligned to the target's
    /// bottom edge. Transparent cells leave the target untouched; the caller
    /// clears first if it wants a clean slate.
    pub fn draw(
        &self,
        target: &mut dyn RenderTarget,
        facing: Facing,
        pixel_size: u32,
        variant: &Variant,
    ) {
        let grid = self.pixels(self.tag_for(variant));
        let top = target
            .height()
            .saturating_sub(grid.height as u32 * pixel_size);
        for y in 0..grid.height {
            for x in 0..grid.width {
                let src_x = match facing {
                    Facing::Right => x,
                    Facing::Left => grid.width - 1 - x,
                };
                if let Some(color) = resolve_color(variant, grid.get(src_x, y)) {
                    target.fill_rect(
                        x as u32 * pixel_size,
                        top + y as u32 * pixel_size,
                        pixel_size,
                        pixel_size,
                        color,
                    );
                }
            }
        }
    }
}

/// Overlay every layer tagged `Base` or `tag`, bottom-aligned.
fn compose(layers: &[Layer], tag: FeatureTag, width: usize, height: usize) -> Grid {
    let mut out = Grid::transparent(width, height);
    for layer in layers {
        if layer.tag != FeatureTag::Base && layer.tag != tag {
            continue;
        }
        let pad = height - layer.grid.height;
        for y in 0..layer.grid.height {
            for x in 0..layer.grid.width {
                let region = layer.grid.get(x, y);
                if region != Region::Transparent {
                    out.set(x, y + pad, region);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::canvas::PixelCanvas;
    use crate::sprite::palette::{variant_by_id, Region::*};

    const T: Region = Transparent;

    fn base_layer() -> Layer {
        Layer::base(Grid::from_rows(&[
            vec![Outline, Outline, T],
            vec![Face, Eye, Beak],
            vec![Foot, T, Foot],
        ]))
    }

    fn tuft_layer() -> Layer {
        Layer::new(
            Grid::from_rows(&[vec![Hood, T, T], vec![Hood, Hood, T]]),
            FeatureTag::Feature("tuft"),
        )
    }

    #[test]
    fn first_layer_must_be_base() {
        assert!(matches!(
            Frame::new(vec![tuft_layer(), base_layer()]),
            Err(SpriteError::FirstLayerNotBase)
        ));
        assert!(matches!(Frame::new(vec![]), Err(SpriteError::NoLayers)));
    }

    #[test]
    fn tuft_merges_only_for_its_tag() {
        let frame = Frame::new(vec![base_layer(), tuft_layer()]).unwrap();

        let tuft = frame.pixels(FeatureTag::Feature("tuft"));
        // Tuft is 2 rows tall, padded by 1 row at the top.
        assert_eq!(tuft.get(0, 0), Outline);
        assert_eq!(tuft.get(0, 1), Hood);
        assert_eq!(tuft.get(0, 2), Hood);
        assert_eq!(tuft.get(1, 2), Hood);
        assert_eq!(tuft.get(2, 2), Foot);

        let other = frame.pixels(FeatureTag::Feature("other"));
        assert_eq!(other, frame.pixels(FeatureTag::Base));
        assert_eq!(other.get(0, 1), Face);
    }

    #[test]
    fn shorter_base_is_padded_at_the_top() {
        let short = Layer::base(Grid::from_rows(&[vec![Face]]));
        let tall = Layer::base(Grid::from_rows(&[vec![Heart], vec![T], vec![T]]));
        let frame = Frame::new(vec![short, tall]).unwrap();
        let px = frame.pixels(FeatureTag::Base);
        assert_eq!(frame.height(), 3);
        assert_eq!(px.get(0, 0), Heart);
        assert_eq!(px.get(0, 1), T);
        // Transparent cells in the later layer keep the earlier value.
        assert_eq!(px.get(0, 2), Face);
    }

    #[test]
    fn composition_is_deterministic() {
        let a = Frame::new(vec![base_layer(), tuft_layer()]).unwrap();
        let b = Frame::new(vec![base_layer(), tuft_layer()]).unwrap();
        let tag = FeatureTag::Feature("tuft");
        assert_eq!(a.pixels(tag), b.pixels(tag));

        let variant = variant_by_id("cardinal").unwrap();
        let mut first = PixelCanvas::new(9, 9);
        let mut second = PixelCanvas::new(9, 9);
        a.draw(&mut first, Facing::Right, 3, variant);
        a.draw(&mut second, Facing::Right, 3, variant);
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn left_and_right_are_mirrors() {
        let frame = Frame::new(vec![base_layer(), tuft_layer()]).unwrap();
        for id in ["cardinal", "bluebird"] {
            let variant = variant_by_id(id).unwrap();
            let mut right = PixelCanvas::new(6, 6);
            let mut left = PixelCanvas::new(6, 6);
            frame.draw(&mut right, Facing::Right, 2, variant);
            frame.draw(&mut left, Facing::Left, 2, variant);
            for y in 0..6 {
                for x in 0..6 {
                    assert_eq!(right.pixel(x, y), left.pixel(5 - x, y));
                }
            }
        }
    }

    #[test]
    fn transparent_leaves_background() {
        let frame = Frame::new(vec![base_layer()]).unwrap();
        let variant = variant_by_id("bluebird").unwrap();
        let mut canvas = PixelCanvas::new(3, 3);
        canvas.fill_rect(0, 0, 3, 3, 0x123456FF);
        frame.draw(&mut canvas, Facing::Right, 1, variant);
        assert_eq!(canvas.pixel(2, 0), 0x123456FF);
        assert_eq!(canvas.pixel(0, 0), 0x000000FF);
    }

    #[test]
    fn variant_features_pick_the_composition() {
        let frame = Frame::new(vec![base_layer(), tuft_layer()]).unwrap();
        let mut with_tuft = PixelCanvas::new(3, 3);
        let mut without = PixelCanvas::new(3, 3);
        frame.draw(&mut with_tuft, Facing::Right, 1, variant_by_id("cardinal").unwrap());
        frame.draw(&mut without, Facing::Right, 1, variant_by_id("bluebird").unwrap());
        // (1, 2) only exists in the tuft layer.
        assert_eq!(with_tuft.pixel(1, 2), 0xD42A2AFF);
        assert_eq!(without.pixel(1, 2), 0);
        assert_eq!(without.pixel(0, 1), 0x4F7FD0FF);
        assert_eq!(without.pixel(1, 1), 0x000000FF);
    }
}
