/// Symbolic color slot used inside pixel grids instead of literal colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Region {
    /// No pixel here; whatever is beneath shows through.
    Transparent = 0,
    Outline,
    Border,
    Foot,
    Beak,
    Eye,
    Face,
    Hood,
    Nose,
    Belly,
    Underbelly,
    Wing,
    WingEdge,
    Heart,
    HeartBorder,
    HeartShine,
}

impl Region {
    pub const ALL: [Region; 16] = [
        Self::Transparent,
        Self::Outline,
        Self::Border,
        Self::Foot,
        Self::Beak,
        Self::Eye,
        Self::Face,
        Self::Hood,
        Self::Nose,
        Self::Belly,
        Self::Underbelly,
        Self::Wing,
        Self::WingEdge,
        Self::Heart,
        Self::HeartBorder,
        Self::HeartShine,
    ];

    /// Decode a raw region index. Unknown indices degrade to `Transparent`.
    pub fn from_index(index: u8) -> Region {
        match Self::ALL.get(index as usize) {
            Some(region) => *region,
            None => {
                log::warn!("Unknown region index {index}, treating as transparent");
                Region::Transparent
            }
        }
    }

    /// Fallback color when a variant doesn't specify one.
    /// `Hood` and `Nose` are derived from `Face` and have no entry here.
    fn default_color(self) -> Option<u32> {
        match self {
            Region::Transparent => None,
            Region::Outline => Some(0x000000FF),
            Region::Border => Some(0xFFFFFFFF),
            Region::Foot => Some(0xAF8E75FF),
            Region::Beak => Some(0x000000FF),
            Region::Eye => Some(0x000000FF),
            Region::Face | Region::Hood | Region::Nose => Some(0xB0B0B0FF),
            Region::Belly => Some(0xF4F4F4FF),
            Region::Underbelly => Some(0xD8D8D8FF),
            Region::Wing => Some(0x7A7A7AFF),
            Region::WingEdge => Some(0x555555FF),
            Region::Heart => Some(0xC82E2EFF),
            Region::HeartBorder => Some(0x7A1515FF),
            Region::HeartShine => Some(0xFFFFFFFF),
        }
    }
}

/// A named creature skin: color map plus feature tags.
#[derive(Debug, PartialEq)]
pub struct Variant {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Explicit colors, RGBA packed as u32. Anything missing uses defaults.
    pub colors: &'static [(Region, u32)],
    /// Feature tags (e.g. "tuft") that select extra layers when compositing.
    pub features: &'static [&'static str],
}

impl Variant {
    fn explicit(&self, region: Region) -> Option<u32> {
        self.colors
            .iter()
            .find(|(r, _)| *r == region)
            .map(|(_, c)| *c)
    }

    /// Accent color for UI chrome: hood, then face.
    pub fn theme_accent(&self) -> u32 {
        resolve_color(self, Region::Hood).unwrap_or(0xB0B0B0FF)
    }

    /// The species after this one in the catalog, wrapping around.
    pub fn next_in_catalog(&self) -> &'static Variant {
        let idx = CATALOG.iter().position(|v| v.id == self.id).unwrap_or(0);
        &CATALOG[(idx + 1) % CATALOG.len()]
    }
}

/// Resolve a region to a concrete color for `variant`.
/// Returns `None` for "paint nothing".
pub fn resolve_color(variant: &Variant, region: Region) -> Option<u32> {
    if region == Region::Transparent {
        return None;
    }
    if let Some(c) = variant.explicit(region) {
        return Some(c);
    }
    match region {
        Region::Hood | Region::Nose => {
            resolve_color(variant, Region::Face)
        }
        _ => region.default_color(),
    }
}

// ---------------------------------------------------------------------------
// Species catalog
// ---------------------------------------------------------------------------

pub const DEFAULT_VARIANT_ID: &str = "shimaenaga";

pub static CATALOG: [Variant; 7] = [
    Variant {
        id: "shimaenaga",
        name: "Shima Enaga",
        description: "A round little snow fairy from Hokkaido.",
        colors: &[
            (Region::Face, 0xFFFFFFFF),
            (Region::Belly, 0xFFFFFFFF),
            (Region::Underbelly, 0xF0E4E4FF),
            (Region::Wing, 0x3A3A3AFF),
            (Region::WingEdge, 0x8C6E6EFF),
        ],
        features: &[],
    },
    Variant {
        id: "bluebird",
        name: "Eastern Bluebird",
        description: "Carries the sky on its back.",
        colors: &[
            (Region::Face, 0x4F7FD0FF),
            (Region::Belly, 0xE0894DFF),
            (Region::Underbelly, 0xF2E6D8FF),
            (Region::Wing, 0x3F63B5FF),
            (Region::WingEdge, 0x2B4686FF),
        ],
        features: &[],
    },
    Variant {
        id: "cardinal",
        name: "Northern Cardinal",
        description: "Crested, crimson and not shy about it.",
        colors: &[
            (Region::Face, 0xD42A2AFF),
            (Region::Nose, 0x1A1A1AFF),
            (Region::Beak, 0xF28C28FF),
            (Region::Belly, 0xC72525FF),
            (Region::Underbelly, 0xA81F1FFF),
            (Region::Wing, 0xA31C1CFF),
            (Region::WingEdge, 0x6E1010FF),
        ],
        features: &["tuft"],
    },
    Variant {
        id: "bluejay",
        name: "Blue Jay",
        description: "Loud, clever, and crested.",
        colors: &[
            (Region::Face, 0xE8EEF5FF),
            (Region::Hood, 0x5A8BDBFF),
            (Region::Belly, 0xEEF1F5FF),
            (Region::Underbelly, 0xD4DCE6FF),
            (Region::Wing, 0x3E74CFFF),
            (Region::WingEdge, 0x1E2B45FF),
        ],
        features: &["tuft"],
    },
    Variant {
        id: "robin",
        name: "American Robin",
        description: "First to arrive when the snow melts.",
        colors: &[
            (Region::Face, 0x4A4440FF),
            (Region::Beak, 0xF2C230FF),
            (Region::Belly, 0xD9652BFF),
            (Region::Underbelly, 0xEFE3D6FF),
            (Region::Wing, 0x5B5550FF),
            (Region::WingEdge, 0x3A3532FF),
        ],
        features: &[],
    },
    Variant {
        id: "goldfinch",
        name: "American Goldfinch",
        description: "A bright yellow spark at the feeder.",
        colors: &[
            (Region::Face, 0xF5D327FF),
            (Region::Hood, 0x1C1C1CFF),
            (Region::Beak, 0xF0A060FF),
            (Region::Belly, 0xF5D327FF),
            (Region::Underbelly, 0xF7EBA8FF),
            (Region::Wing, 0x232323FF),
            (Region::WingEdge, 0xEDEDEDFF),
        ],
        features: &[],
    },
    Variant {
        id: "chickadee",
        name: "Black-capped Chickadee",
        description: "Says its own name, mostly.",
        colors: &[
            (Region::Face, 0xF2F2F2FF),
            (Region::Hood, 0x1B1B1BFF),
            (Region::Nose, 0x1B1B1BFF),
            (Region::Belly, 0xEDE3D3FF),
            (Region::Underbelly, 0xD8C6A8FF),
            (Region::Wing, 0x8C8C8CFF),
            (Region::WingEdge, 0x5C5C5CFF),
        ],
        features: &[],
    },
];

/// Look up a species by id.
pub fn variant_by_id(id: &str) -> Option<&'static Variant> {
    CATALOG.iter().find(|v| v.id == id)
}

/// The species used when nothing else is selected.
pub fn default_variant() -> &'static Variant {
    &CATALOG[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_paints_nothing() {
        for v in &CATALOG {
            assert_eq!(resolve_color(v, Region::Transparent), None);
        }
    }

    #[test]
    fn missing_colors_use_defaults() {
        let v = variant_by_id("bluebird").unwrap();
        assert_eq!(resolve_color(v, Region::Outline), Some(0x000000FF));
        assert_eq!(resolve_color(v, Region::Border), Some(0xFFFFFFFF));
    }

    #[test]
    fn hood_and_nose_fall_back_to_face() {
        let v = variant_by_id("bluebird").unwrap();
        assert_eq!(resolve_color(v, Region::Hood), Some(0x4F7FD0FF));
        assert_eq!(resolve_color(v, Region::Nose), Some(0x4F7FD0FF));

        let cardinal = variant_by_id("cardinal").unwrap();
        assert_eq!(resolve_color(cardinal, Region::Nose), Some(0x1A1A1AFF));
        assert_eq!(resolve_color(cardinal, Region::Hood), Some(0xD42A2AFF));
    }

    #[test]
    fn theme_accent_prefers_hood() {
        assert_eq!(variant_by_id("bluejay").unwrap().theme_accent(), 0x5A8BDBFF);
        assert_eq!(variant_by_id("robin").unwrap().theme_accent(), 0x4A4440FF);
    }

    #[test]
    fn unknown_index_is_transparent() {
        assert_eq!(Region::from_index(7), Region::Hood);
        assert_eq!(Region::from_index(200), Region::Transparent);
    }

    #[test]
    fn catalog_cycles() {
        let last = &CATALOG[CATALOG.len() - 1];
        assert_eq!(last.next_in_catalog().id, CATALOG[0].id);
        assert_eq!(default_variant().id, DEFAULT_VARIANT_ID);
    }
}
