use glam::Vec2;

/// Axis-aligned rectangle in screen pixels (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn same_size(&self, other: &Rect) -> bool {
        self.w == other.w && self.h == other.h
    }
}

/// Host-specific handle for a focusable element (a window handle on Win32).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub isize);

/// Computed visibility of an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visibility {
    pub visible: bool,
    /// 0.0 = fully transparent, 1.0 = opaque.
    pub opacity: f32,
}

#[cfg(test)]
impl Visibility {
    pub const SHOWN: Visibility = Visibility {
        visible: true,
        opacity: 1.0,
    };
}

/// A focusable element as the host sees it right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub id: ElementId,
    pub rect: Rect,
    pub visibility: Visibility,
}

/// Narrow view of the host layout the planner is allowed to depend on.
pub trait LayoutOracle {
    /// Viewport size in pixels. The ground is the bottom edge.
    fn viewport(&self) -> Vec2;

    /// Elements whose top edge is above this are never perched on.
    fn focus_top_margin(&self) -> f32 {
        80.0
    }

    /// Every element the bird could currently fly to.
    fn candidates(&self) -> Vec<Element>;

    /// Live state of one element, or `None` if it no longer exists.
    fn element(&self, id: ElementId) -> Option<Element>;
}

/// Oracle with a viewport and nothing to perch on.
pub struct ViewportLayout {
    pub size: Vec2,
}

impl LayoutOracle for ViewportLayout {
    fn viewport(&self) -> Vec2 {
        self.size
    }

    fn candidates(&self) -> Vec<Element> {
        Vec::new()
    }

    fn element(&self, _id: ElementId) -> Option<Element> {
        None
    }
}

/// Hand-built layout for tests.
#[cfg(test)]
pub struct FakeLayout {
    pub size: Vec2,
    pub top_margin: f32,
    pub elements: Vec<Element>,
}

#[cfg(test)]
impl FakeLayout {
    pub fn new(w: f32, h: f32) -> Self {
        Self {
            size: Vec2::new(w, h),
            top_margin: 80.0,
            elements: Vec::new(),
        }
    }

    pub fn with_window(mut self, id: isize, rect: Rect) -> Self {
        self.elements.push(Element {
            id: ElementId(id),
            rect,
            visibility: Visibility::SHOWN,
        });
        self
    }

    pub fn move_window(&mut self, id: isize, rect: Rect) {
        if let Some(el) = self.elements.iter_mut().find(|e| e.id == ElementId(id)) {
            el.rect = rect;
        }
    }
}

#[cfg(test)]
impl LayoutOracle for FakeLayout {
    fn viewport(&self) -> Vec2 {
        self.size
    }

    fn focus_top_margin(&self) -> f32 {
        self.top_margin
    }

    fn candidates(&self) -> Vec<Element> {
        self.elements.clone()
    }

    fn element(&self, id: ElementId) -> Option<Element> {
        self.elements.iter().find(|e| e.id == id).copied()
    }
}
