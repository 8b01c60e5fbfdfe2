//! Identity and geometry of the views a pass can be asked to render into.

use bon::Builder;
use nalgebra::Vector2;

/// Stable identity of a view across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewKey(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewportId(pub u64);

impl ViewportId {
    pub const PRIMARY: Self = Self(0);

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_primary(self) -> bool {
        self.get() == Self::PRIMARY.get()
    }
}

/// One world's scene, as seen by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(pub u64);

/// A surface or texture views get rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetId(pub u64);

/// The scene object a view renders on behalf of, usually a player controller
/// or its camera target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewActorId(pub u64);

/// Shader capability tier a view renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeatureLevel {
    Basic,
    #[default]
    Standard,
    Advanced,
}

/// Pixel-space rectangle of a view inside its render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub min: Vector2<i32>,
    pub size: Vector2<i32>,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            min: Vector2::new(x, y),
            size: Vector2::new(width, height),
        }
    }

    pub fn size(&self) -> Vector2<i32> {
        self.size
    }

    /// Pixel offset from this rectangle's origin to `other`'s.
    pub fn offset_to(&self, other: &PixelRect) -> Vector2<i32> {
        other.min - self.min
    }
}

/// One camera's render request for one frame.
#[derive(Debug, Clone, Builder)]
pub struct RenderView {
    pub key: ViewKey,
    pub scene: SceneId,
    pub render_target: RenderTargetId,
    pub viewport: ViewportId,
    #[builder(default)]
    pub player_index: i32,
    pub view_actor: Option<ViewActorId>,
    pub pixel_rect: PixelRect,
    #[builder(default)]
    pub feature_level: FeatureLevel,
}

/// All views rendered together into one target this frame.
#[derive(Debug, Clone)]
pub struct ViewFamily {
    pub scene: SceneId,
    pub render_target: RenderTargetId,
    pub viewport: ViewportId,
    pub views: Vec<RenderView>,
}

impl ViewFamily {
    pub fn context(&self) -> ExtensionContext {
        ExtensionContext {
            scene: self.scene,
            viewport: self.viewport,
        }
    }
}

/// What a scene-view extension is asked about before any views are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionContext {
    pub scene: SceneId,
    pub viewport: ViewportId,
}
