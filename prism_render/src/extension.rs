use crate::view::{ExtensionContext, SceneId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Engine hook state for one pass, queried once per candidate view per frame.
///
/// Created by the pass's simulation-thread init and shared with the
/// submission-side pass host. The kill flag stops the extension from being
/// selected starting with the next evaluation; work already enqueued for the
/// current frame still completes.
#[derive(Debug)]
pub struct SceneViewExtension {
    scene: SceneId,
    killed: AtomicBool,
}

impl SceneViewExtension {
    /// A live extension bound to the only scene it may render into.
    pub fn new(scene: SceneId) -> Arc<Self> {
        Arc::new(Self {
            scene,
            killed: AtomicBool::new(false),
        })
    }

    pub fn scene(&self) -> SceneId {
        self.scene
    }

    /// Permanently stops this extension from being selected for future
    /// frames. Callable from any thread at any time.
    pub fn kill_rendering(&self) {
        self.killed.store(true, Ordering::Release);
    }

    pub fn is_killed(&self) -> bool {
        self.killed.load(Ordering::Acquire)
    }

    /// Scene-binding half of the activation predicate: still alive, and the
    /// candidate context belongs to this extension's scene.
    pub fn accepts_context(&self, ctx: &ExtensionContext) -> bool {
        !self.is_killed() && ctx.scene == self.scene
    }
}
