//! The command queue crossing from the simulation thread to the submission
//! thread, and the fences that track its drain.

use crate::extension::SceneViewExtension;
use crate::filter::FilterMutation;
use crate::pass::{PassSubmission, PassTypeId};
use crate::view::SceneId;
use crossbeam_channel::Sender;
use prism_utils::{PassComponentKey, PrimitiveHandle, ProxyBytes};
use smallvec::SmallVec;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use web_time::Duration;

/// Most component snapshots fit on the stack; past this many live components
/// a pass tick spills to the heap and warns once.
pub const MAX_INLINE_COMPONENT_COUNT: usize = 256;

/// The component keys a pass captured on the simulation thread this frame.
pub type ComponentSnapshot = SmallVec<[PassComponentKey; MAX_INLINE_COMPONENT_COUNT]>;

/// Commands handed from the simulation thread to the submission thread.
///
/// The [`RenderScheduler`](crate::RenderScheduler) executes them strictly in
/// enqueue order. Enqueueing never blocks, and commands have no return
/// channel; command-side failures are logged where they happen.
pub enum RenderCommand {
    /// Replace a component's published proxy blob with a fresh snapshot. The
    /// submission thread observes either the old or the new complete blob,
    /// never a partial write.
    PublishProxy {
        component: PassComponentKey,
        bytes: ProxyBytes,
        target: Option<PrimitiveHandle>,
    },
    /// Drop a component's published proxy. Queued at deactivation time so
    /// frames already in flight keep a valid blob.
    DestroyProxy(PassComponentKey),
    /// Finish a freshly created pass's initialization on the submission
    /// thread.
    InitPass {
        pass: PassTypeId,
        submission: Box<dyn PassSubmission>,
        extension: Arc<SceneViewExtension>,
    },
    /// Rebuild a pass's proxy table from this frame's snapshot, then run its
    /// submission hook against the fresh table.
    TickPass {
        pass: PassTypeId,
        scene: SceneId,
        delta_time: Duration,
        components: ComponentSnapshot,
    },
    /// Apply one filter edit to the submission-side copy.
    EditFilter(PassTypeId, FilterMutation),
    /// Run a dying pass's submission-side cleanup and disable its extension.
    CleanupPass {
        pass: PassTypeId,
        subsystem_dying: bool,
    },
    /// Raise a fence flag: everything enqueued before it has executed.
    Fence(Arc<AtomicBool>),
    /// Execute a batch of commands in order.
    Batch(Vec<RenderCommand>),
}

impl Debug for RenderCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RenderCommand::PublishProxy { .. } => "Publish Proxy",
            RenderCommand::DestroyProxy(_) => "Destroy Proxy",
            RenderCommand::InitPass { .. } => "Init Pass",
            RenderCommand::TickPass { .. } => "Tick Pass",
            RenderCommand::EditFilter(..) => "Edit Filter",
            RenderCommand::CleanupPass { .. } => "Cleanup Pass",
            RenderCommand::Fence(_) => "Fence",
            RenderCommand::Batch(inner) => &format!("Command Batch {inner:?}"),
        };

        write!(f, "{name}")
    }
}

/// Completion signal for previously enqueued submission-thread commands.
///
/// Owners poll [`RenderFence::is_complete`]; nothing ever blocks on a fence.
#[derive(Debug, Clone, Default)]
pub struct RenderFence {
    flag: Arc<AtomicBool>,
}

impl RenderFence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues the completion marker. Everything sent on `tx` before this
    /// call is observed as finished once the fence completes.
    ///
    /// A disconnected queue means the submission side is gone and nothing can
    /// still reference the fenced work, so the fence completes immediately.
    pub fn begin(&self, tx: &Sender<RenderCommand>) {
        if tx.send(RenderCommand::Fence(self.flag.clone())).is_err() {
            self.flag.store(true, Ordering::Release);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
