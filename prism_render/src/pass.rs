//! Submission-side pass state and the hook trait concrete passes implement.

use crate::extension::SceneViewExtension;
use crate::filter::FilterSet;
use crate::proxy::ProxyTable;
use crate::submit::GpuPassEncoder;
use crate::view::{ExtensionContext, RenderView, SceneId, ViewFamily};
use std::any::{Any, TypeId};
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use web_time::Duration;

/// Identity of a render pass type, shared by both threads.
#[derive(Clone, Copy)]
pub struct PassTypeId {
    id: TypeId,
    short_name: &'static str,
}

impl PassTypeId {
    pub fn of<P: Any>() -> Self {
        let type_name = std::any::type_name::<P>();
        let base_name = type_name.split('<').next().unwrap_or(type_name);
        let short_name = base_name.rsplit("::").next().unwrap_or(base_name);
        Self {
            id: TypeId::of::<P>(),
            short_name,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn short_name(&self) -> &'static str {
        self.short_name
    }
}

impl PartialEq for PassTypeId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PassTypeId {}

impl Hash for PassTypeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for PassTypeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_name)
    }
}

/// Everything a pass's submission hook may touch during its per-frame tick.
pub struct SubmissionCtx<'a> {
    pub scene: SceneId,
    pub delta_time: Duration,
    /// This frame's fully rebuilt component proxy table.
    pub proxies: &'a ProxyTable,
    /// The submission-side copy of the pass's view filters.
    pub filter: &'a FilterSet,
}

/// Per-view draw context handed to [`PassSubmission::render_view`].
pub struct ViewDrawCtx<'a> {
    pub proxies: &'a ProxyTable,
    pub encoder: &'a mut dyn GpuPassEncoder,
}

/// Submission-thread half of a custom render pass.
///
/// Per frame the scheduler calls `submit` once, right after rebuilding the
/// proxy table. During view dispatch the pass-through hooks run in engine
/// order: `setup_view_family`, `setup_view` per view,
/// `begin_render_view_family`, then `render_view` for every view the pass's
/// filter admits.
pub trait PassSubmission: Any + Send {
    /// Runs on the submission thread as soon as possible after the pass is
    /// created, before any other hook.
    fn init_render_thread(&mut self) {}

    /// Per-frame submission hook.
    fn submit(&mut self, ctx: SubmissionCtx<'_>);

    fn setup_view_family(&mut self, _family: &mut ViewFamily) {}

    fn setup_view(&mut self, _family: &ViewFamily, _view: &mut RenderView) {}

    fn begin_render_view_family(&mut self, _family: &ViewFamily) {}

    /// Emits draw or dispatch work for one admitted view.
    fn render_view(&mut self, _view: &RenderView, _ctx: &mut ViewDrawCtx<'_>) {}

    /// Called while the pass is dying. No new work may be enqueued after
    /// this returns; the scene-view extension is disabled right afterwards.
    fn cleanup_render_thread(&mut self, _subsystem_dying: bool) {}
}

/// Submission-side state of one live pass, owned by the scheduler.
pub struct PassHost {
    pub(crate) submission: Box<dyn PassSubmission>,
    pub(crate) extension: Arc<SceneViewExtension>,
    pub(crate) filter: FilterSet,
    pub(crate) proxies: ProxyTable,
    pub(crate) warned_proxy_spill: bool,
}

impl PassHost {
    pub(crate) fn new(submission: Box<dyn PassSubmission>, extension: Arc<SceneViewExtension>) -> Self {
        Self {
            submission,
            extension,
            filter: FilterSet::default(),
            proxies: ProxyTable::default(),
            warned_proxy_spill: false,
        }
    }

    /// The activation predicate evaluated once per candidate context.
    pub fn is_active(&self, ctx: &ExtensionContext) -> bool {
        self.extension.accepts_context(ctx) && self.filter.should_render_for_context(ctx)
    }

    pub fn filter(&self) -> &FilterSet {
        &self.filter
    }

    pub fn proxies(&self) -> &ProxyTable {
        &self.proxies
    }

    pub fn extension(&self) -> &Arc<SceneViewExtension> {
        &self.extension
    }
}
