//! The simulation-side pass trait, the pass type registry, and the
//! thread-safe filter editor.

use crate::world::{GameTask, World};
use crossbeam_channel::Sender;
use dashmap::DashMap;
use prism_render::extension::SceneViewExtension;
use prism_render::filter::{FilterMutation, FilterOp, Polarity};
use prism_render::message::RenderCommand;
use prism_render::pass::{PassSubmission, PassTypeId};
use prism_render::view::{RenderTargetId, SceneId, ViewActorId, ViewportId};
use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};
use web_time::Duration;

/// Simulation-thread half of a custom render pass.
///
/// Owned by the [`PassSubsystem`](crate::PassSubsystem); created lazily when
/// the first component naming it spawns, or explicitly through
/// [`PassSubsystem::get_pass`](crate::PassSubsystem::get_pass).
pub trait RenderPass: Any {
    /// Called once when the pass is created, before any component registers
    /// with it. Must produce the scene-view extension the engine will poll.
    fn init_game_thread(&mut self, scene: SceneId) -> Arc<SceneViewExtension>;

    /// Builds the submission-thread half of the pass. It crosses over right
    /// after `init_game_thread`; its `init_render_thread` runs as soon as
    /// the submission thread drains the command.
    fn create_submission(&mut self) -> Box<dyn PassSubmission>;

    /// Per-frame simulation-thread hook, runs before the component snapshot
    /// is captured.
    fn tick_game_thread(&mut self, _delta_time: Duration) {}
}

/// Reflection record for a registered pass type.
#[derive(Debug, Clone, Copy)]
pub struct PassTypeInfo {
    pub id: PassTypeId,
    pub type_name: &'static str,
    construct: fn() -> Box<dyn RenderPass>,
}

static PASS_REGISTRY: OnceLock<DashMap<TypeId, PassTypeInfo>> = OnceLock::new();

fn pass_registry() -> &'static DashMap<TypeId, PassTypeInfo> {
    PASS_REGISTRY.get_or_init(DashMap::new)
}

/// Registers a pass type so components can name it and the subsystem can
/// construct it on demand. Idempotent; typically called from
/// [`PassComponent::pass_type`](crate::PassComponent::pass_type).
pub fn register_pass_type<P: RenderPass + Default>() -> PassTypeId {
    let id = PassTypeId::of::<P>();
    pass_registry()
        .entry(id.type_id())
        .or_insert_with(|| PassTypeInfo {
            id,
            type_name: std::any::type_name::<P>(),
            construct: || Box::new(P::default()),
        });
    id
}

pub fn pass_type_info(id: PassTypeId) -> Option<PassTypeInfo> {
    pass_registry().get(&id.type_id()).map(|entry| *entry)
}

pub(crate) fn construct_pass(id: PassTypeId) -> Option<Box<dyn RenderPass>> {
    pass_type_info(id).map(|info| (info.construct)())
}

macro_rules! editor_category {
    ($add:ident, $remove:ident, $configure:ident, $clear:ident, $variant:ident, $ty:ty) => {
        pub fn $add(&self, element: $ty, polarity: Polarity) {
            self.apply(FilterMutation::$variant(FilterOp::Add(element, polarity)));
        }

        pub fn $remove(&self, element: $ty) {
            self.apply(FilterMutation::$variant(FilterOp::Remove(element)));
        }

        pub fn $configure(&self, polarity: Polarity) {
            self.apply(FilterMutation::$variant(FilterOp::Configure(polarity)));
        }

        pub fn $clear(&self) {
            self.apply(FilterMutation::$variant(FilterOp::Clear));
        }
    };
}

/// Thread-safe editor for one pass's view filters.
///
/// Each mutation is routed to the submission-side filter copy through the
/// render command queue and to the simulation-side copy through the world's
/// task queue; the copies converge within a frame. Code already running on
/// the simulation thread can use
/// [`World::edit_pass_filter`](crate::World::edit_pass_filter) to apply the
/// simulation-side half immediately instead.
#[derive(Clone)]
pub struct FilterEditor {
    pub(crate) pass: PassTypeId,
    pub(crate) render_tx: Sender<RenderCommand>,
    pub(crate) task_tx: Sender<GameTask>,
}

impl FilterEditor {
    /// Queues one mutation against both filter copies. Callable from any
    /// thread.
    pub fn apply(&self, mutation: FilterMutation) {
        let _ = self
            .render_tx
            .send(RenderCommand::EditFilter(self.pass, mutation.clone()));

        let pass = self.pass;
        let _ = self.task_tx.send(Box::new(move |world: &mut World| {
            world
                .subsystem
                .apply_filter_mutation_local(pass, &mutation);
        }));
    }

    editor_category!(
        filter_by_render_target,
        remove_by_render_target,
        configure_by_render_target,
        clear_by_render_target,
        RenderTarget,
        RenderTargetId
    );

    editor_category!(
        filter_by_scene,
        remove_by_scene,
        configure_by_scene,
        clear_by_scene,
        Scene,
        SceneId
    );

    editor_category!(
        filter_by_viewport,
        remove_by_viewport,
        configure_by_viewport,
        clear_by_viewport,
        Viewport,
        ViewportId
    );

    editor_category!(
        filter_by_view_actor,
        remove_by_view_actor,
        configure_by_view_actor,
        clear_by_view_actor,
        ViewActor,
        Option<ViewActorId>
    );

    editor_category!(
        filter_by_player_index,
        remove_by_player_index,
        configure_by_player_index,
        clear_by_player_index,
        PlayerIndex,
        i32
    );

    /// When set, the pass stops rendering into any view at all.
    pub fn set_exclude_all(&self, exclude: bool) {
        self.apply(FilterMutation::ExcludeAll(exclude));
    }
}
