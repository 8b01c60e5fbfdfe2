//! World-scoped registry of custom render passes.

use crate::pass::{FilterEditor, RenderPass, construct_pass};
use crate::world::GameTask;
use crossbeam_channel::Sender;
use prism_render::extension::SceneViewExtension;
use prism_render::filter::{FilterMutation, FilterSet};
use prism_render::message::{ComponentSnapshot, MAX_INLINE_COMPONENT_COUNT, RenderCommand, RenderFence};
use prism_render::pass::PassTypeId;
use prism_render::view::{ExtensionContext, SceneId};
use prism_utils::{PassComponentKey, threading};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, instrument, trace, warn};
use web_time::Duration;

/// Lifecycle of one pass, as tracked on the simulation thread.
///
/// `Uninitialized` and `Destroyed` have no entry to carry them: before
/// creation the pass simply does not exist, and after the teardown fence
/// drains the entry is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    /// Simulation-side init ran; the submission-side init command is queued.
    Initializing,
    /// Live on both threads.
    Active,
    /// Fenced destruction started; the pass is gone from lookups and waits
    /// for its cleanup command to drain.
    CleaningUp,
}

/// One live pass and its simulation-side state.
pub struct PassEntry {
    pass: Box<dyn RenderPass>,
    extension: Arc<SceneViewExtension>,
    /// Simulation-thread filter copy. The submission side owns its own.
    filter: FilterSet,
    components: HashSet<PassComponentKey>,
    state: PassState,
    warned_component_spill: bool,
}

impl PassEntry {
    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn extension(&self) -> &Arc<SceneViewExtension> {
        &self.extension
    }

    /// The simulation-thread copy of the pass's filters, for activation
    /// decisions made on this side of the frame.
    pub fn filter(&self) -> &FilterSet {
        &self.filter
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Simulation-thread activation predicate, mirroring the submission
    /// side's per-context test.
    pub fn should_render_for(&self, ctx: &ExtensionContext) -> bool {
        self.extension.accepts_context(ctx) && self.filter.should_render_for_context(ctx)
    }

    fn register_component(&mut self, key: PassComponentKey) {
        assert!(
            self.state != PassState::CleaningUp,
            "registered a component on a pass whose fenced destruction already started"
        );
        self.components.insert(key);
    }

    fn unregister_component(&mut self, key: PassComponentKey) {
        self.components.remove(&key);
    }
}

struct DyingPass {
    /// Held only so the pass outlives its in-flight submission commands.
    #[allow(dead_code)]
    entry: PassEntry,
    fence: RenderFence,
}

/// World-scoped registry of custom render passes.
///
/// Creates passes lazily by type, ticks them once per frame, and tears them
/// down through fenced, deferred destruction so no submission-thread command
/// ever runs against a pass whose simulation-side object is gone.
///
/// All functions are simulation-thread only unless noted otherwise.
pub struct PassSubsystem {
    scene: SceneId,
    passes: HashMap<PassTypeId, PassEntry>,
    dying_passes: Vec<DyingPass>,
    tearing_down: bool,
    render_tx: Sender<RenderCommand>,
    task_tx: Sender<GameTask>,
}

impl PassSubsystem {
    pub(crate) fn new(
        scene: SceneId,
        render_tx: Sender<RenderCommand>,
        task_tx: Sender<GameTask>,
    ) -> Self {
        Self {
            scene,
            passes: HashMap::new(),
            dying_passes: Vec::new(),
            tearing_down: false,
            render_tx,
            task_tx,
        }
    }

    pub fn scene(&self) -> SceneId {
        self.scene
    }

    /// The pass of the given type, optionally creating and initializing it.
    ///
    /// Returns `None` when the pass does not exist and creation was not
    /// requested, when the pass type was never registered, or while the
    /// subsystem is tearing down.
    pub fn get_pass(&mut self, pass: PassTypeId, create_if_missing: bool) -> Option<&mut PassEntry> {
        threading::assert_game_thread("PassSubsystem::get_pass");

        if self.passes.contains_key(&pass) {
            return self.passes.get_mut(&pass);
        }
        if !create_if_missing || self.tearing_down {
            return None;
        }

        let Some(mut new_pass) = construct_pass(pass) else {
            error!("Pass type {pass:?} was never registered, so it cannot be created");
            return None;
        };

        trace!("Creating render pass {pass:?}");
        let extension = new_pass.init_game_thread(self.scene);
        let submission = new_pass.create_submission();
        self.passes.insert(
            pass,
            PassEntry {
                pass: new_pass,
                extension: extension.clone(),
                filter: FilterSet::default(),
                components: HashSet::new(),
                state: PassState::Initializing,
                warned_component_spill: false,
            },
        );

        // Initialization finishes over on the submission thread.
        let _ = self.render_tx.send(RenderCommand::InitPass {
            pass,
            submission,
            extension,
        });

        self.passes.get_mut(&pass)
    }

    pub fn pass(&self, pass: PassTypeId) -> Option<&PassEntry> {
        self.passes.get(&pass)
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// A cloneable, thread-safe editor for a live pass's filters.
    pub fn filter_editor(&self, pass: PassTypeId) -> Option<FilterEditor> {
        self.passes.contains_key(&pass).then(|| FilterEditor {
            pass,
            render_tx: self.render_tx.clone(),
            task_tx: self.task_tx.clone(),
        })
    }

    pub(crate) fn apply_filter_mutation_local(
        &mut self,
        pass: PassTypeId,
        mutation: &FilterMutation,
    ) {
        if let Some(entry) = self.passes.get_mut(&pass) {
            entry.filter.apply(mutation);
        }
    }

    pub(crate) fn register_component(&mut self, key: PassComponentKey, pass: PassTypeId) -> bool {
        match self.get_pass(pass, true) {
            Some(entry) => {
                entry.register_component(key);
                true
            }
            None => {
                error!(
                    "A {pass:?} component was created but no pass could be found or made for it; \
                     no custom rendering can happen"
                );
                false
            }
        }
    }

    pub(crate) fn unregister_component(&mut self, key: PassComponentKey, pass: PassTypeId) {
        if let Some(entry) = self.get_pass(pass, false) {
            entry.unregister_component(key);
        }
    }

    /// Ticks every pass: runs its simulation-side hook, snapshots its live
    /// registered components, and queues the submission-side proxy-table
    /// rebuild plus submission hook as one command.
    #[instrument(skip_all)]
    #[profiling::function]
    pub fn tick(&mut self, delta_time: Duration, is_live: impl Fn(PassComponentKey) -> bool) {
        threading::assert_game_thread("PassSubsystem::tick");

        // Tick over a buffered copy of the pass set, in case passes try to
        // disconnect themselves mid-tick and invalidate the map.
        let buffered: SmallVec<[PassTypeId; 8]> = self.passes.keys().copied().collect();
        for pass in buffered {
            let Some(entry) = self.passes.get_mut(&pass) else {
                continue;
            };
            entry.state = PassState::Active;
            entry.pass.tick_game_thread(delta_time);

            let mut snapshot = ComponentSnapshot::new();
            snapshot.extend(entry.components.iter().copied().filter(|key| is_live(*key)));

            if !entry.warned_component_spill && snapshot.len() > MAX_INLINE_COMPONENT_COUNT {
                warn!(
                    "Render pass {pass:?} holds more than {MAX_INLINE_COMPONENT_COUNT} live \
                     components ({}); its per-frame snapshot now heap-allocates",
                    snapshot.len()
                );
                entry.warned_component_spill = true;
            }

            let _ = self.render_tx.send(RenderCommand::TickPass {
                pass,
                scene: self.scene,
                delta_time,
                components: snapshot,
            });
        }
    }

    /// Destroys a pass at a user's request. Returns whether it existed.
    ///
    /// The pass is gone from lookups immediately; its memory and
    /// submission-side state survive behind a fence until the cleanup
    /// command drains.
    pub fn destroy_pass(&mut self, pass: PassTypeId) -> bool {
        self.destroy_pass_impl(pass, true)
    }

    fn destroy_pass_impl(&mut self, pass: PassTypeId, external_call: bool) -> bool {
        threading::assert_game_thread("PassSubsystem::destroy_pass");

        if !self.passes.contains_key(&pass) {
            return false;
        }

        // A user destroy during teardown is redundant with the teardown sweep.
        if self.tearing_down && external_call {
            return true;
        }

        let Some(mut entry) = self.passes.remove(&pass) else {
            return false;
        };
        entry.state = PassState::CleaningUp;

        // The cleanup disables the pass's scene-view extension over on the
        // submission thread; the fence right behind it tells us when every
        // command that could still reference the pass has drained.
        let fence = RenderFence::new();
        let _ = self.render_tx.send(RenderCommand::CleanupPass {
            pass,
            subsystem_dying: self.tearing_down,
        });
        fence.begin(&self.render_tx);

        trace!("Render pass {pass:?} is now draining behind a fence");
        self.dying_passes.push(DyingPass { entry, fence });
        true
    }

    /// Starts subsystem teardown: every remaining pass goes through the same
    /// fenced destruction path. Finalization is deferred until
    /// [`is_ready_for_finish_destroy`](Self::is_ready_for_finish_destroy)
    /// reports true; nothing blocks.
    pub fn begin_destroy(&mut self) {
        threading::assert_game_thread("PassSubsystem::begin_destroy");
        self.tearing_down = true;

        let remaining: Vec<PassTypeId> = self.passes.keys().copied().collect();
        for pass in remaining {
            self.destroy_pass_impl(pass, false);
        }
        debug_assert!(self.passes.is_empty());
    }

    /// True once every dying pass's cleanup has drained on the submission
    /// thread. Polled by the owner; never blocked on.
    pub fn is_ready_for_finish_destroy(&self) -> bool {
        self.dying_passes.iter().all(|dying| dying.fence.is_complete())
    }

    /// Drops the drained passes. Only call once
    /// [`is_ready_for_finish_destroy`](Self::is_ready_for_finish_destroy)
    /// returns true.
    pub fn finish_destroy(&mut self) {
        debug_assert!(self.is_ready_for_finish_destroy());
        self.dying_passes.clear();
    }

    pub fn is_tearing_down(&self) -> bool {
        self.tearing_down
    }

    pub fn dying_pass_count(&self) -> usize {
        self.dying_passes.len()
    }
}
