//! Simulation-thread facade driving components and passes once per frame.

use crate::component::PassComponent;
use crate::subsystem::PassSubsystem;
use crossbeam_channel::{Receiver, Sender, unbounded};
use delegate::delegate;
use prism_render::filter::FilterMutation;
use prism_render::message::RenderCommand;
use prism_render::pass::PassTypeId;
use prism_render::view::SceneId;
use prism_utils::{PassComponentKey, ProxyBytes, threading};
use slotmap::SlotMap;
use tracing::instrument;
use web_time::Duration;

/// Work routed back to the simulation thread from other threads, drained at
/// the start of every update.
pub type GameTask = Box<dyn FnOnce(&mut World) + Send>;

struct ComponentSlot {
    component: Box<dyn PassComponent>,
    pass: PassTypeId,
    enabled: bool,
    /// False when the component found no pass to join; it then renders
    /// nothing but otherwise lives normally.
    registered: bool,
}

/// Owns the pass subsystem and the spawned pass components.
///
/// The embedding engine drives [`World::update`] once per frame on the
/// simulation thread; everything the submission thread needs crosses over
/// through the render command queue handed in at construction.
pub struct World {
    scene: SceneId,
    pub subsystem: PassSubsystem,
    components: SlotMap<PassComponentKey, ComponentSlot>,
    render_tx: Sender<RenderCommand>,
    task_tx: Sender<GameTask>,
    task_rx: Receiver<GameTask>,
    delta_time: Duration,
}

impl World {
    pub fn new(scene: SceneId, render_tx: Sender<RenderCommand>) -> Self {
        let (task_tx, task_rx) = unbounded();
        Self {
            scene,
            subsystem: PassSubsystem::new(scene, render_tx.clone(), task_tx.clone()),
            components: SlotMap::with_key(),
            render_tx,
            task_tx,
            task_rx,
            delta_time: Duration::ZERO,
        }
    }

    pub fn scene(&self) -> SceneId {
        self.scene
    }

    pub fn delta_time(&self) -> Duration {
        self.delta_time
    }

    /// Sender for work that must run on the simulation thread.
    pub fn task_sender(&self) -> Sender<GameTask> {
        self.task_tx.clone()
    }

    /// Spawns a pass component and registers it with its pass, creating the
    /// pass on first use.
    ///
    /// A component that cannot find or create its pass (e.g. while the
    /// subsystem tears down) is kept but never renders; the failure is
    /// logged, not fatal.
    pub fn spawn_component(&mut self, component: Box<dyn PassComponent>) -> PassComponentKey {
        threading::assert_game_thread("World::spawn_component");

        let pass = component.pass_type();
        let key = self.components.insert(ComponentSlot {
            component,
            pass,
            enabled: true,
            registered: false,
        });
        self.components[key].registered = self.subsystem.register_component(key, pass);
        key
    }

    /// Despawns a component: unregisters it from its pass and queues the
    /// submission-side destruction of its proxy, so frames already in flight
    /// keep observing a valid blob.
    pub fn despawn_component(&mut self, key: PassComponentKey) {
        threading::assert_game_thread("World::despawn_component");

        let Some(slot) = self.components.remove(key) else {
            return;
        };
        if slot.registered {
            self.subsystem.unregister_component(key, slot.pass);
        }
        let _ = self.render_tx.send(RenderCommand::DestroyProxy(key));
    }

    /// Disabled components stay registered but are skipped by the per-frame
    /// snapshot until re-enabled.
    pub fn set_component_enabled(&mut self, key: PassComponentKey, enabled: bool) {
        if let Some(slot) = self.components.get_mut(key) {
            slot.enabled = enabled;
        }
    }

    pub fn component_exists(&self, key: PassComponentKey) -> bool {
        self.components.contains_key(key)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// One simulation frame: drain routed tasks, tick components and publish
    /// their fresh proxies, then tick every pass.
    #[instrument(skip_all)]
    #[profiling::function]
    pub fn update(&mut self, delta_time: Duration) {
        threading::assert_game_thread("World::update");
        self.delta_time = delta_time;

        self.drain_tasks();
        self.publish_component_proxies(delta_time);

        let components = &self.components;
        self.subsystem.tick(delta_time, |key| {
            components
                .get(key)
                .is_some_and(|slot| slot.enabled && slot.registered)
        });
    }

    fn drain_tasks(&mut self) {
        while let Ok(task) = self.task_rx.try_recv() {
            task(self);
        }
    }

    #[profiling::function]
    fn publish_component_proxies(&mut self, delta_time: Duration) {
        for (key, slot) in &mut self.components {
            if !slot.registered {
                continue;
            }

            slot.component.update(delta_time);

            let mut bytes = ProxyBytes::new();
            slot.component.construct_proxy(&mut bytes);
            let _ = self.render_tx.send(RenderCommand::PublishProxy {
                component: key,
                bytes,
                target: slot.component.target(),
            });
        }
    }

    /// Applies a filter mutation to a pass: the simulation-side copy right
    /// here, the submission-side copy through the command queue.
    pub fn edit_pass_filter(&mut self, pass: PassTypeId, mutation: FilterMutation) {
        threading::assert_game_thread("World::edit_pass_filter");

        let _ = self
            .render_tx
            .send(RenderCommand::EditFilter(pass, mutation.clone()));
        self.subsystem.apply_filter_mutation_local(pass, &mutation);
    }

    delegate! {
        to self.subsystem {
            /// See [`PassSubsystem::destroy_pass`].
            pub fn destroy_pass(&mut self, pass: PassTypeId) -> bool;
            /// See [`PassSubsystem::begin_destroy`].
            pub fn begin_destroy(&mut self);
            /// See [`PassSubsystem::is_ready_for_finish_destroy`].
            pub fn is_ready_for_finish_destroy(&self) -> bool;
            /// See [`PassSubsystem::finish_destroy`].
            pub fn finish_destroy(&mut self);
        }
    }
}
