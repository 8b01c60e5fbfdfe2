//! Submission-thread owner of all pass state.

use crate::message::RenderCommand;
use crate::pass::{PassHost, PassTypeId, SubmissionCtx, ViewDrawCtx};
use crate::proxy::ProxySlot;
use crate::submit::GpuPassEncoder;
use crate::view::{SceneId, ViewFamily};
use crossbeam_channel::Receiver;
use itertools::Itertools;
use prism_utils::{MAX_INLINE_PROXY_BYTE_SIZE, PassComponentKey, threading};
use std::collections::HashMap;
use std::mem;
use std::sync::atomic::Ordering;
use tracing::{instrument, trace, warn};
use web_time::Duration;

/// Consumes the command queue fed by the simulation thread and drives
/// per-view dispatch for the engine's view-rendering pipeline.
///
/// All state in here is confined to the submission thread.
#[derive(Default)]
pub struct RenderScheduler {
    /// Latest published proxy of every live component, across all passes.
    proxy_store: HashMap<PassComponentKey, ProxySlot>,
    hosts: HashMap<PassTypeId, PassHost>,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains every pending command in enqueue order. Call once per frame,
    /// before view dispatch.
    #[profiling::function]
    pub fn pump(&mut self, rx: &Receiver<RenderCommand>) {
        while let Ok(command) = rx.try_recv() {
            self.handle_command(command);
        }
    }

    #[instrument(skip_all)]
    pub fn handle_command(&mut self, command: RenderCommand) {
        threading::assert_render_thread("RenderScheduler::handle_command");

        match command {
            RenderCommand::PublishProxy {
                component,
                bytes,
                target,
            } => {
                self.proxy_store
                    .insert(component, ProxySlot { bytes, target });
            }
            RenderCommand::DestroyProxy(component) => {
                self.proxy_store.remove(&component);
            }
            RenderCommand::InitPass {
                pass,
                mut submission,
                extension,
            } => {
                trace!("Initializing pass {pass:?} on the submission thread");
                submission.init_render_thread();
                self.hosts.insert(pass, PassHost::new(submission, extension));
            }
            RenderCommand::TickPass {
                pass,
                scene,
                delta_time,
                components,
            } => {
                self.tick_pass(pass, scene, delta_time, &components);
            }
            RenderCommand::EditFilter(pass, mutation) => {
                if let Some(host) = self.hosts.get_mut(&pass) {
                    host.filter.apply(&mutation);
                }
            }
            RenderCommand::CleanupPass {
                pass,
                subsystem_dying,
            } => {
                if let Some(mut host) = self.hosts.remove(&pass) {
                    trace!("Cleaning up pass {pass:?} on the submission thread");
                    host.submission.cleanup_render_thread(subsystem_dying);
                    host.extension.kill_rendering();
                }
            }
            RenderCommand::Fence(flag) => flag.store(true, Ordering::Release),
            RenderCommand::Batch(batch) => {
                for command in batch {
                    self.handle_command(command);
                }
            }
        }
    }

    /// Rebuilds the pass's proxy table from the published snapshots, then
    /// runs its submission hook. Both halves live in one command, so the
    /// hook always observes a fully consistent table.
    #[profiling::function]
    fn tick_pass(
        &mut self,
        pass: PassTypeId,
        scene: SceneId,
        delta_time: Duration,
        components: &[PassComponentKey],
    ) {
        // The pass may have been cleaned up with a tick still in flight.
        let Some(host) = self.hosts.get_mut(&pass) else {
            trace!("Dropping tick for unknown pass {pass:?}");
            return;
        };

        host.proxies.clear();
        for &key in components {
            // The simulation-side component can die while this command is in
            // flight; its published proxy is simply gone by now.
            let Some(slot) = self.proxy_store.get(&key) else {
                continue;
            };

            if !host.warned_proxy_spill && slot.bytes.spilled() {
                warn!(
                    "A component proxy for pass {pass:?} exceeds {MAX_INLINE_PROXY_BYTE_SIZE} \
                     bytes ({} bytes) and gets heap-allocated every frame; consider a pooled \
                     pointer in the proxy instead",
                    slot.bytes.len()
                );
                host.warned_proxy_spill = true;
            }

            host.proxies.insert(key, slot.clone());
        }

        host.submission.submit(SubmissionCtx {
            scene,
            delta_time,
            proxies: &host.proxies,
            filter: &host.filter,
        });
    }

    /// Runs the per-view hook chain of every active pass for one view family.
    ///
    /// Hosts are visited in a stable name order so emitted work stays
    /// deterministic across frames.
    #[instrument(skip_all)]
    #[profiling::function]
    pub fn dispatch_views(&mut self, family: &mut ViewFamily, encoder: &mut dyn GpuPassEncoder) {
        threading::assert_render_thread("RenderScheduler::dispatch_views");

        let ctx = family.context();
        let active: Vec<PassTypeId> = self
            .hosts
            .iter()
            .filter(|(_, host)| host.is_active(&ctx))
            .map(|(id, _)| *id)
            .sorted_by_key(|id| id.short_name())
            .collect();

        for id in active {
            let Some(host) = self.hosts.get_mut(&id) else {
                continue;
            };
            let PassHost {
                submission,
                filter,
                proxies,
                ..
            } = host;

            submission.setup_view_family(family);

            let mut views = mem::take(&mut family.views);
            for view in &mut views {
                submission.setup_view(family, view);
            }
            family.views = views;

            submission.begin_render_view_family(family);

            for view in family.views.iter() {
                if !filter.should_render_for_view(view) {
                    continue;
                }
                submission.render_view(
                    view,
                    &mut ViewDrawCtx {
                        proxies: &*proxies,
                        encoder: &mut *encoder,
                    },
                );
            }
        }
    }

    pub fn host(&self, pass: PassTypeId) -> Option<&PassHost> {
        self.hosts.get(&pass)
    }

    pub fn pass_count(&self) -> usize {
        self.hosts.len()
    }

    /// The latest published proxy of a component, if it is still alive.
    pub fn published_proxy(&self, component: PassComponentKey) -> Option<&ProxySlot> {
        self.proxy_store.get(&component)
    }

    pub fn published_proxy_count(&self) -> usize {
        self.proxy_store.len()
    }
}
