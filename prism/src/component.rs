use bytemuck::Pod;
use prism_render::pass::PassTypeId;
use prism_utils::{PrimitiveHandle, ProxyBytes};
use std::any::Any;
use web_time::Duration;

/// Marks a scene object as participating in some custom render pass.
///
/// Implementations publish a small POD snapshot of their render-relevant
/// state once per frame; the submission thread only ever reads that
/// snapshot, never the component itself. Components register with their pass
/// when spawned into a [`World`](crate::World) and unregister on despawn.
pub trait PassComponent: Any {
    /// The pass this component belongs to. Evaluated at spawn to find or
    /// lazily create the pass; usually implemented as
    /// `register_pass_type::<MyPass>()`.
    fn pass_type(&self) -> PassTypeId;

    /// Writes this frame's proxy snapshot into `out`.
    ///
    /// Snapshots over
    /// [`MAX_INLINE_PROXY_BYTE_SIZE`](prism_utils::MAX_INLINE_PROXY_BYTE_SIZE)
    /// bytes still work but get heap-allocated every frame and warn once per
    /// pass.
    fn construct_proxy(&self, out: &mut ProxyBytes);

    /// The drawable this component represents, if any. Held as a weak
    /// handle; the submission thread validates it per access.
    fn target(&self) -> Option<PrimitiveHandle> {
        None
    }

    /// Simulation-thread per-frame hook, runs before the proxy snapshot is
    /// taken.
    fn update(&mut self, _delta_time: Duration) {}
}

/// Writes a single POD value as the whole proxy, the most common
/// `construct_proxy` body.
pub fn write_simple_proxy<T: Pod>(out: &mut ProxyBytes, value: T) {
    out.write_pod(&value);
}
