//! Mesh batch collaborator.
//!
//! Custom passes that draw scene geometry pull their batches from the
//! engine's per-frame visibility bookkeeping through [`MeshBatchSource`].
//! The sequences are finite, enumerated once per call, and never restarted.

use crate::view::RenderView;
use prism_utils::{PrimitiveHandle, debug_panic};
use std::ops::Range;

/// Default mask drawing every element of a batch.
pub const FULL_ELEMENT_MASK: u64 = u64::MAX;

/// One draw batch surfaced for a primitive in a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBatch {
    /// The proxy that owns the batch.
    pub primitive: PrimitiveHandle,
    /// Mask of the batch elements to draw.
    pub element_mask: u64,
    /// Set for batches coming from the static mesh path.
    pub static_mesh_index: Option<u32>,
}

/// The engine's visibility bookkeeping for one frame.
pub trait MeshBatchSource {
    /// The primitive's index in its scene, if it is registered there.
    fn primitive_index(&self, primitive: PrimitiveHandle) -> Option<u32>;

    /// Whether the view marked the primitive visible this frame.
    fn is_visible(&self, view: &RenderView, primitive_index: u32) -> bool;

    /// Visible static-path batches of the primitive, with their element masks.
    fn static_batches(&self, view: &RenderView, primitive_index: u32, out: &mut Vec<MeshBatch>);

    /// Index range of the primitive's dynamic batches in this view. Static
    /// primitives usually report an empty range here, even movable ones.
    fn dynamic_batch_range(&self, view: &RenderView, primitive_index: u32) -> Range<u32>;

    /// One dynamic batch by index. `None` inside the advertised range is a
    /// broken contract.
    fn dynamic_batch(&self, view: &RenderView, batch_index: u32) -> Option<MeshBatch>;
}

/// Enumerates every batch of a primitive visible in the view: static batches
/// first, then the dynamic range. Primitives without a scene presence or not
/// visible this frame yield nothing.
pub fn for_each_batch(
    source: &dyn MeshBatchSource,
    view: &RenderView,
    primitive: Option<PrimitiveHandle>,
    mut visit: impl FnMut(&MeshBatch),
) {
    let Some(primitive) = primitive else {
        return;
    };
    let Some(index) = source.primitive_index(primitive) else {
        return;
    };
    if !source.is_visible(view, index) {
        return;
    }

    let mut statics = Vec::new();
    source.static_batches(view, index, &mut statics);
    for batch in &statics {
        visit(batch);
    }

    for batch_index in source.dynamic_batch_range(view, index) {
        let Some(batch) = source.dynamic_batch(view, batch_index) else {
            debug_panic!(
                "Mesh batch source advertised dynamic batch {batch_index} but returned nothing"
            );
            continue;
        };
        visit(&batch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{PixelRect, RenderTargetId, SceneId, ViewKey, ViewportId};
    use slotmap::{KeyData, SecondaryMap, SlotMap};

    struct FakeVisibility {
        indices: SecondaryMap<PrimitiveHandle, u32>,
        visible: Vec<bool>,
        statics: Vec<Vec<MeshBatch>>,
        dynamics: Vec<Range<u32>>,
        dynamic_batches: Vec<Option<MeshBatch>>,
    }

    impl MeshBatchSource for FakeVisibility {
        fn primitive_index(&self, primitive: PrimitiveHandle) -> Option<u32> {
            self.indices.get(primitive).copied()
        }

        fn is_visible(&self, _view: &RenderView, primitive_index: u32) -> bool {
            self.visible[primitive_index as usize]
        }

        fn static_batches(
            &self,
            _view: &RenderView,
            primitive_index: u32,
            out: &mut Vec<MeshBatch>,
        ) {
            out.extend_from_slice(&self.statics[primitive_index as usize]);
        }

        fn dynamic_batch_range(&self, _view: &RenderView, primitive_index: u32) -> Range<u32> {
            self.dynamics[primitive_index as usize].clone()
        }

        fn dynamic_batch(&self, _view: &RenderView, batch_index: u32) -> Option<MeshBatch> {
            self.dynamic_batches[batch_index as usize]
        }
    }

    fn view() -> RenderView {
        RenderView::builder()
            .key(ViewKey(1))
            .scene(SceneId(1))
            .render_target(RenderTargetId(1))
            .viewport(ViewportId::PRIMARY)
            .pixel_rect(PixelRect::new(0, 0, 64, 64))
            .build()
    }

    fn batch(primitive: PrimitiveHandle, static_index: Option<u32>) -> MeshBatch {
        MeshBatch {
            primitive,
            element_mask: FULL_ELEMENT_MASK,
            static_mesh_index: static_index,
        }
    }

    #[test]
    fn statics_come_before_the_dynamic_range() {
        let mut primitives: SlotMap<PrimitiveHandle, ()> = SlotMap::with_key();
        let prim = primitives.insert(());
        let mut indices = SecondaryMap::new();
        indices.insert(prim, 0);

        let source = FakeVisibility {
            indices,
            visible: vec![true],
            statics: vec![vec![batch(prim, Some(0)), batch(prim, Some(1))]],
            dynamics: vec![0..1],
            dynamic_batches: vec![Some(batch(prim, None))],
        };

        let mut seen = Vec::new();
        for_each_batch(&source, &view(), Some(prim), |b| seen.push(*b));

        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].static_mesh_index, Some(0));
        assert_eq!(seen[1].static_mesh_index, Some(1));
        assert_eq!(seen[2].static_mesh_index, None);
    }

    #[test]
    fn unregistered_or_invisible_primitives_yield_nothing() {
        let mut primitives: SlotMap<PrimitiveHandle, ()> = SlotMap::with_key();
        let registered = primitives.insert(());
        let unregistered = PrimitiveHandle::from(KeyData::from_ffi(1 << 32 | 77));
        let mut indices = SecondaryMap::new();
        indices.insert(registered, 0);

        let source = FakeVisibility {
            indices,
            visible: vec![false],
            statics: vec![vec![batch(registered, Some(0))]],
            dynamics: vec![0..0],
            dynamic_batches: vec![],
        };

        let mut seen = Vec::new();
        for_each_batch(&source, &view(), Some(unregistered), |b| seen.push(*b));
        for_each_batch(&source, &view(), Some(registered), |b| seen.push(*b));
        for_each_batch(&source, &view(), None, |b| seen.push(*b));

        assert!(seen.is_empty());
    }
}
