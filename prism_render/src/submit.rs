//! GPU command-submission collaborator.
//!
//! The framework only *describes* GPU work: a pass hands opaque compute or
//! screen pass descriptions to the engine's [`GpuPassEncoder`], which records
//! them against the actual hardware backend.

use crate::view::PixelRect;
use prism_utils::ProxyBytes;
use slotmap::new_key_type;
use std::any::Any;
use std::fmt::{Debug, Formatter};

new_key_type! {
    /// Handle to a GPU buffer owned by the engine's resource system.
    pub struct GpuBufferHandle;

    /// Handle to a GPU texture owned by the engine's resource system.
    pub struct GpuTextureHandle;
}

/// Backend hook run while the submission collaborator records the pass,
/// handed the backend's own pass object for bind-group setup.
pub type PassSetupFn = Box<dyn FnOnce(&mut dyn Any) + Send>;

/// How many workgroups a compute pass dispatches.
pub enum DispatchSize {
    /// A literal 3D group count known at enqueue time.
    Direct([u32; 3]),
    /// Group count sourced from a GPU buffer at execution time.
    Indirect {
        buffer: GpuBufferHandle,
        offset: u64,
    },
    /// Group count computed on the submission timeline just before dispatch.
    Deferred(Box<dyn FnOnce() -> [u32; 3] + Send>),
}

impl Debug for DispatchSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchSize::Direct(groups) => write!(f, "Direct {groups:?}"),
            DispatchSize::Indirect { buffer, offset } => {
                write!(f, "Indirect {buffer:?} @ {offset}")
            }
            DispatchSize::Deferred(_) => write!(f, "Deferred"),
        }
    }
}

/// An opaque compute pass description.
pub struct ComputePassDesc {
    pub label: &'static str,
    /// POD parameter block for the pass's bind group.
    pub params: ProxyBytes,
    pub dispatch: DispatchSize,
    pub setup: Option<PassSetupFn>,
}

/// An opaque screen-space draw pass description.
pub struct ScreenPassDesc {
    pub label: &'static str,
    pub params: ProxyBytes,
    pub input: GpuTextureHandle,
    pub output: GpuTextureHandle,
    /// Output-target subrectangle the draw covers.
    pub output_rect: PixelRect,
    pub setup: Option<PassSetupFn>,
}

/// The GPU command-submission collaborator, implemented by the engine over
/// its graph builder.
pub trait GpuPassEncoder {
    fn add_compute_pass(&mut self, desc: ComputePassDesc);
    fn add_screen_pass(&mut self, desc: ScreenPassDesc);
}

/// Depth reduction used by the downsample helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthDownsampleFilter {
    Point,
    Max,
    CheckerMinMax,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct DownsampleDepthParams {
    dest_size: [i32; 2],
    source_max_uv: [f32; 2],
    filter_mode: u32,
    _pad: u32,
}

/// Describes a depth downsample as a screen pass. The reduction shader lives
/// with the engine; this only builds the submission description.
pub fn add_downsample_depth_pass(
    encoder: &mut dyn GpuPassEncoder,
    input: GpuTextureHandle,
    input_rect: PixelRect,
    output: GpuTextureHandle,
    output_rect: PixelRect,
    filter: DepthDownsampleFilter,
) {
    // Clamp sampling to the view's subrectangle so neighboring views in the
    // same target never bleed in.
    let source_max_uv = [
        (input_rect.size.x as f32 - 0.5) / input_rect.size.x as f32,
        (input_rect.size.y as f32 - 0.5) / input_rect.size.y as f32,
    ];

    let mut params = ProxyBytes::new();
    params.write_pod(&DownsampleDepthParams {
        dest_size: [output_rect.size.x, output_rect.size.y],
        source_max_uv,
        filter_mode: filter as u32,
        _pad: 0,
    });

    encoder.add_screen_pass(ScreenPassDesc {
        label: "DownsampleDepth",
        params,
        input,
        output,
        output_rect,
        setup: None,
    });
}
