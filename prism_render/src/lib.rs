//! Submission-thread half of the Prism custom render pass framework.
//!
//! The [`RenderScheduler`] consumes the command queue fed by the simulation
//! thread, keeps every pass's submission-side state in a [`pass::PassHost`],
//! and drives per-view dispatch for the engine's view-rendering pipeline.

pub mod batches;
pub mod error;
pub mod extension;
pub mod filter;
pub mod message;
pub mod pass;
pub mod per_view;
pub mod proxy;
pub mod scheduler;
pub mod shaders;
pub mod submit;
pub mod view;

pub use error::{FilterError, ShaderLookupError};
pub use extension::SceneViewExtension;
pub use filter::{FilterList, FilterMutation, FilterOp, FilterSet, Polarity};
pub use message::{ComponentSnapshot, MAX_INLINE_COMPONENT_COUNT, RenderCommand, RenderFence};
pub use pass::{PassSubmission, PassTypeId, SubmissionCtx, ViewDrawCtx};
pub use per_view::{PerViewData, ViewPersistentData};
pub use proxy::{ProxySlot, ProxyTable};
pub use scheduler::RenderScheduler;
pub use view::{
    ExtensionContext, FeatureLevel, PixelRect, RenderTargetId, RenderView, SceneId, ViewActorId,
    ViewFamily, ViewKey, ViewportId,
};

pub use prism_utils::{MAX_INLINE_PROXY_BYTE_SIZE, PassComponentKey, PrimitiveHandle, ProxyBytes};
