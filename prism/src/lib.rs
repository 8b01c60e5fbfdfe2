//! Simulation-thread half of the Prism custom render pass framework.
//!
//! A [`World`] owns the [`PassSubsystem`] and the registered
//! [`PassComponent`]s. Each frame it publishes fresh component proxies to the
//! submission thread and ticks every pass; the submission side is driven by
//! [`prism_render::RenderScheduler`] on its own thread, consuming the shared
//! command queue.

pub mod component;
pub mod pass;
pub mod subsystem;
pub mod world;

pub use component::{PassComponent, write_simple_proxy};
pub use pass::{FilterEditor, PassTypeInfo, RenderPass, pass_type_info, register_pass_type};
pub use subsystem::{PassState, PassSubsystem};
pub use world::{GameTask, World};

pub use prism_render as render;
pub use prism_utils as utils;
