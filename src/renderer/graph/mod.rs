//! Forward render graph
//!
//! - [`RenderPass`]: one stage of the frame, ordered by [`PassPriority`]
//! - [`RenderContext`]: per-frame state shared by all passes, including the
//!   [`TextureSlots`] passes publish for each other
//! - [`FrameEncoder`]: the frame's command encoder and bound target
//! - [`ForwardPipeline`]: owns the passes and drives a frame
//! - [`passes`]: the built-in passes

pub mod context;
pub mod frame;
pub mod graph;
pub mod node;
pub mod passes;
pub mod pipeline;
pub mod shadow_utils;
pub mod stage;
pub mod targets;

pub use context::{RenderContext, TextureHandle, TextureSlot, TextureSlots};
pub use frame::{AttachmentView, ClearValues, FrameEncoder, TEXTURE_UNITS, TargetKind};
pub use graph::PassList;
pub use node::{PassResult, RenderPass};
pub use pipeline::{ForwardPipeline, FrameReport};
pub use stage::PassPriority;
pub use targets::{BlitProgram, PingPongTarget, PingPongTargets};
