//! Utility helpers: vector math, trace timers, and frame profiling.

pub mod logging;
pub mod math;
pub mod profiling;

pub use logging::{warn_if_frame_budget_exceeded, ScopedTimer};
pub use math::*;
pub use profiling::{FrameProfile, ProfileTimer};
