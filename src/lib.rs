//! Whitted-style ray tracing of a physics-driven sphere scene on the CPU.
//!
//! Each frame the [`orchestrator::FrameOrchestrator`] steps the physics, copies the new
//! sphere centers into the scene and hands it to the [`scheduler::TileScheduler`], which
//! traces horizontal bands of the BGRA framebuffer in parallel.

pub mod camera;
pub mod config;
pub mod define_scene;
pub mod error;
pub mod framebuffer;
pub mod orchestrator;
pub mod overlay;
pub mod physics;
pub mod renderer;
pub mod scene;
pub mod scheduler;
pub mod stats;
