//! Fireworks: rising projectiles that burst into fading fragments.

pub mod canvas;
pub mod engine;
pub mod frame_loop;
pub mod particle;

pub use canvas::FireworksCanvas;
pub use engine::{FireworksEngine, FrameStats, PALETTE};
pub use frame_loop::{
    CancellationToken, FrameLoop, FrameScheduler, FrameSink, InMemoryFrameSink,
    ManualScheduler, MountedFireworks, PngSequenceSink, TickScheduler, ViewEvent,
};
pub use particle::{Particle, Projectile};
