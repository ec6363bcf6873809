use std::f64::consts::TAU;

use rand::Rng;
use rand::SeedableRng as _;
use rand::rngs::StdRng;

use crate::config::FireworksConfig;
use crate::fireworks::particle::{Particle, Projectile};
use crate::foundation::core::{Point, Rgba8, Vec2};
use crate::foundation::error::{CardError, CardResult};

pub const PALETTE: [Rgba8; 15] = [
    Rgba8::rgb(0xFF, 0x6B, 0x6B),
    Rgba8::rgb(0x4E, 0xCD, 0xC4),
    Rgba8::rgb(0x45, 0xB7, 0xD1),
    Rgba8::rgb(0xFF, 0xA0, 0x7A),
    Rgba8::rgb(0x98, 0xD8, 0xC8),
    Rgba8::rgb(0xF7, 0xDC, 0x6F),
    Rgba8::rgb(0xBB, 0x8F, 0xCE),
    Rgba8::rgb(0x85, 0xC1, 0xE2),
    Rgba8::rgb(0xF8, 0xB7, 0x39),
    Rgba8::rgb(0xFF, 0x85, 0xB3),
    Rgba8::rgb(0xFF, 0xD9, 0x3D),
    Rgba8::rgb(0x6B, 0xCF, 0x7F),
    Rgba8::rgb(0xE7, 0x4C, 0x3C),
    Rgba8::rgb(0x34, 0x98, 0xDB),
    Rgba8::rgb(0x9B, 0x59, 0xB6),
];

const LAUNCH_SPEED: std::ops::Range<f64> = 8.0..12.0;
const BURST_SPEED: std::ops::Range<f64> = 2.0..6.0;
const PARTICLE_RADIUS: std::ops::Range<f64> = 2.0..5.0;

/// What one `step` did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub launched: bool,
    /// Projectiles that burst this frame.
    pub exploded: usize,
    /// Fragments spawned by those bursts.
    pub spawned: usize,
    /// Fragments that faded out this frame.
    pub faded: usize,
    /// Projectiles left after the frame, rising or exploded.
    pub projectiles: usize,
    pub particles: usize,
}

/// Fireworks physics. Owns every projectile; rendering is done separately by
/// [`FireworksCanvas`](crate::fireworks::FireworksCanvas).
#[derive(Debug)]
pub struct FireworksEngine<R: Rng> {
    cfg: FireworksConfig,
    width: f64,
    height: f64,
    rng: R,
    projectiles: Vec<Projectile>,
    frame: u64,
}

impl FireworksEngine<StdRng> {
    /// Engine seeded from the operating system.
    pub fn from_os_rng(cfg: FireworksConfig, width: u32, height: u32) -> CardResult<Self> {
        Self::new(cfg, width, height, StdRng::from_os_rng())
    }
}

impl<R: Rng> FireworksEngine<R> {
    pub fn new(cfg: FireworksConfig, width: u32, height: u32, rng: R) -> CardResult<Self> {
        cfg.validate()?;
        if width == 0 || height == 0 {
            return Err(CardError::validation("fireworks canvas size must be > 0"));
        }
        Ok(Self {
            cfg,
            width: f64::from(width),
            height: f64::from(height),
            rng,
            projectiles: Vec::new(),
            frame: 0,
        })
    }

    pub fn config(&self) -> &FireworksConfig {
        &self.cfg
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }

    /// Change the canvas size. In-flight coordinates are absolute and stay as they are.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = f64::from(width.max(1));
        self.height = f64::from(height.max(1));
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn particle_count(&self) -> usize {
        self.projectiles.iter().map(|p| p.particles.len()).sum()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advance the simulation by one frame.
    pub fn step(&mut self) -> FrameStats {
        self.frame += 1;
        let mut stats = FrameStats {
            frame: self.frame,
            ..FrameStats::default()
        };

        if self.rng.random_bool(self.cfg.spawn_probability) {
            stats.launched = self.launch();
        }

        let (gravity, particle_gravity, decay) = (
            self.cfg.gravity,
            self.cfg.particle_gravity,
            self.cfg.particle_decay,
        );
        let (burst_min, burst_max) = (self.cfg.burst_min, self.cfg.burst_max);
        for p in &mut self.projectiles {
            if p.is_rising() {
                p.rise(gravity);
                if p.has_crested() {
                    stats.spawned += explode(p, &mut self.rng, burst_min, burst_max);
                    stats.exploded += 1;
                }
            } else {
                stats.faded += p.step_particles(particle_gravity, decay);
            }
        }
        self.projectiles.retain(|p| !p.is_spent());

        stats.projectiles = self.projectiles.len();
        stats.particles = self.particle_count();
        stats
    }

    /// Launch one projectile unless the cap is reached.
    pub fn launch(&mut self) -> bool {
        if self.projectiles.len() >= self.cfg.max_projectiles {
            return false;
        }
        let x = self.rng.random_range(0.0..self.width);
        let target_y = self.height * 0.1 + self.rng.random::<f64>() * self.height * 0.4;
        let vy = -self.rng.random_range(LAUNCH_SPEED);
        let color = PALETTE[self.rng.random_range(0..PALETTE.len())];
        self.projectiles
            .push(Projectile::new(Point::new(x, self.height), target_y, vy, color));
        true
    }
}

/// Mark `p` exploded and surround it with evenly spaced fragments.
fn explode<R: Rng>(p: &mut Projectile, rng: &mut R, burst_min: usize, burst_max: usize) -> usize {
    let count = rng.random_range(burst_min..burst_max);
    p.exploded = true;
    p.particles.reserve(count);
    for i in 0..count {
        let angle = TAU * i as f64 / count as f64;
        let speed = rng.random_range(BURST_SPEED);
        p.particles.push(Particle {
            pos: p.pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            alpha: 1.0,
            color: p.color,
            radius: rng.random_range(PARTICLE_RADIUS),
        });
    }
    count
}

#[cfg(test)]
#[path = "../../tests/unit/fireworks/engine.rs"]
mod tests;
