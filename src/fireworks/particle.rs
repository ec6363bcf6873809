use crate::foundation::core::{Point, Rgba8, Vec2};

/// Explosion fragment. Coordinates are absolute canvas pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub pos: Point,
    pub vel: Vec2,
    /// In `[0, 1]`; the particle is removed once it reaches 0.
    pub alpha: f32,
    pub color: Rgba8,
    pub radius: f64,
}

impl Particle {
    /// Advance one frame. Returns `false` once the particle has faded out.
    pub fn step(&mut self, gravity: f64, decay: f32) -> bool {
        self.pos += self.vel;
        self.vel.y += gravity;
        self.alpha = (self.alpha - decay).max(0.0);
        self.alpha > 0.0
    }
}

/// Rising firework. Owns the fragments it bursts into.
#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    pub pos: Point,
    pub target_y: f64,
    /// Negative is upward.
    pub vy: f64,
    pub exploded: bool,
    pub particles: Vec<Particle>,
    pub color: Rgba8,
}

impl Projectile {
    pub fn new(pos: Point, target_y: f64, vy: f64, color: Rgba8) -> Self {
        Self {
            pos,
            target_y,
            vy,
            exploded: false,
            particles: Vec::new(),
            color,
        }
    }

    pub fn is_rising(&self) -> bool {
        !self.exploded
    }

    /// Reached the apex height or stopped moving up.
    pub fn has_crested(&self) -> bool {
        self.pos.y <= self.target_y || self.vy >= 0.0
    }

    /// Exploded and every fragment has faded.
    pub fn is_spent(&self) -> bool {
        self.exploded && self.particles.is_empty()
    }

    /// Integrate the rising motion by one frame.
    pub fn rise(&mut self, gravity: f64) {
        self.pos.y += self.vy;
        self.vy += gravity;
    }

    /// Advance every fragment; drop the faded ones. Returns how many were dropped.
    pub fn step_particles(&mut self, gravity: f64, decay: f32) -> usize {
        let before = self.particles.len();
        self.particles.retain_mut(|p| p.step(gravity, decay));
        before - self.particles.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fireworks/particle.rs"]
mod tests;
