use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{CardError, CardResult};

/// Card export settings. Every field has a default, so an empty JSON object is valid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Logical card width.
    pub width: u32,
    /// Logical card height.
    pub height: u32,
    /// Device pixels per logical unit.
    pub pixel_density: u32,
    /// Upper bound on the wait for each embedded image.
    pub image_timeout_ms: u64,
    /// PDF page width in millimetres (landscape).
    pub page_width_mm: f64,
    /// PDF page height in millimetres.
    pub page_height_mm: f64,
    /// Optional regular-weight font file; the system sans-serif face is used otherwise.
    pub font_regular: Option<PathBuf>,
    /// Optional bold font file.
    pub font_bold: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: 1400,
            height: 700,
            pixel_density: 2,
            image_timeout_ms: 3000,
            page_width_mm: 297.0,
            page_height_mm: 148.5,
            font_regular: None,
            font_bold: None,
        }
    }
}

impl ExportConfig {
    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.width.saturating_mul(self.pixel_density),
            self.height.saturating_mul(self.pixel_density),
        )
    }

    pub fn validate(&self) -> CardResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CardError::validation("card width/height must be > 0"));
        }
        if self.pixel_density == 0 || self.pixel_density > 8 {
            return Err(CardError::validation("pixel_density must be in 1..=8"));
        }
        let (w, h) = self.pixel_size();
        if w > u32::from(u16::MAX) || h > u32::from(u16::MAX) {
            return Err(CardError::validation(format!(
                "card raster size {w}x{h} exceeds {0}x{0}",
                u16::MAX
            )));
        }
        if !(self.page_width_mm > 0.0 && self.page_height_mm > 0.0) {
            return Err(CardError::validation("PDF page size must be > 0"));
        }
        Ok(())
    }

    /// Apply `BIRTHDAY_CARD_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(ms) = env_parse::<u64>("BIRTHDAY_CARD_IMAGE_TIMEOUT_MS") {
            self.image_timeout_ms = ms;
        }
        if let Some(d) = env_parse::<u32>("BIRTHDAY_CARD_PIXEL_DENSITY").filter(|&d| d > 0) {
            self.pixel_density = d;
        }
        if let Ok(p) = std::env::var("BIRTHDAY_CARD_FONT") {
            self.font_regular = Some(PathBuf::from(p));
        }
        self
    }
}

/// Upper bound on projectiles in flight at once.
pub const MAX_ACTIVE_PROJECTILES: usize = 5;

/// Fireworks simulation and presentation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FireworksConfig {
    /// Chance per frame of launching a projectile.
    pub spawn_probability: f64,
    /// In-flight cap, at most [`MAX_ACTIVE_PROJECTILES`].
    pub max_projectiles: usize,
    /// Added to a rising projectile's vertical velocity each frame.
    pub gravity: f64,
    /// Added to an explosion fragment's vertical velocity each frame.
    pub particle_gravity: f64,
    /// Alpha lost by a fragment each frame.
    pub particle_decay: f32,
    /// Fragment count range, `[min, max)`.
    pub burst_min: usize,
    pub burst_max: usize,
    /// Opacity of the dark overlay that produces trails.
    pub trail_fade: f32,
    /// Glow blur in pixels; 0 disables the glow layer.
    pub glow_px: f32,
    pub frame_interval_ms: u64,
}

impl Default for FireworksConfig {
    fn default() -> Self {
        Self {
            spawn_probability: 0.05,
            max_projectiles: MAX_ACTIVE_PROJECTILES,
            gravity: 0.15,
            particle_gravity: 0.08,
            particle_decay: 0.015,
            burst_min: 50,
            burst_max: 100,
            trail_fade: 0.1,
            glow_px: 10.0,
            frame_interval_ms: 16,
        }
    }
}

impl FireworksConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    /// Wall-clock time `frames` frames take at the configured interval.
    pub fn run_length(&self, frames: u64) -> CardResult<Duration> {
        u32::try_from(frames)
            .ok()
            .and_then(|n| self.frame_interval().checked_mul(n))
            .ok_or_else(|| {
                CardError::validation(format!(
                    "{frames} frames at {} ms each is too long to run",
                    self.frame_interval_ms
                ))
            })
    }

    pub fn validate(&self) -> CardResult<()> {
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return Err(CardError::validation("spawn_probability must be in [0, 1]"));
        }
        if self.max_projectiles > MAX_ACTIVE_PROJECTILES {
            return Err(CardError::validation(format!(
                "max_projectiles must be at most {MAX_ACTIVE_PROJECTILES}"
            )));
        }
        if self.burst_min == 0 || self.burst_min >= self.burst_max {
            return Err(CardError::validation(
                "burst range must satisfy 0 < burst_min < burst_max",
            ));
        }
        if !(self.particle_decay > 0.0 && self.particle_decay <= 1.0) {
            return Err(CardError::validation("particle_decay must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.trail_fade) {
            return Err(CardError::validation("trail_fade must be in [0, 1]"));
        }
        Ok(())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(ms) = env_parse::<u64>("BIRTHDAY_CARD_FRAME_INTERVAL_MS").filter(|&n| n > 0) {
            self.frame_interval_ms = ms;
        }
        if let Some(g) = env_parse::<f32>("BIRTHDAY_CARD_GLOW_PX").filter(|g| g.is_finite()) {
            self.glow_px = g.max(0.0);
        }
        self
    }
}

/// Combined config file layout: `{ "export": {...}, "fireworks": {...} }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub export: ExportConfig,
    pub fireworks: FireworksConfig,
}

impl AppConfig {
    pub fn from_json_file(path: &Path) -> CardResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse config '{}'", path.display()))?;
        cfg.export.validate()?;
        cfg.fireworks.validate()?;
        Ok(cfg)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
