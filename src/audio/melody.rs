use std::io::Write;
use std::time::Duration;

use anyhow::Context as _;

use crate::foundation::error::{CardError, CardResult};

/// One tone of the melody. Times are seconds from the start of the loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Note {
    pub frequency_hz: f64,
    pub start_s: f64,
    pub duration_s: f64,
}

const fn note(frequency_hz: f64, start_s: f64, duration_s: f64) -> Note {
    Note {
        frequency_hz,
        start_s,
        duration_s,
    }
}

/// "Happy Birthday", first two phrases.
pub const HAPPY_BIRTHDAY: [Note; 12] = [
    note(392.0, 0.0, 0.4),
    note(392.0, 0.4, 0.2),
    note(440.0, 0.6, 0.6),
    note(392.0, 1.2, 0.6),
    note(523.0, 1.8, 0.6),
    note(494.0, 2.4, 1.2),
    note(392.0, 3.6, 0.4),
    note(392.0, 4.0, 0.2),
    note(440.0, 4.2, 0.6),
    note(392.0, 4.8, 0.6),
    note(587.0, 5.4, 0.6),
    note(523.0, 6.0, 1.2),
];

/// The melody restarts every this many seconds.
pub const LOOP_SECONDS: f64 = 8.0;
pub const START_GAIN: f64 = 0.15;
pub const END_GAIN: f64 = 0.01;

/// A playing (or stopped) melody owned by one view.
///
/// Samples are produced on demand by [`render`](Self::render); nothing plays in the
/// background. Dropping the session stops it.
#[derive(Debug)]
pub struct MelodySession {
    sample_rate: u32,
    position: u64,
    playing: bool,
}

impl MelodySession {
    pub fn new(sample_rate: u32) -> CardResult<Self> {
        if sample_rate == 0 {
            return Err(CardError::validation("sample rate must be > 0"));
        }
        Ok(Self {
            sample_rate,
            position: 0,
            playing: false,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Time played since `start`.
    pub fn position(&self) -> Duration {
        Duration::from_secs_f64(self.position as f64 / f64::from(self.sample_rate))
    }

    /// Start from the top of the melody. No-op while already playing.
    pub fn start(&mut self) {
        if self.playing {
            return;
        }
        self.position = 0;
        self.playing = true;
        tracing::debug!(sample_rate = self.sample_rate, "melody started");
    }

    pub fn stop(&mut self) {
        if self.playing {
            self.playing = false;
            tracing::debug!(played = ?self.position(), "melody stopped");
        }
    }

    /// Fill `out` with mono samples; silence when stopped.
    pub fn render(&mut self, out: &mut [f32]) {
        if !self.playing {
            out.fill(0.0);
            return;
        }
        let rate = f64::from(self.sample_rate);
        let loop_len = (LOOP_SECONDS * rate).round() as u64;
        for s in out.iter_mut() {
            let t = (self.position % loop_len) as f64 / rate;
            *s = sample_at(t) as f32;
            self.position += 1;
        }
    }

    /// One full loop from the top, leaving the session stopped.
    pub fn render_loop(&mut self) -> Vec<f32> {
        self.stop();
        self.start();
        let mut out = vec![0.0; (LOOP_SECONDS * f64::from(self.sample_rate)).round() as usize];
        self.render(&mut out);
        self.stop();
        out
    }
}

impl Drop for MelodySession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Melody amplitude `t` seconds into the loop.
pub fn sample_at(t: f64) -> f64 {
    HAPPY_BIRTHDAY
        .iter()
        .filter(|n| t >= n.start_s && t < n.start_s + n.duration_s)
        .map(|n| {
            let dt = t - n.start_s;
            let gain = START_GAIN * (END_GAIN / START_GAIN).powf(dt / n.duration_s);
            gain * triangle((n.frequency_hz * dt).fract())
        })
        .sum()
}

/// Triangle wave over one period, starting at 0 and rising.
fn triangle(phase: f64) -> f64 {
    if phase < 0.25 {
        4.0 * phase
    } else if phase < 0.75 {
        2.0 - 4.0 * phase
    } else {
        4.0 * phase - 4.0
    }
}

/// Raw little-endian `f32` PCM.
pub fn write_f32le(samples: &[f32], out: &mut impl Write) -> CardResult<()> {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    out.write_all(&bytes).context("write pcm samples")?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/audio/melody.rs"]
mod tests;
