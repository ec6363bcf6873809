//! Explicit frame scheduling for the fireworks view.
//!
//! A [`FrameLoop`] advances the engine, draws the canvas and hands the frame to a
//! [`FrameSink`]. Pacing comes from a [`FrameScheduler`] and shutdown from a
//! [`CancellationToken`], so a test can single-step frames and a mounted view can stop
//! without leaving a timer behind.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use rand::Rng;
use rand::rngs::StdRng;

use crate::config::FireworksConfig;
use crate::encode::encode_png;
use crate::fireworks::canvas::FireworksCanvas;
use crate::fireworks::engine::{FireworksEngine, FrameStats};
use crate::foundation::core::Bitmap;
use crate::foundation::error::{CardError, CardResult};

/// Shared stop flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Decides when the next frame runs. Returns `false` to stop the loop.
pub trait FrameScheduler: Send {
    fn wait_next(&mut self, cancel: &CancellationToken) -> bool;
}

/// Wall-clock pacing at a fixed interval.
#[derive(Debug)]
pub struct TickScheduler {
    ticks: Receiver<Instant>,
}

impl TickScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            ticks: crossbeam_channel::tick(interval),
        }
    }
}

impl FrameScheduler for TickScheduler {
    fn wait_next(&mut self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        self.ticks.recv().is_ok() && !cancel.is_cancelled()
    }
}

/// Runs a fixed number of frames back to back, then stops.
#[derive(Clone, Copy, Debug)]
pub struct ManualScheduler {
    remaining: u64,
}

impl ManualScheduler {
    pub fn frames(count: u64) -> Self {
        Self {
            remaining: count.saturating_sub(1),
        }
    }
}

impl FrameScheduler for ManualScheduler {
    fn wait_next(&mut self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() || self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Receives each finished frame as premultiplied RGBA8.
pub trait FrameSink: Send {
    fn frame(&mut self, index: u64, width: u32, height: u32, premul_rgba8: &[u8]) -> CardResult<()>;
}

#[derive(Debug, Default)]
struct SinkState {
    count: u64,
    sizes: Vec<(u32, u32)>,
    last: Option<Bitmap>,
}

/// Keeps the frame count, every frame's size and the most recent frame. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct InMemoryFrameSink {
    state: Arc<Mutex<SinkState>>,
}

impl InMemoryFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.lock().count
    }

    pub fn sizes(&self) -> Vec<(u32, u32)> {
        self.lock().sizes.clone()
    }

    pub fn last(&self) -> Option<Bitmap> {
        self.lock().last.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl FrameSink for InMemoryFrameSink {
    fn frame(&mut self, _index: u64, width: u32, height: u32, premul_rgba8: &[u8]) -> CardResult<()> {
        let bitmap = Bitmap::from_premul(width, height, premul_rgba8.to_vec())?;
        let mut st = self.lock();
        st.count += 1;
        st.sizes.push((width, height));
        st.last = Some(bitmap);
        Ok(())
    }
}

/// Writes every `every`-th frame as `frame_00001.png`, ... into a directory.
#[derive(Clone, Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    every: u64,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>, every: u64) -> CardResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create frame directory '{}'", dir.display()))?;
        Ok(Self {
            dir,
            every: every.max(1),
        })
    }
}

impl FrameSink for PngSequenceSink {
    fn frame(&mut self, index: u64, width: u32, height: u32, premul_rgba8: &[u8]) -> CardResult<()> {
        if index % self.every != 0 {
            return Ok(());
        }
        let png = encode_png(&Bitmap::from_premul(width, height, premul_rgba8.to_vec())?)?;
        let path = self.dir.join(format!("frame_{index:05}.png"));
        std::fs::write(&path, png).with_context(|| format!("write '{}'", path.display()))?;
        Ok(())
    }
}

/// Host view notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    Resize { width: u32, height: u32 },
}

/// Engine, canvas and sink driven one frame at a time.
pub struct FrameLoop<R: Rng> {
    engine: FireworksEngine<R>,
    canvas: FireworksCanvas,
    sink: Box<dyn FrameSink>,
    events: Option<Receiver<ViewEvent>>,
}

impl<R: Rng> FrameLoop<R> {
    pub fn new(engine: FireworksEngine<R>, sink: Box<dyn FrameSink>) -> CardResult<Self> {
        let (w, h) = engine.size();
        let canvas = FireworksCanvas::new(w, h, engine.config())?;
        Ok(Self {
            engine,
            canvas,
            sink,
            events: None,
        })
    }

    /// Listen for view events on `events`. The listener is dropped once every sender is gone.
    pub fn with_events(mut self, events: Receiver<ViewEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn engine(&self) -> &FireworksEngine<R> {
        &self.engine
    }

    pub fn canvas(&self) -> &FireworksCanvas {
        &self.canvas
    }

    /// Resize the canvas and the simulation bounds together. Never fails: a zero-sized view
    /// keeps a one-pixel canvas and in-flight coordinates are left as they are.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.canvas.resize(width, height);
        let (w, h) = self.canvas.size();
        self.engine.resize(w, h);
        tracing::debug!(width = w, height = h, "fireworks canvas resized");
    }

    /// Apply pending events, advance the simulation, draw and emit one frame.
    pub fn step(&mut self) -> CardResult<FrameStats> {
        self.drain_events();
        let stats = self.engine.step();
        self.canvas.draw(&self.engine)?;
        let (w, h) = self.canvas.size();
        self.sink.frame(stats.frame, w, h, self.canvas.frame())?;
        Ok(stats)
    }

    /// Step until `scheduler` or `cancel` stops the loop. Returns the number of frames run.
    pub fn run(&mut self, scheduler: &mut dyn FrameScheduler, cancel: &CancellationToken) -> CardResult<u64> {
        let mut frames = 0;
        while !cancel.is_cancelled() {
            let stats = self.step()?;
            frames += 1;
            tracing::trace!(?stats, "fireworks frame");
            if !scheduler.wait_next(cancel) {
                break;
            }
        }
        Ok(frames)
    }

    fn drain_events(&mut self) {
        let Some(rx) = &self.events else {
            return;
        };
        let mut latest = None;
        let mut closed = false;
        loop {
            match rx.try_recv() {
                Ok(ViewEvent::Resize { width, height }) => latest = Some((width, height)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    closed = true;
                    break;
                }
            }
        }
        if closed {
            self.events = None;
        }
        if let Some((w, h)) = latest {
            self.resize(w, h);
        }
    }
}

/// A fireworks view running on its own thread until unmounted.
///
/// Dropping the handle unmounts it.
#[derive(Debug)]
pub struct MountedFireworks {
    cancel: CancellationToken,
    resize_tx: Option<Sender<ViewEvent>>,
    handle: Option<JoinHandle<CardResult<u64>>>,
}

impl MountedFireworks {
    /// Start a wall-clock paced view of `width`x`height` pixels.
    pub fn mount(
        cfg: FireworksConfig,
        width: u32,
        height: u32,
        sink: Box<dyn FrameSink>,
    ) -> CardResult<Self> {
        let interval = cfg.frame_interval();
        let engine = FireworksEngine::<StdRng>::from_os_rng(cfg, width, height)?;
        Self::mount_with(FrameLoop::new(engine, sink)?, Box::new(TickScheduler::new(interval)))
    }

    pub fn mount_with<R: Rng + Send + 'static>(
        frame_loop: FrameLoop<R>,
        mut scheduler: Box<dyn FrameScheduler>,
    ) -> CardResult<Self> {
        let cancel = CancellationToken::new();
        let (resize_tx, resize_rx) = crossbeam_channel::unbounded();
        let mut frame_loop = frame_loop.with_events(resize_rx);

        let token = cancel.clone();
        let handle = std::thread::Builder::new()
            .name("fireworks".to_string())
            .spawn(move || {
                let frames = frame_loop.run(scheduler.as_mut(), &token);
                if let Err(e) = &frames {
                    tracing::error!(error = %e, "fireworks loop stopped");
                }
                frames
            })?;
        tracing::debug!("fireworks mounted");

        Ok(Self {
            cancel,
            resize_tx: Some(resize_tx),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Ask the loop to resize before its next frame.
    pub fn resize(&self, width: u32, height: u32) -> CardResult<()> {
        let tx = self
            .resize_tx
            .as_ref()
            .ok_or_else(|| CardError::validation("fireworks view is unmounted"))?;
        tx.send(ViewEvent::Resize { width, height })
            .map_err(|_| CardError::validation("fireworks loop has stopped"))
    }

    /// Cancel the loop, drop the resize listener and wait for the thread. Returns the number
    /// of frames drawn.
    pub fn unmount(mut self) -> CardResult<u64> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> CardResult<u64> {
        self.cancel.cancel();
        self.resize_tx = None;
        let Some(handle) = self.handle.take() else {
            return Ok(0);
        };
        let frames = handle
            .join()
            .map_err(|_| CardError::Other(anyhow::anyhow!("fireworks thread panicked")))??;
        tracing::debug!(frames, "fireworks unmounted");
        Ok(frames)
    }
}

impl Drop for MountedFireworks {
    fn drop(&mut self) {
        if self.handle.is_some()
            && let Err(e) = self.shutdown()
        {
            tracing::warn!(error = %e, "fireworks loop ended with an error");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fireworks/frame_loop.rs"]
mod tests;
