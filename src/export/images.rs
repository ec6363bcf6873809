use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::assets::DecodedImage;
use crate::assets::decode::{decode_data_uri, decode_image};
use crate::card::tree::CardTree;
use crate::foundation::error::{CardError, CardResult};

/// Resolves an image `src` to pixels. Implementations may block.
pub trait ImageLoader: Send + Sync {
    fn load(&self, src: &str) -> CardResult<DecodedImage>;
}

/// Loads `data:` URIs; other schemes are not reachable from an isolated surface.
#[derive(Clone, Copy, Debug, Default)]
pub struct DataUriLoader;

impl ImageLoader for DataUriLoader {
    fn load(&self, src: &str) -> CardResult<DecodedImage> {
        let bytes = decode_data_uri(src)?;
        decode_image(&bytes)
    }
}

/// Outcome counts of one image wait.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageWaitReport {
    pub total: usize,
    pub loaded: usize,
    pub failed: usize,
    pub timed_out: usize,
}

/// Images that finished loading, keyed by `src`.
#[derive(Clone, Debug, Default)]
pub struct ResolvedImages {
    by_src: HashMap<String, DecodedImage>,
}

impl ResolvedImages {
    pub fn get(&self, src: &str) -> Option<&DecodedImage> {
        self.by_src.get(src)
    }

    pub fn len(&self) -> usize {
        self.by_src.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_src.is_empty()
    }
}

/// Wait for every image referenced by `tree` to load or fail.
///
/// All loads start together on their own threads and each one is given `timeout` from that
/// start. A failed or late image is logged and left unresolved; the wait itself never fails.
#[tracing::instrument(skip_all, fields(timeout_ms = timeout.as_millis() as u64))]
pub fn await_images(
    tree: &CardTree,
    loader: Arc<dyn ImageLoader>,
    timeout: Duration,
) -> (ResolvedImages, ImageWaitReport) {
    let mut srcs: Vec<String> = tree.images().iter().map(|img| img.src.clone()).collect();
    srcs.sort();
    srcs.dedup();

    let started = Instant::now();
    let pending: Vec<_> = srcs
        .into_iter()
        .map(|src| {
            let (tx, rx) = crossbeam_channel::bounded::<CardResult<DecodedImage>>(1);
            let loader = loader.clone();
            let job_src = src.clone();
            let spawned = std::thread::Builder::new()
                .name("card-image-load".to_string())
                .spawn(move || {
                    // The receiver is gone once the wait has timed out.
                    let _ = tx.send(loader.load(&job_src));
                });
            (src, rx, spawned.map_err(CardError::Io))
        })
        .collect();

    let deadline = started + timeout;
    let mut resolved = ResolvedImages::default();
    let mut report = ImageWaitReport {
        total: pending.len(),
        ..ImageWaitReport::default()
    };

    for (src, rx, spawned) in pending {
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "could not start image load");
            report.failed += 1;
            continue;
        }
        match rx.recv_deadline(deadline) {
            Ok(Ok(img)) => {
                tracing::debug!(width = img.width, height = img.height, "image loaded");
                resolved.by_src.insert(src, img);
                report.loaded += 1;
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "image failed to load; continuing without it");
                report.failed += 1;
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                let e = CardError::ImageLoadTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                };
                tracing::warn!(error = %e, "continuing without image");
                report.timed_out += 1;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                tracing::warn!("image loader exited without a result");
                report.failed += 1;
            }
        }
    }

    (resolved, report)
}

#[cfg(test)]
#[path = "../../tests/unit/export/images.rs"]
mod tests;
