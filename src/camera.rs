//! Photo capture collaborator: a selfie source that may be absent or denied.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::card::model::Photo;
use crate::foundation::error::{CardError, CardResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Facing {
    Front,
    Back,
}

/// What the card flow asks the camera for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureRequest {
    pub width: u32,
    pub height: u32,
    pub facing: Facing,
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            facing: Facing::Front,
        }
    }
}

pub trait PhotoSource {
    /// Take one photo. Denied or missing hardware is `CameraUnavailable`.
    fn capture(&mut self, request: &CaptureRequest) -> CardResult<Photo>;
}

/// Reads a photo that was captured elsewhere and saved as an encoded image file.
#[derive(Clone, Debug)]
pub struct FilePhotoSource {
    path: PathBuf,
}

impl FilePhotoSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PhotoSource for FilePhotoSource {
    fn capture(&mut self, request: &CaptureRequest) -> CardResult<Photo> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CardError::camera_unavailable(format!(
                    "no photo at '{}'",
                    self.path.display()
                )));
            }
            Err(e) => return Err(CardError::Io(e)),
        };
        let photo = Photo::from_encoded(bytes)?;
        let decoded = crate::assets::decode::decode_image(photo.bytes())
            .with_context(|| format!("decode photo '{}'", self.path.display()))?;

        if (decoded.width, decoded.height) != (request.width, request.height) {
            tracing::debug!(
                requested_w = request.width,
                requested_h = request.height,
                got_w = decoded.width,
                got_h = decoded.height,
                "photo size differs from capture request"
            );
        }
        Ok(photo)
    }
}

/// A device with no camera, or one where access was denied.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCamera;

impl PhotoSource for NoCamera {
    fn capture(&mut self, _request: &CaptureRequest) -> CardResult<Photo> {
        Err(CardError::camera_unavailable("no camera available"))
    }
}

/// Capture a photo, or continue without one when the camera is unavailable.
pub fn capture_or_skip(
    source: &mut dyn PhotoSource,
    request: &CaptureRequest,
) -> CardResult<Option<Photo>> {
    match source.capture(request) {
        Ok(photo) => Ok(Some(photo)),
        Err(CardError::CameraUnavailable(reason)) => {
            tracing::warn!(%reason, "camera unavailable; continuing without a photo");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "../tests/unit/camera.rs"]
mod tests;
