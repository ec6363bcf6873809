#![forbid(unsafe_code)]
//! Birthday card rendering: a fireworks particle engine and a PNG/PDF card export pipeline,
//! both drawn on the CPU.

pub mod assets;
pub mod audio;
pub mod camera;
pub mod card;
pub mod config;
pub mod encode;
pub mod export;
pub mod fireworks;
pub mod foundation;
pub mod params;
pub mod render;

pub use audio::MelodySession;
pub use camera::{CaptureRequest, Facing, FilePhotoSource, NoCamera, PhotoSource, capture_or_skip};
pub use card::{CardData, CardNode, CardTree, FontBook, Photo, build_card_tree};
pub use config::{AppConfig, ExportConfig, FireworksConfig};
pub use encode::{DocumentEncoder, PageSize, PdfEncoder, encode_png};
pub use export::{
    Alert, Artifact, CardExporter, DirectoryDownloads, DownloadSurface, ExportKind,
    ExportOutcome, ExportReport, HostDocument, HtmlPrintSurface, InMemoryDownloads,
    PrintSurface, Rasterizer, SvgForeignRasterizer, VelloRasterizer,
};
pub use fireworks::{
    CancellationToken, FireworksCanvas, FireworksEngine, FrameLoop, FrameStats,
    MountedFireworks,
};
pub use foundation::core::{Bitmap, Rgba8, Rgba8Premul};
pub use foundation::error::{CardError, CardResult};
pub use params::CardParams;
