//! Card export: detached render, isolated surface, image wait, rasterize, encode, deliver.

pub mod alert;
pub mod download;
pub mod foreign;
pub mod images;
pub mod pipeline;
pub mod print;
pub mod raster;
pub mod surface;

pub use alert::{Alert, LogAlert, RecordingAlert};
pub use download::{Artifact, DirectoryDownloads, DownloadSurface, InMemoryDownloads};
pub use foreign::{SvgForeignRasterizer, card_to_svg};
pub use images::{DataUriLoader, ImageLoader, ImageWaitReport, ResolvedImages, await_images};
pub use pipeline::{
    CardExporter, DownloadingFlag, DownloadingGuard, ExportKind, ExportOutcome, ExportReport,
};
pub use print::{HtmlPrintSurface, PrintSurface, PrintView, PrintedPage, RecordingPrintSurface};
pub use raster::{RasterRequest, Rasterizer, VelloRasterizer};
pub use surface::{AttachedKind, DetachedContainer, HostDocument, IsolatedSurface};
