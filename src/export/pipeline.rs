use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::card::{CardData, FontBook, build_card_tree};
use crate::config::ExportConfig;
use crate::encode::{DocumentEncoder, PageSize, PdfEncoder, encode_png};
use crate::export::alert::{Alert, LogAlert};
use crate::export::download::{Artifact, DownloadSurface, InMemoryDownloads};
use crate::export::foreign::SvgForeignRasterizer;
use crate::export::images::{DataUriLoader, ImageLoader, ImageWaitReport, await_images};
use crate::export::print::{PrintSurface, print_page};
use crate::export::raster::{RasterRequest, Rasterizer, VelloRasterizer};
use crate::export::surface::HostDocument;
use crate::foundation::core::Bitmap;
use crate::foundation::error::{CardError, CardResult};

/// Requested output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Png,
    Pdf,
}

impl ExportKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Pdf => "PDF",
        }
    }
}

/// How the finished card reached the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    Downloaded { file_name: String },
    /// A PDF was requested but a PNG was downloaded instead.
    DownloadedFallbackPng { file_name: String },
    /// A PDF was requested and the card was handed to a print view.
    PrintViewOpened { title: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportReport {
    pub kind: ExportKind,
    pub outcome: ExportOutcome,
    pub width: u32,
    pub height: u32,
    pub rasterizer: &'static str,
    pub images: ImageWaitReport,
}

/// Shared "downloading" flag. While it is set the export controls are disabled and any new
/// export is refused.
#[derive(Clone, Debug, Default)]
pub struct DownloadingFlag(Arc<AtomicBool>);

impl DownloadingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Set the flag unless it is already set. It clears when the guard drops.
    pub fn try_begin(&self) -> Option<DownloadingGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| DownloadingGuard(self.0.clone()))
    }
}

#[derive(Debug)]
pub struct DownloadingGuard(Arc<AtomicBool>);

impl Drop for DownloadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Turns card data into a downloaded PNG or PDF.
///
/// Every collaborator is replaceable. An absent primary rasterizer falls back to
/// [`SvgForeignRasterizer`]; an absent document encoder falls back to the print surface and
/// then to a PNG download.
pub struct CardExporter {
    config: ExportConfig,
    fonts: FontBook,
    document: HostDocument,
    rasterizer: Option<Box<dyn Rasterizer>>,
    fallback_rasterizer: Box<dyn Rasterizer>,
    encoder: Option<Box<dyn DocumentEncoder>>,
    print: Option<Box<dyn PrintSurface>>,
    downloads: Box<dyn DownloadSurface>,
    alert: Box<dyn Alert>,
    loader: Arc<dyn ImageLoader>,
    downloading: DownloadingFlag,
}

impl CardExporter {
    pub fn new(config: ExportConfig, fonts: FontBook) -> Self {
        Self {
            config,
            fonts,
            document: HostDocument::new(),
            rasterizer: Some(Box::new(VelloRasterizer)),
            fallback_rasterizer: Box::new(SvgForeignRasterizer),
            encoder: Some(Box::new(PdfEncoder)),
            print: None,
            downloads: Box::new(InMemoryDownloads::new()),
            alert: Box::new(LogAlert),
            loader: Arc::new(DataUriLoader),
            downloading: DownloadingFlag::new(),
        }
    }

    pub fn with_document(mut self, document: HostDocument) -> Self {
        self.document = document;
        self
    }

    /// `None` models a host without the primary raster capability.
    pub fn with_rasterizer(mut self, rasterizer: Option<Box<dyn Rasterizer>>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn with_fallback_rasterizer(mut self, rasterizer: Box<dyn Rasterizer>) -> Self {
        self.fallback_rasterizer = rasterizer;
        self
    }

    /// `None` models a host without a document encoder.
    pub fn with_encoder(mut self, encoder: Option<Box<dyn DocumentEncoder>>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_print_surface(mut self, print: Option<Box<dyn PrintSurface>>) -> Self {
        self.print = print;
        self
    }

    pub fn with_downloads(mut self, downloads: Box<dyn DownloadSurface>) -> Self {
        self.downloads = downloads;
        self
    }

    pub fn with_alert(mut self, alert: Box<dyn Alert>) -> Self {
        self.alert = alert;
        self
    }

    pub fn with_image_loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_downloading_flag(mut self, flag: DownloadingFlag) -> Self {
        self.downloading = flag;
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn document(&self) -> &HostDocument {
        &self.document
    }

    pub fn downloading_flag(&self) -> DownloadingFlag {
        self.downloading.clone()
    }

    pub fn export_png(&mut self, data: &CardData) -> CardResult<ExportReport> {
        self.export(data, ExportKind::Png)
    }

    pub fn export_pdf(&mut self, data: &CardData) -> CardResult<ExportReport> {
        self.export(data, ExportKind::Pdf)
    }

    /// Run one export job.
    ///
    /// Failures are alerted and returned; the scaffolding attached to the document is gone by
    /// the time this returns. A call made while another export holds the downloading flag
    /// returns [`CardError::ExportInProgress`] without alerting.
    #[tracing::instrument(skip_all, fields(kind = kind.label()))]
    pub fn export(&mut self, data: &CardData, kind: ExportKind) -> CardResult<ExportReport> {
        let Some(_downloading) = self.downloading.try_begin() else {
            tracing::warn!("export already in progress");
            return Err(CardError::ExportInProgress);
        };

        match self.run(data, kind) {
            Ok(report) => {
                tracing::info!(outcome = ?report.outcome, "export finished");
                Ok(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "export failed");
                self.alert.alert(&format!(
                    "Error creating {}: {}. Please try again.",
                    kind.label(),
                    e.user_message()
                ));
                Err(e)
            }
        }
    }

    fn run(&mut self, data: &CardData, kind: ExportKind) -> CardResult<ExportReport> {
        self.config.validate()?;

        let markup = {
            let mut container = self.document.create_detached_container();
            container.render(build_card_tree(data, &self.fonts));
            container.markup()?
        };
        tracing::debug!(bytes = markup.len(), "captured card markup");

        let mut surface = self
            .document
            .create_isolated_surface(self.config.width, self.config.height)?;
        surface.write(&markup)?;
        let tree = surface.root()?;

        let (images, image_report) =
            await_images(tree, self.loader.clone(), self.config.image_timeout());
        if image_report.loaded < image_report.total {
            tracing::warn!(?image_report, "exporting with unresolved images");
        }

        let req = RasterRequest {
            tree,
            images: &images,
            fonts: &self.fonts,
            scale: self.config.pixel_density,
        };
        let (bitmap, rasterizer) = match self.rasterizer.as_mut() {
            Some(r) => (r.rasterize(&req)?, r.name()),
            None => {
                tracing::warn!(
                    fallback = self.fallback_rasterizer.name(),
                    "primary rasterizer unavailable"
                );
                (
                    self.fallback_rasterizer.rasterize(&req)?,
                    self.fallback_rasterizer.name(),
                )
            }
        };
        drop(surface);
        tracing::debug!(width = bitmap.width, height = bitmap.height, rasterizer, "rasterized card");

        let outcome = match kind {
            ExportKind::Png => self.deliver_png(data, &bitmap)?,
            ExportKind::Pdf => self.deliver_pdf(data, &bitmap)?,
        };

        Ok(ExportReport {
            kind,
            outcome,
            width: bitmap.width,
            height: bitmap.height,
            rasterizer,
            images: image_report,
        })
    }

    fn deliver_png(&mut self, data: &CardData, bitmap: &Bitmap) -> CardResult<ExportOutcome> {
        let artifact = Artifact::png(format!("{}.png", data.file_stem()), encode_png(bitmap)?);
        let file_name = artifact.file_name.clone();
        self.downloads.save(artifact)?;
        Ok(ExportOutcome::Downloaded { file_name })
    }

    fn deliver_pdf(&mut self, data: &CardData, bitmap: &Bitmap) -> CardResult<ExportOutcome> {
        let png = Artifact::png(format!("{}.png", data.file_stem()), encode_png(bitmap)?);
        let title = data.print_title();

        let fallback_reason = match self.encoder.as_ref() {
            Some(encoder) => {
                let page = PageSize {
                    width_mm: self.config.page_width_mm,
                    height_mm: self.config.page_height_mm,
                };
                match encoder.encode(&png.bytes, page, &title) {
                    Ok(pdf) => {
                        let artifact = Artifact::pdf(format!("{}.pdf", data.file_stem()), pdf);
                        let file_name = artifact.file_name.clone();
                        self.downloads.save(artifact)?;
                        return Ok(ExportOutcome::Downloaded { file_name });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, encoder = encoder.name(), "pdf encoding failed");
                        e
                    }
                }
            }
            None => match self.open_print_view(&title, &png) {
                Ok(()) => return Ok(ExportOutcome::PrintViewOpened { title }),
                Err(e) => {
                    tracing::warn!(error = %e, "print view unavailable");
                    e
                }
            },
        };

        tracing::warn!(reason = %fallback_reason, "downloading png instead of pdf");
        let file_name = png.file_name.clone();
        self.downloads.save(png)?;
        Ok(ExportOutcome::DownloadedFallbackPng { file_name })
    }

    fn open_print_view(&mut self, title: &str, png: &Artifact) -> CardResult<()> {
        let surface = self
            .print
            .as_mut()
            .ok_or_else(|| CardError::surface_unavailable("no print surface"))?;
        let mut view = surface.open()?;
        view.show(&print_page(title, png))?;
        view.print()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
