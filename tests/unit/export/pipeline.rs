use super::*;
use crate::export::alert::RecordingAlert;
use crate::export::print::RecordingPrintSurface;

fn config() -> ExportConfig {
    ExportConfig {
        pixel_density: 1,
        ..ExportConfig::default()
    }
}

fn alex() -> CardData {
    CardData::new("Alex", "Hope your day is magical")
}

struct Harness {
    downloads: InMemoryDownloads,
    alerts: RecordingAlert,
    exporter: CardExporter,
}

fn harness(cfg: ExportConfig) -> Harness {
    let downloads = InMemoryDownloads::new();
    let alerts = RecordingAlert::new();
    let exporter = CardExporter::new(cfg, FontBook::empty())
        .with_downloads(Box::new(downloads.clone()))
        .with_alert(Box::new(alerts.clone()));
    Harness {
        downloads,
        alerts,
        exporter,
    }
}

struct FailingRasterizer;

impl Rasterizer for FailingRasterizer {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn rasterize(&mut self, _req: &RasterRequest<'_>) -> CardResult<Bitmap> {
        Err(CardError::rasterization("canvas is tainted"))
    }
}

struct FailingEncoder;

impl DocumentEncoder for FailingEncoder {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn encode(&self, _png: &[u8], _page: PageSize, _title: &str) -> CardResult<Vec<u8>> {
        Err(CardError::encoding("out of memory"))
    }
}

struct FullDisk;

impl DownloadSurface for FullDisk {
    fn save(&mut self, _artifact: Artifact) -> CardResult<()> {
        Err(CardError::Io(std::io::Error::other("disk full")))
    }
}

#[test]
fn png_export_downloads_named_file() {
    let mut h = harness(config());
    let report = h.exporter.export_png(&alex()).unwrap();

    assert_eq!(
        report.outcome,
        ExportOutcome::Downloaded {
            file_name: "Alex-Birthday-Card.png".to_string()
        }
    );
    assert_eq!((report.width, report.height), (1400, 700));
    assert_eq!(report.rasterizer, "vello_cpu");
    assert_eq!(report.images.total, 0);

    let saved = h.downloads.artifacts();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].mime, "image/png");
    let decoded = image::load_from_memory(&saved[0].bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1400, 700));

    assert_eq!(h.exporter.document().attached_count(), 0);
    assert!(!h.exporter.downloading_flag().is_set());
    assert!(h.alerts.messages().is_empty());
}

#[test]
fn pdf_export_uses_bundled_encoder() {
    let mut h = harness(config());
    let report = h.exporter.export_pdf(&alex()).unwrap();
    assert_eq!(
        report.outcome,
        ExportOutcome::Downloaded {
            file_name: "Alex-Birthday-Card.pdf".to_string()
        }
    );
    let saved = h.downloads.artifacts();
    assert_eq!(saved[0].mime, "application/pdf");
    assert!(saved[0].bytes.starts_with(b"%PDF-1.4"));
}

#[test]
fn missing_capabilities_open_print_view() {
    let print = RecordingPrintSurface::new();
    let mut h = harness(config());
    h.exporter = h
        .exporter
        .with_rasterizer(None)
        .with_encoder(None)
        .with_print_surface(Some(Box::new(print.clone())));

    let report = h.exporter.export_pdf(&alex()).unwrap();
    assert_eq!(report.rasterizer, "svg_foreign_object");
    assert_eq!((report.width, report.height), (1400, 700));
    assert_eq!(
        report.outcome,
        ExportOutcome::PrintViewOpened {
            title: "Alex - Birthday Card".to_string()
        }
    );

    let pages = print.pages();
    assert_eq!(pages.len(), 1);
    assert!(pages[0].printed);
    assert!(pages[0].html.contains("<title>Alex - Birthday Card</title>"));
    assert!(pages[0].html.contains("data:image/png;base64,"));
    assert!(h.downloads.artifacts().is_empty());
}

#[test]
fn blocked_print_view_falls_back_to_png() {
    let mut h = harness(config());
    h.exporter = h
        .exporter
        .with_rasterizer(None)
        .with_encoder(None)
        .with_print_surface(Some(Box::new(RecordingPrintSurface::refusing())));

    let report = h.exporter.export_pdf(&alex()).unwrap();
    assert_eq!(
        report.outcome,
        ExportOutcome::DownloadedFallbackPng {
            file_name: "Alex-Birthday-Card.png".to_string()
        }
    );
    assert_eq!(h.downloads.file_names(), vec!["Alex-Birthday-Card.png"]);
    assert!(h.alerts.messages().is_empty());
}

#[test]
fn no_print_surface_falls_back_to_png() {
    let mut h = harness(config());
    h.exporter = h.exporter.with_encoder(None);
    let report = h.exporter.export_pdf(&alex()).unwrap();
    assert!(matches!(report.outcome, ExportOutcome::DownloadedFallbackPng { .. }));
}

#[test]
fn failing_encoder_falls_back_to_png() {
    let mut h = harness(config());
    h.exporter = h.exporter.with_encoder(Some(Box::new(FailingEncoder)));
    let report = h.exporter.export_pdf(&alex()).unwrap();
    assert_eq!(
        report.outcome,
        ExportOutcome::DownloadedFallbackPng {
            file_name: "Alex-Birthday-Card.png".to_string()
        }
    );
}

#[test]
fn unavailable_surface_alerts_and_tears_down() {
    let document = HostDocument::without_isolated_surfaces();
    let mut h = harness(config());
    h.exporter = h.exporter.with_document(document.clone());

    let err = h.exporter.export_png(&alex()).unwrap_err();
    assert!(matches!(err, CardError::ExportSurfaceUnavailable(_)));
    assert_eq!(
        h.alerts.messages(),
        vec!["Error creating PNG: isolated surface document is not accessible. Please try again."]
    );
    assert_eq!(document.attached_count(), 0);
    assert!(h.downloads.artifacts().is_empty());
}

#[test]
fn rasterization_failure_leaves_no_download() {
    let mut h = harness(config());
    h.exporter = h.exporter.with_rasterizer(Some(Box::new(FailingRasterizer)));

    let err = h.exporter.export_pdf(&alex()).unwrap_err();
    assert!(matches!(err, CardError::Rasterization(_)));
    assert_eq!(
        h.alerts.messages(),
        vec!["Error creating PDF: canvas is tainted. Please try again."]
    );
    assert!(h.downloads.artifacts().is_empty());
    assert_eq!(h.exporter.document().attached_count(), 0);
    assert!(!h.exporter.downloading_flag().is_set());
}

#[test]
fn download_failure_is_alerted() {
    let mut h = harness(config());
    h.exporter = h.exporter.with_downloads(Box::new(FullDisk));
    let err = h.exporter.export_png(&alex()).unwrap_err();
    assert!(matches!(err, CardError::Io(_)));
    assert_eq!(h.alerts.messages().len(), 1);
    assert!(h.alerts.messages()[0].starts_with("Error creating PNG: "));
}

#[test]
fn busy_flag_refuses_second_export_silently() {
    let flag = DownloadingFlag::new();
    let mut h = harness(config());
    h.exporter = h.exporter.with_downloading_flag(flag.clone());

    let held = flag.try_begin().unwrap();
    let err = h.exporter.export_png(&alex()).unwrap_err();
    assert!(matches!(err, CardError::ExportInProgress));
    assert!(h.alerts.messages().is_empty());
    assert_eq!(h.exporter.document().attached_count(), 0);

    drop(held);
    assert!(h.exporter.export_png(&alex()).is_ok());
}

#[test]
fn invalid_config_is_reported() {
    let mut h = harness(ExportConfig {
        pixel_density: 0,
        ..ExportConfig::default()
    });
    let err = h.exporter.export_png(&alex()).unwrap_err();
    assert!(matches!(err, CardError::Validation(_)));
    assert_eq!(h.alerts.messages().len(), 1);
}
