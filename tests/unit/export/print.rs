use super::*;

#[test]
fn page_escapes_title_and_embeds_image() {
    let html = print_page("A&B - Birthday Card", &Artifact::png("x.png", vec![1, 2, 3]));
    assert!(html.contains("<title>A&amp;B - Birthday Card</title>"));
    assert!(html.contains(r#"<img src="data:image/png;base64,AQID" style="width:100%;height:auto"/>"#));
    assert!(html.contains(r#"<body style="margin:0">"#));
}

#[test]
fn recording_surface_tracks_show_and_print() {
    let surface = RecordingPrintSurface::new();
    let mut handle = surface.clone();
    let mut view = handle.open().unwrap();
    view.show("<html/>").unwrap();
    view.print().unwrap();
    assert_eq!(
        surface.pages(),
        vec![PrintedPage {
            html: "<html/>".to_string(),
            printed: true
        }]
    );
}

#[test]
fn refusing_surface_reports_unavailable() {
    let mut surface = RecordingPrintSurface::refusing();
    let err = surface.open().err().unwrap();
    assert!(matches!(err, CardError::ExportSurfaceUnavailable(_)));
    assert!(surface.pages().is_empty());
}

#[test]
fn html_surface_writes_the_page() {
    let path = std::env::temp_dir()
        .join(format!("birthday-card-print-{}", std::process::id()))
        .join("card.html");
    let mut surface = HtmlPrintSurface::new(&path);
    let mut view = surface.open().unwrap();
    assert!(view.print().is_err());
    view.show("<html>card</html>").unwrap();
    view.print().unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html>card</html>");
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
