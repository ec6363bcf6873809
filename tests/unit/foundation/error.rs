use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CardError::rasterization("x")
            .to_string()
            .contains("rasterization failed:")
    );
    assert!(
        CardError::encoding("x")
            .to_string()
            .contains("encoding failed:")
    );
    assert!(
        CardError::surface_unavailable("x")
            .to_string()
            .contains("export surface unavailable:")
    );
    assert!(
        CardError::camera_unavailable("x")
            .to_string()
            .contains("camera unavailable:")
    );
    assert!(
        CardError::ImageLoadTimeout { timeout_ms: 3000 }
            .to_string()
            .contains("3000 ms")
    );
}

#[test]
fn user_message_strips_category() {
    assert_eq!(CardError::encoding("png writer broke").user_message(), "png writer broke");
    assert_eq!(
        CardError::ExportInProgress.user_message(),
        "an export is already in progress"
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CardError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
