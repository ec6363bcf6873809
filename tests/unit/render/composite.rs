use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn trail_overlay_darkens_toward_black() {
    let mut buf = vec![200, 100, 50, 255, 0, 0, 0, 0];
    let overlay = crate::foundation::core::Rgba8::BLACK
        .with_opacity(0.1)
        .to_premul();
    fill_over_in_place(&mut buf, overlay).unwrap();
    assert!(buf[0] < 200 && buf[0] > 170);
    assert_eq!(buf[3], 255);
    assert_eq!(&buf[4..7], &[0, 0, 0]);
    assert!(buf[7] > 0);
}

#[test]
fn mismatched_buffers_are_rejected() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], 1.0).is_err());
}
