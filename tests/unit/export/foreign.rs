use super::*;
use crate::card::{CardData, FontBook, Photo, build_card_tree};
use crate::export::images::{DataUriLoader, await_images};

fn photo() -> Photo {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(2, 2, image::Rgba([9, 9, 9, 255])))
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    Photo::from_encoded(bytes).unwrap()
}

#[test]
fn svg_carries_escaped_text_and_scaled_size() {
    let data = CardData::new("A & <B>", "Hope your day is magical");
    let tree = build_card_tree(&data, &FontBook::empty());
    let svg = card_to_svg(&tree, &ResolvedImages::default(), 2, None);

    assert!(svg.starts_with("<svg "));
    assert!(svg.contains(r#"width="2800" height="1400" viewBox="0 0 1400 700""#));
    assert!(svg.contains("&quot;Hope your day is magical&quot;"));
    assert!(svg.contains("A &amp; &lt;B&gt;"));
    assert!(svg.contains("linearGradient"));
}

#[test]
fn unresolved_photo_is_left_out_but_hat_is_embedded() {
    let tree = build_card_tree(
        &CardData::new("Alex", "hi").with_photo(Some(photo())),
        &FontBook::empty(),
    );
    let svg = card_to_svg(&tree, &ResolvedImages::default(), 2, Some("Test Sans"));
    assert!(!svg.contains("data:image/png"));
    assert!(svg.contains("data:image/svg+xml;base64,"));
    assert!(svg.contains("&apos;Test Sans&apos;, sans-serif"));

    let (images, _) = await_images(
        &tree,
        std::sync::Arc::new(DataUriLoader),
        std::time::Duration::from_secs(3),
    );
    let svg = card_to_svg(&tree, &images, 2, None);
    assert!(svg.contains("data:image/png;base64,"));
    assert!(svg.contains("matrix(-1 0 0 1 1400 0)"));
}

#[test]
fn fallback_bitmap_matches_primary_shape() {
    let tree = build_card_tree(&CardData::new("Alex", "hi"), &FontBook::empty());
    let fonts = FontBook::empty();
    let images = ResolvedImages::default();
    let bmp = SvgForeignRasterizer
        .rasterize(&RasterRequest {
            tree: &tree,
            images: &images,
            fonts: &fonts,
            scale: 2,
        })
        .unwrap();
    assert_eq!((bmp.width, bmp.height), (2800, 1400));
    let [r, _, b, a] = bmp.pixel(1, 1).unwrap();
    assert_eq!(a, 255);
    assert!(r > 90 && b > 200);
}

#[test]
fn escape_covers_markup_characters() {
    assert_eq!(escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&apos;&amp;&apos;&lt;/a&gt;");
}
