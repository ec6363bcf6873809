use super::*;

fn sample() -> CardTree {
    CardTree {
        width: 100,
        height: 50,
        root: CardNode::Box(BoxNode {
            rect: Rect::new(0.0, 0.0, 100.0, 50.0),
            radius: 0.0,
            background: Some(Paint::Solid {
                color: Rgba8::BLACK,
            }),
            border: None,
            shadow: None,
            children: vec![
                CardNode::Text(TextNode {
                    font_size: 12.0,
                    bold: false,
                    color: Rgba8::WHITE,
                    shadow: None,
                    lines: vec![
                        TextLine {
                            text: "first".to_string(),
                            x: 1.0,
                            baseline: 12.0,
                            width: 20.0,
                        },
                        TextLine {
                            text: "second".to_string(),
                            x: 1.0,
                            baseline: 26.0,
                            width: 24.0,
                        },
                    ],
                }),
                CardNode::Image(ImageNode {
                    rect: Rect::new(10.0, 10.0, 20.0, 20.0),
                    radius: 2.0,
                    src: "data:image/png;base64,AAAA".to_string(),
                    mirror_x: true,
                }),
            ],
        }),
    }
}

#[test]
fn markup_restores_identical_tree() {
    let tree = sample();
    let markup = tree.to_markup().unwrap();
    assert!(markup.contains("\"kind\":\"box\""));
    assert_eq!(CardTree::from_markup(&markup).unwrap(), tree);
}

#[test]
fn malformed_markup_is_a_rasterization_error() {
    let err = CardTree::from_markup("<div>").unwrap_err();
    assert!(matches!(err, CardError::Rasterization(_)));
}

#[test]
fn text_and_images_are_collected_in_order() {
    let tree = sample();
    assert_eq!(tree.text_content(), "first\nsecond");
    let images = tree.images();
    assert_eq!(images.len(), 1);
    assert!(images[0].mirror_x);
}

#[test]
fn gradient_line_follows_css_angles() {
    let g = LinearGradient {
        angle_deg: 90.0,
        stops: vec![],
    };
    let (a, b) = g.line_for(Rect::new(0.0, 0.0, 200.0, 100.0));
    assert!((a.x - 0.0).abs() < 1e-9 && (a.y - 50.0).abs() < 1e-9);
    assert!((b.x - 200.0).abs() < 1e-9 && (b.y - 50.0).abs() < 1e-9);

    let g = LinearGradient {
        angle_deg: 180.0,
        stops: vec![],
    };
    let (a, b) = g.line_for(Rect::new(0.0, 0.0, 200.0, 100.0));
    assert!(a.y < b.y);
}

#[test]
fn gradient_colors_interpolate_between_stops() {
    let g = LinearGradient {
        angle_deg: 135.0,
        stops: vec![
            GradientStop {
                offset: 0.0,
                color: Rgba8::rgb(0, 0, 0),
            },
            GradientStop {
                offset: 1.0,
                color: Rgba8::rgb(200, 100, 0),
            },
        ],
    };
    assert_eq!(g.color_at(0.0), Rgba8::rgb(0, 0, 0));
    assert_eq!(g.color_at(0.5), Rgba8::rgb(100, 50, 0));
    assert_eq!(g.color_at(2.0), Rgba8::rgb(200, 100, 0));
}
