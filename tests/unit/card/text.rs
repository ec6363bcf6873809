use super::*;

#[test]
fn estimate_scales_with_size_and_weight() {
    let regular = estimate_width("Alex", 20.0, false);
    let bold = estimate_width("Alex", 20.0, true);
    assert!((regular - 44.0).abs() < 1e-9);
    assert!(bold > regular);
    assert!((estimate_width("Alex", 40.0, false) - 2.0 * regular).abs() < 1e-9);
    assert_eq!(estimate_width("", 20.0, false), 0.0);
}

#[test]
fn wide_characters_take_a_full_em() {
    assert!((estimate_width("🎉", 30.0, false) - 30.0).abs() < 1e-9);
}

#[test]
fn wrap_collapses_whitespace_and_breaks_greedily() {
    let lines = wrap_words("aa   bb\ncc dd", 5.0, |s| s.chars().count() as f64);
    let texts: Vec<&str> = lines.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(texts, vec!["aa bb", "cc dd"]);
    assert_eq!(lines[0].1, 5.0);
}

#[test]
fn overlong_word_gets_its_own_line() {
    let lines = wrap_words("a verylongword b", 4.0, |s| s.chars().count() as f64);
    let texts: Vec<&str> = lines.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(texts, vec!["a", "verylongword", "b"]);
}

#[test]
fn empty_text_wraps_to_one_empty_line() {
    let lines = wrap_words("   ", 100.0, |s| s.len() as f64);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].0.is_empty());
}

#[test]
fn shaper_without_faces_falls_back_to_estimate() {
    let mut shaper = TextShaper::new(&FontBook::empty());
    assert!(!shaper.has_faces());
    let w = shaper.measure("Hello", 24.0, true);
    assert!((w - estimate_width("Hello", 24.0, true)).abs() < 1e-9);
    assert!(shaper.layout_line("Hello", 24.0, false, TextBrush::default()).is_none());
}

#[test]
fn bold_face_falls_back_to_regular() {
    let fonts = FontBook::from_bytes(vec![1, 2, 3], None);
    assert!(fonts.has_faces());
    assert_eq!(fonts.face(true), fonts.face(false));
    assert!(FontBook::empty().face(false).is_none());
}

#[test]
fn missing_bold_face_is_synthesized() {
    assert!(FontBook::from_bytes(vec![1, 2, 3], None).synthesizes_bold());
    assert!(!FontBook::from_bytes(vec![1, 2, 3], Some(vec![4, 5, 6])).synthesizes_bold());
    assert!(!FontBook::empty().synthesizes_bold());
}

#[test]
fn embolden_stroke_scales_with_font_size() {
    assert!((embolden_stroke_width(48.0) - 2.0).abs() < 1e-9);
    assert!((embolden_stroke_width(24.0) - 1.0).abs() < 1e-9);
    assert_eq!(embolden_stroke_width(-3.0), 0.0);
}
