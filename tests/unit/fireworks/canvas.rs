use super::*;
use crate::fireworks::particle::Projectile;
use crate::foundation::core::Point;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn quiet() -> FireworksConfig {
    FireworksConfig {
        spawn_probability: 0.0,
        ..FireworksConfig::default()
    }
}

fn alpha_at(canvas: &FireworksCanvas, x: u32, y: u32) -> u8 {
    let (w, _) = canvas.size();
    canvas.frame()[((y * w + x) * 4 + 3) as usize]
}

#[test]
fn empty_engine_only_darkens() {
    let cfg = quiet();
    let engine = FireworksEngine::new(cfg.clone(), 32, 16, StdRng::seed_from_u64(0)).unwrap();
    let mut canvas = FireworksCanvas::new(32, 16, &cfg).unwrap();
    canvas.draw(&engine).unwrap();
    let first = alpha_at(&canvas, 5, 5);
    assert!(first > 0);
    canvas.draw(&engine).unwrap();
    assert!(alpha_at(&canvas, 5, 5) > first);
    assert!(canvas.frame().chunks_exact(4).all(|px| px[..3] == [0, 0, 0]));
}

#[test]
fn rising_projectile_is_drawn_with_its_trail() {
    let cfg = FireworksConfig {
        trail_fade: 0.0,
        ..quiet()
    };
    let mut engine = FireworksEngine::new(cfg.clone(), 64, 64, StdRng::seed_from_u64(1)).unwrap();
    assert!(engine.launch());
    let mut canvas = FireworksCanvas::new(64, 64, &cfg).unwrap();
    canvas.draw(&engine).unwrap();

    let p: &Projectile = &engine.projectiles()[0];
    let x = p.pos.x.round().clamp(0.0, 63.0) as u32;
    // The projectile sits on the bottom edge; its trail runs off the canvas.
    assert!(alpha_at(&canvas, x, 63) > 0);
    assert_eq!(alpha_at(&canvas, x, 20), 0);
}

#[test]
fn burst_glows_around_fragments() {
    let cfg = FireworksConfig {
        trail_fade: 0.0,
        ..quiet()
    };
    let mut engine = FireworksEngine::new(cfg.clone(), 200, 200, StdRng::seed_from_u64(2)).unwrap();
    engine.launch();
    while engine.step().exploded == 0 {}
    let centre: Point = engine.projectiles()[0].pos;

    let mut canvas = FireworksCanvas::new(200, 200, &cfg).unwrap();
    canvas.draw(&engine).unwrap();
    let (cx, cy) = (centre.x.min(199.0) as u32, centre.y.min(199.0) as u32);
    assert!(alpha_at(&canvas, cx, cy) > 200);

    let no_glow = FireworksConfig { glow_px: 0.0, ..cfg };
    let mut plain = FireworksCanvas::new(200, 200, &no_glow).unwrap();
    plain.draw(&engine).unwrap();
    let lit = |c: &FireworksCanvas| c.frame().chunks_exact(4).filter(|px| px[3] > 0).count();
    assert!(lit(&canvas) > lit(&plain));
}

#[test]
fn resize_reallocates_and_to_bitmap_matches() {
    let cfg = quiet();
    let mut canvas = FireworksCanvas::new(10, 10, &cfg).unwrap();
    canvas.resize(20, 5);
    assert_eq!(canvas.size(), (20, 5));
    assert_eq!(canvas.frame().len(), 20 * 5 * 4);
    let bmp = canvas.to_bitmap().unwrap();
    assert_eq!((bmp.width, bmp.height), (20, 5));
}

#[test]
fn resize_clamps_degenerate_and_oversized_views() {
    let mut canvas = FireworksCanvas::new(10, 10, &quiet()).unwrap();
    canvas.resize(0, 5);
    assert_eq!(canvas.size(), (1, 5));
    canvas.resize(0, 0);
    assert_eq!(canvas.size(), (1, 1));
    assert_eq!(canvas.frame().len(), 4);
    canvas.resize(70_000, 1);
    assert_eq!(canvas.size(), (u32::from(u16::MAX), 1));
}
