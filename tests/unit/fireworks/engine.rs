use super::*;
use rand::SeedableRng;

fn quiet() -> FireworksConfig {
    FireworksConfig {
        spawn_probability: 0.0,
        ..FireworksConfig::default()
    }
}

fn engine(cfg: FireworksConfig, seed: u64) -> FireworksEngine<StdRng> {
    FireworksEngine::new(cfg, 800, 600, StdRng::seed_from_u64(seed)).unwrap()
}

/// Step until the single launched projectile bursts; returns that frame's stats.
fn run_to_burst(e: &mut FireworksEngine<StdRng>) -> FrameStats {
    for _ in 0..1000 {
        let stats = e.step();
        if stats.exploded > 0 {
            return stats;
        }
    }
    panic!("projectile never exploded");
}

#[test]
fn launch_starts_at_bottom_edge_within_ranges() {
    let mut e = engine(quiet(), 1);
    for _ in 0..5 {
        assert!(e.launch());
    }
    assert!(!e.launch());
    for p in e.projectiles() {
        assert_eq!(p.pos.y, 600.0);
        assert!((0.0..800.0).contains(&p.pos.x));
        assert!((60.0..300.0).contains(&p.target_y));
        assert!((-12.0..=-8.0).contains(&p.vy));
        assert!(PALETTE.contains(&p.color));
    }
}

#[test]
fn projectile_count_never_exceeds_cap() {
    let cfg = FireworksConfig {
        spawn_probability: 1.0,
        ..FireworksConfig::default()
    };
    let mut e = engine(cfg, 7);
    for _ in 0..3000 {
        let stats = e.step();
        assert!(stats.projectiles <= 5);
        assert_eq!(stats.projectiles, e.projectiles().len());
    }
}

#[test]
fn burst_is_single_and_evenly_spaced() {
    let mut e = engine(quiet(), 3);
    e.launch();
    let stats = run_to_burst(&mut e);
    assert_eq!(stats.exploded, 1);

    let p = &e.projectiles()[0];
    assert!(p.exploded);
    let n = p.particles.len();
    assert!((50..100).contains(&n));
    assert_eq!(stats.spawned, n);

    let step = TAU / n as f64;
    let mut sum = Vec2::ZERO;
    for (i, part) in p.particles.iter().enumerate() {
        let speed = part.vel.hypot();
        assert!((2.0..6.0).contains(&speed));
        assert!((2.0..5.0).contains(&part.radius));
        assert_eq!(part.pos, p.pos);
        assert_eq!(part.color, p.color);
        let angle = part.vel.y.atan2(part.vel.x).rem_euclid(TAU);
        let expected = i as f64 * step;
        let diff = (angle - expected).abs();
        assert!(diff < 1e-9 || (TAU - diff) < 1e-9, "fragment {i}: {angle} vs {expected}");
        sum += part.vel / speed;
    }
    assert!(sum.hypot() < 1e-9);

    for _ in 0..10 {
        assert_eq!(e.step().exploded, 0);
    }
}

#[test]
fn alpha_decreases_by_decay_until_removal() {
    let cfg = quiet();
    let decay = cfg.particle_decay;
    let mut e = engine(cfg, 11);
    e.launch();
    run_to_burst(&mut e);

    let mut prev = 1.0_f32;
    let mut frames = 0;
    loop {
        let stats = e.step();
        frames += 1;
        if e.projectiles().is_empty() {
            assert!(stats.faded >= 50);
            break;
        }
        for part in &e.projectiles()[0].particles {
            assert!((0.0..=1.0).contains(&part.alpha));
            assert!(part.alpha < prev);
            assert!((prev - part.alpha - decay).abs() < 1e-5);
        }
        prev = e.projectiles()[0].particles[0].alpha;
        assert!(frames < 200);
    }
    assert!(frames >= (1.0 / decay) as usize - 1);
}

#[test]
fn same_seed_same_simulation() {
    let cfg = FireworksConfig {
        spawn_probability: 0.2,
        ..FireworksConfig::default()
    };
    let mut a = engine(cfg.clone(), 99);
    let mut b = engine(cfg, 99);
    for _ in 0..300 {
        assert_eq!(a.step(), b.step());
    }
    assert_eq!(a.projectiles(), b.projectiles());
}

#[test]
fn resize_keeps_in_flight_coordinates() {
    let mut e = engine(quiet(), 5);
    e.launch();
    e.step();
    let before = e.projectiles()[0].pos;
    e.resize(100, 50);
    assert_eq!(e.size(), (100, 50));
    assert_eq!(e.projectiles()[0].pos, before);
    e.step();
    e.resize(0, 0);
    assert_eq!(e.size(), (1, 1));
    for _ in 0..400 {
        e.step();
    }
}

#[test]
fn rejects_bad_config_and_empty_canvas() {
    let bad = FireworksConfig {
        burst_min: 100,
        burst_max: 50,
        ..FireworksConfig::default()
    };
    assert!(FireworksEngine::new(bad, 10, 10, StdRng::seed_from_u64(0)).is_err());
    assert!(FireworksEngine::new(FireworksConfig::default(), 0, 10, StdRng::seed_from_u64(0)).is_err());
}
