use super::*;

const RATE: u32 = 8000;

#[test]
fn melody_table_matches_the_tune() {
    let hz: Vec<f64> = HAPPY_BIRTHDAY.iter().map(|n| n.frequency_hz).collect();
    assert_eq!(
        hz,
        vec![392.0, 392.0, 440.0, 392.0, 523.0, 494.0, 392.0, 392.0, 440.0, 392.0, 587.0, 523.0]
    );
    for pair in HAPPY_BIRTHDAY.windows(2) {
        assert!(pair[1].start_s >= pair[0].start_s + pair[0].duration_s - 1e-9);
    }
    let last = HAPPY_BIRTHDAY[11];
    assert!(last.start_s + last.duration_s < LOOP_SECONDS);
}

#[test]
fn stopped_session_is_silent() {
    let mut s = MelodySession::new(RATE).unwrap();
    let mut buf = vec![1.0_f32; 256];
    s.render(&mut buf);
    assert!(buf.iter().all(|&v| v == 0.0));
    assert_eq!(s.position(), Duration::ZERO);
}

#[test]
fn envelope_decays_from_start_to_end_gain() {
    assert_eq!(sample_at(0.0), 0.0);
    // A quarter period into the first G is the triangle peak.
    let peak = sample_at(0.25 / 392.0);
    assert!((peak - START_GAIN).abs() < 0.001, "{peak}");

    for t in (0..7200).map(|ms| f64::from(ms) / 1000.0) {
        assert!(sample_at(t).abs() <= START_GAIN + 1e-9);
    }
    let near_end = HAPPY_BIRTHDAY[5].start_s + HAPPY_BIRTHDAY[5].duration_s - 0.001;
    assert!(sample_at(near_end).abs() <= END_GAIN + 1e-3);
}

#[test]
fn tail_of_the_loop_is_silent_and_loop_repeats() {
    for ms in 7200..8000 {
        assert_eq!(sample_at(f64::from(ms) / 1000.0), 0.0);
    }

    let mut s = MelodySession::new(RATE).unwrap();
    s.start();
    let mut two_loops = vec![0.0_f32; (RATE * 16) as usize];
    s.render(&mut two_loops);
    let (a, b) = two_loops.split_at((RATE * 8) as usize);
    assert_eq!(a, b);
    assert!(a.iter().any(|&v| v != 0.0));
    assert_eq!(s.position(), Duration::from_secs(16));
}

#[test]
fn stop_then_start_restarts_from_the_top() {
    let mut s = MelodySession::new(RATE).unwrap();
    s.start();
    let mut first = vec![0.0_f32; 400];
    s.render(&mut first);
    s.stop();
    assert!(!s.is_playing());

    let mut silent = vec![1.0_f32; 10];
    s.render(&mut silent);
    assert!(silent.iter().all(|&v| v == 0.0));

    s.start();
    let mut again = vec![0.0_f32; 400];
    s.render(&mut again);
    assert_eq!(first, again);
}

#[test]
fn render_loop_is_eight_seconds_and_leaves_session_stopped() {
    let mut s = MelodySession::new(RATE).unwrap();
    let pcm = s.render_loop();
    assert_eq!(pcm.len(), (RATE * 8) as usize);
    assert!(!s.is_playing());
}

#[test]
fn pcm_is_little_endian_f32() {
    let mut out = Vec::new();
    write_f32le(&[0.5, -1.0], &mut out).unwrap();
    assert_eq!(out.len(), 8);
    assert_eq!(f32::from_le_bytes([out[0], out[1], out[2], out[3]]), 0.5);
    assert_eq!(f32::from_le_bytes([out[4], out[5], out[6], out[7]]), -1.0);
}

#[test]
fn zero_sample_rate_is_rejected() {
    assert!(MelodySession::new(0).is_err());
}
