use super::*;
use rand::SeedableRng;

fn cfg() -> FireworksConfig {
    FireworksConfig {
        spawn_probability: 0.5,
        glow_px: 4.0,
        frame_interval_ms: 1,
        ..FireworksConfig::default()
    }
}

fn frame_loop(sink: &InMemoryFrameSink, w: u32, h: u32) -> FrameLoop<StdRng> {
    let engine = FireworksEngine::new(cfg(), w, h, StdRng::seed_from_u64(4)).unwrap();
    FrameLoop::new(engine, Box::new(sink.clone())).unwrap()
}

fn wait_until(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        std::thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn manual_scheduler_runs_exact_frame_count() {
    let sink = InMemoryFrameSink::new();
    let mut lp = frame_loop(&sink, 48, 32);
    let frames = lp
        .run(&mut ManualScheduler::frames(5), &CancellationToken::new())
        .unwrap();
    assert_eq!(frames, 5);
    assert_eq!(sink.count(), 5);
    assert_eq!(lp.engine().frame(), 5);
    let last = sink.last().unwrap();
    assert_eq!((last.width, last.height), (48, 32));
}

#[test]
fn cancelled_token_runs_nothing() {
    let sink = InMemoryFrameSink::new();
    let mut lp = frame_loop(&sink, 16, 16);
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert_eq!(lp.run(&mut ManualScheduler::frames(3), &cancel).unwrap(), 0);
    assert_eq!(sink.count(), 0);
}

#[test]
fn resize_event_applies_before_next_frame() {
    let sink = InMemoryFrameSink::new();
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut lp = frame_loop(&sink, 40, 30).with_events(rx);

    lp.step().unwrap();
    tx.send(ViewEvent::Resize { width: 10, height: 99 }).unwrap();
    tx.send(ViewEvent::Resize { width: 20, height: 10 }).unwrap();
    lp.step().unwrap();
    drop(tx);
    lp.step().unwrap();

    assert_eq!(sink.sizes(), vec![(40, 30), (20, 10), (20, 10)]);
    assert_eq!(lp.engine().size(), (20, 10));
    assert_eq!(lp.canvas().size(), (20, 10));
}

#[test]
fn many_frames_keep_invariants_through_resizes() {
    let sink = InMemoryFrameSink::new();
    let mut lp = frame_loop(&sink, 64, 64);
    for i in 0..300u32 {
        if i % 50 == 25 {
            lp.resize(32 + i % 7, 16 + i % 5);
        }
        let stats = lp.step().unwrap();
        assert!(stats.projectiles <= 5);
        for p in lp.engine().projectiles() {
            assert!(p.particles.iter().all(|q| (0.0..=1.0).contains(&q.alpha)));
        }
    }
}

#[test]
fn mounted_view_runs_resizes_and_unmounts() {
    let sink = InMemoryFrameSink::new();
    let mounted = MountedFireworks::mount_with(
        frame_loop(&sink, 64, 48),
        Box::new(TickScheduler::new(Duration::from_millis(1))),
    )
    .unwrap();
    assert!(mounted.is_running());

    wait_until(|| sink.count() >= 3);
    mounted.resize(32, 16).unwrap();
    wait_until(|| sink.sizes().contains(&(32, 16)));

    let frames = mounted.unmount().unwrap();
    let seen = sink.count();
    assert_eq!(frames, seen);
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(sink.count(), seen);
}

#[test]
fn zero_sized_resize_keeps_the_loop_running() {
    let sink = InMemoryFrameSink::new();
    let mut lp = frame_loop(&sink, 64, 48);
    lp.step().unwrap();
    lp.resize(0, 48);
    lp.step().unwrap();
    assert_eq!(lp.canvas().size(), (1, 48));
    assert_eq!(lp.engine().size(), (1, 48));

    let mounted = MountedFireworks::mount_with(
        frame_loop(&sink, 64, 48),
        Box::new(TickScheduler::new(Duration::from_millis(1))),
    )
    .unwrap();
    mounted.resize(0, 0).unwrap();
    wait_until(|| sink.sizes().contains(&(1, 1)));
    let before = sink.count();
    wait_until(|| sink.count() >= before + 3);
    assert!(mounted.is_running());

    mounted.resize(40, 20).unwrap();
    wait_until(|| sink.sizes().contains(&(40, 20)));
    assert!(mounted.unmount().is_ok());
}

#[test]
fn dropping_the_handle_stops_the_loop() {
    let sink = InMemoryFrameSink::new();
    let mounted = MountedFireworks::mount_with(
        frame_loop(&sink, 16, 16),
        Box::new(TickScheduler::new(Duration::from_millis(1))),
    )
    .unwrap();
    wait_until(|| sink.count() >= 1);
    drop(mounted);
    let seen = sink.count();
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(sink.count(), seen);
}

#[test]
fn png_sequence_sink_writes_every_nth_frame() {
    let dir = std::env::temp_dir().join(format!("birthday-card-frames-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let engine = FireworksEngine::new(cfg(), 8, 8, StdRng::seed_from_u64(1)).unwrap();
    let sink = PngSequenceSink::new(&dir, 2).unwrap();
    let mut lp = FrameLoop::new(engine, Box::new(sink)).unwrap();
    lp.run(&mut ManualScheduler::frames(4), &CancellationToken::new())
        .unwrap();

    let mut names: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["frame_00002.png", "frame_00004.png"]);
    let _ = std::fs::remove_dir_all(&dir);
}
