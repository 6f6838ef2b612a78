//! # Integration Tests
//!
//! Integration and end-to-end tests.
//!
//! Covers:
//! - Configuration to archive wiring
//! - Mock e2e capture (no camera required)
//! - Concurrent observer stress on the frame pool

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{PixelFormat, StreamKind, StreamMode};
    use frame_archive::{ArchiveError, FrameArchive};

    const CONFIG: &str = r#"
[archive]
freelist_capacity = 8
freelist_max_age = 50

[[streams]]
stream = "depth"
width = 16
height = 8
format = "z16"
fps = 30

[[streams]]
stream = "infrared"
width = 16
height = 8
format = "y8"
fps = 30
"#;

    #[test]
    fn test_blueprint_configures_archive() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let mut archive = FrameArchive::from_blueprint(&blueprint);

        assert!(archive.is_stream_enabled(StreamKind::Depth));
        assert!(archive.is_stream_enabled(StreamKind::Infrared));
        assert!(!archive.is_stream_enabled(StreamKind::Color));
        assert_eq!(
            archive.get_mode(StreamKind::Depth),
            Some(StreamMode::new(16, 8, PixelFormat::Z16, 30))
        );
        assert_eq!(archive.get_mode(StreamKind::Color), None);

        let data = archive
            .alloc_frame(StreamKind::Infrared, 0, 1, 0, false)
            .unwrap();
        assert_eq!(data.len(), 16 * 8);

        let err = archive
            .alloc_frame(StreamKind::Color, 0, 1, 0, false)
            .unwrap_err();
        assert!(matches!(err, ArchiveError::StreamDisabled { .. }));
    }

    #[test]
    fn test_freelist_age_from_config() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let mut archive = FrameArchive::from_blueprint(&blueprint);

        archive.alloc_frame(StreamKind::Depth, 0, 1, 0, false).unwrap();
        drop(archive.track_frame(StreamKind::Depth).unwrap());
        assert_eq!(archive.stats().freelist_depth, 1);

        // Within max age: reused
        archive.alloc_frame(StreamKind::Depth, 40, 2, 0, false).unwrap();
        drop(archive.track_frame(StreamKind::Depth).unwrap());
        assert_eq!(archive.stats().buffers_reused, 1);

        // Beyond max age: aged out, fresh buffer
        archive.alloc_frame(StreamKind::Depth, 200, 3, 0, false).unwrap();
        let stats = archive.stats();
        assert_eq!(stats.buffers_aged_out, 1);
        assert_eq!(stats.buffers_reused, 1);
        assert_eq!(stats.buffers_allocated, 2);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use capture::{pattern_byte, CaptureSession, MockDevice, MockDeviceConfig};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::StreamKind;

    const CONFIG: &str = r#"
[capture]
warmup_frames = 2
queue_capacity = 4
frame_timeout_ms = 2000

[[streams]]
stream = "depth"
width = 8
height = 8
format = "z16"
fps = 100

[[streams]]
stream = "color"
width = 8
height = 8
format = "rgb8"
fps = 100
"#;

    /// End-to-end test: MockDevice -> FrameArchive -> FrameSyncer -> consumer
    ///
    /// The consumer keeps framesets in the archive's pool, detaches single
    /// frames from them and releases everything before stopping.
    #[tokio::test]
    async fn test_e2e_mock_capture() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let device = MockDevice::new(MockDeviceConfig {
            frequency_hz: Some(200.0),
            ..MockDeviceConfig::new(blueprint.stream_modes())
        });
        let mut session = CaptureSession::new(&blueprint, Box::new(device));
        session.start().unwrap();
        session.warm_up().await.unwrap();

        let archive = session.archive().clone();
        let mut stored = Vec::new();
        let mut last_frame_number = 0;

        for _ in 0..5 {
            let set = session.wait_for_frames().await.unwrap();
            let frame_number = set.frame_number(StreamKind::Color).unwrap();
            assert!(frame_number > last_frame_number);
            last_frame_number = frame_number;

            let color = set.data(StreamKind::Color).unwrap();
            assert_eq!(color.len(), 8 * 8 * 3);
            assert_eq!(color[10], pattern_byte(StreamKind::Color, frame_number, 10));
            drop(color);

            stored.push(archive.store_frameset(set).unwrap());
        }
        assert_eq!(archive.stats().live_framesets, 5);

        // Detach the depth frame of the first set and keep it alone
        let depth = archive.detach_frame_ref(stored[0], StreamKind::Depth).unwrap();
        let first = archive.frameset(stored[0]).unwrap();
        assert!(!first.contains(StreamKind::Depth));
        assert!(first.contains(StreamKind::Color));
        drop(first);

        for handle in stored {
            archive.release_frameset(handle).unwrap();
        }
        let frame = archive.frame_ref(depth).unwrap();
        assert!(frame.is_live());
        archive.release_frame_ref(depth).unwrap();
        drop(frame);

        session.stop();
        let stats = archive.stats();
        assert_eq!(stats.live_frames, 0);
        assert_eq!(stats.live_framesets, 0);
        assert_eq!(stats.live_refs, 0);
        assert_eq!(stats.invalid_handles, 0);
        assert!(session.metrics().frames_tracked >= 14);
    }

    #[tokio::test]
    async fn test_slow_consumer_recycles_buffers() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let device = MockDevice::new(MockDeviceConfig {
            frequency_hz: Some(500.0),
            ..MockDeviceConfig::new(blueprint.stream_modes())
        });
        let mut session = CaptureSession::new(&blueprint, Box::new(device));
        session.start().unwrap();

        for _ in 0..10 {
            let set = session.wait_for_frames().await.unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(set);
        }

        let stats = session.archive_stats();
        assert!(stats.buffers_reused > 0);
        assert_eq!(stats.pool_exhausted, 0);
        assert!(session.metrics().framesets_dropped > 0);
    }
}

#[cfg(test)]
mod stress_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::thread;

    use contracts::{PixelFormat, StreamKind, StreamMode, StreamModes};
    use frame_archive::{FrameArchive, FrameContinuation, FrameRef};

    fn modes() -> StreamModes {
        StreamModes::new()
            .with(StreamKind::Depth, StreamMode::new(8, 8, PixelFormat::Z16, 30))
            .with(StreamKind::Color, StreamMode::new(8, 8, PixelFormat::Rgb8, 30))
    }

    /// Producer publishes while several consumers clone and drop references.
    /// Every frame's continuation must run exactly once.
    #[test]
    fn test_concurrent_observers() {
        const FRAMES: u64 = 2000;
        const CONSUMERS: usize = 4;

        let mut archive = FrameArchive::new(modes());
        let returned = Arc::new(AtomicUsize::new(0));

        let (senders, receivers): (Vec<_>, Vec<_>) = (0..CONSUMERS)
            .map(|_| mpsc::sync_channel::<FrameRef>(8))
            .unzip();

        let consumers: Vec<_> = receivers
            .into_iter()
            .map(|rx| {
                thread::spawn(move || {
                    let mut seen = 0u64;
                    while let Ok(frame) = rx.recv() {
                        let copy = frame.clone();
                        let n = copy.frame_number().unwrap();
                        assert_eq!(copy.data().unwrap()[0], n as u8);
                        drop(frame);
                        drop(copy);
                        seen += 1;
                    }
                    seen
                })
            })
            .collect();

        for n in 0..FRAMES {
            let stream = if n % 2 == 0 {
                StreamKind::Depth
            } else {
                StreamKind::Color
            };
            let data = archive.alloc_frame(stream, n as i64, n, 0, false).unwrap();
            data[0] = n as u8;

            let returned = returned.clone();
            archive
                .attach_continuation(
                    stream,
                    FrameContinuation::new(move || {
                        returned.fetch_add(1, Ordering::SeqCst);
                    }),
                )
                .unwrap();

            let frame = archive.track_frame(stream).unwrap();
            let target = &senders[n as usize % CONSUMERS];
            // Fan out one extra observer to the next consumer
            let extra = frame.clone();
            target.send(frame).unwrap();
            senders[(n as usize + 1) % CONSUMERS].send(extra).unwrap();
        }
        drop(senders);

        let seen: u64 = consumers.into_iter().map(|c| c.join().unwrap()).sum();
        assert_eq!(seen, FRAMES * 2);

        let stats = archive.stats();
        assert_eq!(stats.live_frames, 0);
        assert_eq!(stats.frames_published, FRAMES);
        assert_eq!(stats.frames_released, FRAMES);
        assert_eq!(returned.load(Ordering::SeqCst), FRAMES as usize);

        archive.flush();
        assert_eq!(returned.load(Ordering::SeqCst), FRAMES as usize);
    }

    /// Consumers hold references across a flush: they turn stale and the
    /// continuation still runs once.
    #[test]
    fn test_flush_with_outstanding_observers() {
        let mut archive = FrameArchive::new(modes());
        let returned = Arc::new(AtomicUsize::new(0));

        let mut held = Vec::new();
        for n in 0..16u64 {
            archive
                .alloc_frame(StreamKind::Depth, n as i64, n, 0, true)
                .unwrap();
            let counter = returned.clone();
            archive
                .attach_continuation(
                    StreamKind::Depth,
                    FrameContinuation::new(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }),
                )
                .unwrap();
            held.push(archive.track_frame(StreamKind::Depth).unwrap());
        }

        let workers: Vec<_> = held
            .chunks(4)
            .map(|chunk| {
                let chunk: Vec<FrameRef> = chunk.to_vec();
                thread::spawn(move || {
                    for _ in 0..100 {
                        let copies: Vec<FrameRef> = chunk.iter().map(FrameRef::clone).collect();
                        drop(copies);
                    }
                    chunk
                })
            })
            .collect();
        let returned_chunks: Vec<Vec<FrameRef>> =
            workers.into_iter().map(|w| w.join().unwrap()).collect();

        archive.flush();
        assert_eq!(returned.load(Ordering::SeqCst), 16);
        assert!(returned_chunks.iter().flatten().all(|f| !f.is_live()));
        assert!(held.iter().all(|f| !f.is_live()));

        drop(returned_chunks);
        drop(held);
        assert_eq!(returned.load(Ordering::SeqCst), 16);
        assert_eq!(archive.stats().live_frames, 0);
    }
}
