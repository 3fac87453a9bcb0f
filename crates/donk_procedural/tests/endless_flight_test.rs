//! # Endless Flight Integration Test
//!
//! Flies the tube for a long time and checks the streaming window holds.

use std::sync::Arc;

use donk_procedural::{BranchId, Level, SegmentLibrary, TileCatalog, TubeConfig, TubeManager};

/// Test: the window never runs short and nothing behind the threshold
/// stays attached.
#[test]
fn test_window_and_cull_invariants() {
    let config = TubeConfig::production();
    let (look_ahead, cull_offset) = (config.look_ahead, config.cull_offset);
    let catalog = Arc::new(TileCatalog::build(&SegmentLibrary::standard()));
    let mut tube = TubeManager::new(config, catalog).unwrap();

    // 10 units per second at 60 fps, boosted
    let delta = 10.0 * 8.0 / 60.0;
    for tick in 0..20_000 {
        tube.advance(delta);

        assert!(tube.window_len() >= look_ahead, "window short at tick {tick}");
        let current = tube.current_ring().serial;
        for ring in tube.iter().take_while(|r| r.serial != current) {
            assert!(!ring.needs_cull(cull_offset), "ring {} left behind at tick {tick}", ring.serial);
        }
        assert!(tube.current_ring().contains(0.0));
    }

    let stats = tube.stats();
    assert!(stats.culled > 0);
    assert!(tube.ring_count() <= look_ahead + 4);
    assert_eq!(stats.generated - stats.culled, tube.ring_count() as u64);
}

/// Test: flying through the transition swaps the active branch and
/// releases the trunk.
#[test]
fn test_branch_swap() {
    let mut tube = TubeManager::with_standard_library(TubeConfig::production()).unwrap();
    let spacing = tube.config().ring_spacing;

    let mut levels = vec![tube.current_ring().level];
    for _ in 0..(120 * 8) {
        tube.advance(spacing / 8.0);
        let level = tube.current_ring().level;
        if levels.last() != Some(&level) {
            levels.push(level);
        }
    }

    assert_eq!(levels[..3], [Level::Steel, Level::Rift, Level::Flesh]);
    assert!(tube.stats().branch_swaps >= 1);
    assert!(tube.active_branch() > BranchId::TRUNK);
    assert!(tube.branch(BranchId::TRUNK).is_none());
    assert!(tube.branch(tube.active_branch()).is_some());
}

/// Test: crash recovery rewinds and flies on without gaps.
#[test]
fn test_rewind_and_continue() {
    let mut tube = TubeManager::with_standard_library(TubeConfig::test()).unwrap();
    for _ in 0..300 {
        tube.advance(1.5);
    }
    let y = tube.y();

    tube.set_y(y - 120.0);
    assert!((tube.y() - (y - 120.0)).abs() < 1e-3);
    assert!(tube.current_ring().contains(0.0));

    for _ in 0..300 {
        tube.advance(1.5);
        assert!(tube.current_ring().contains(0.0));
    }
    assert!(tube.window_len() >= tube.config().look_ahead);
}

/// Test: a rewind far past the start is padded up to the cap, and the tube
/// recovers once the player flies back in.
#[test]
fn test_rewind_past_start_is_capped() {
    let mut tube = TubeManager::with_standard_library(TubeConfig::test()).unwrap();
    let cap = tube.config().look_ahead * 4;

    tube.set_y(-1.0e6);
    assert_eq!(tube.stats().padded, cap as u64);
    assert!(tube.ring_count() > cap);

    tube.set_y(0.0);
    assert!(tube.current_ring().contains(0.0) || tube.first_ring().position > 0.0);
}

/// Test: the first ring carries the level's music cue.
#[test]
fn test_music_cue_on_first_ring() {
    let tube = TubeManager::with_standard_library(TubeConfig::production()).unwrap();
    assert!(tube.first_ring().play_tracks.contains("steel"));
    assert!(tube.iter().skip(1).take(3).all(|r| r.play_tracks.is_empty()));
}
