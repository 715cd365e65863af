use rand::{Rng, SeedableRng};
use tex_combine_core::error::TexCombineError;
use tex_combine_core::layout::SpriteSize;
use tex_combine_core::layout::maxrects::pack_with_heuristic;
use tex_combine_core::layout::selector::select_best;
use tex_combine_core::model::LayoutStats;
use tex_combine_core::prelude::*;

fn random_sprites(seed: u64, count: usize) -> Vec<SpriteSize> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| SpriteSize::new(format!("s{}", i), rng.gen_range(2..=40), rng.gen_range(2..=40)))
        .collect()
}

#[test]
fn selector_never_loses_to_a_single_heuristic() {
    for seed in [1u64, 2, 3, 99] {
        let sprites = random_sprites(seed, 70);
        let best = select_best(&sprites, 160, 160, 1, &MaxRectsHeuristic::ALL, false)
            .expect("four candidates");
        for h in MaxRectsHeuristic::ALL {
            let placements = pack_with_heuristic(&sprites, 160, 160, 1, h);
            let stats = LayoutStats::from_placements(&placements, sprites.len(), 160, 160);
            assert!(best.stats.placed >= stats.placed, "seed {seed}: {h} placed more");
            if best.stats.placed == stats.placed {
                assert!(best.stats.occupancy >= stats.occupancy, "seed {seed}: {h} denser");
            }
        }
    }
}

#[test]
fn selector_is_stable_across_parallel_and_sequential() {
    let sprites = random_sprites(5, 80);
    let a = select_best(&sprites, 200, 200, 2, &MaxRectsHeuristic::ALL, false).expect("seq");
    let b = select_best(&sprites, 200, 200, 2, &MaxRectsHeuristic::ALL, true).expect("par");
    assert_eq!(a.heuristic, b.heuristic);
    assert_eq!(a.placements, b.placements);
}

#[test]
fn selector_with_no_heuristics_yields_nothing() {
    let sprites = random_sprites(5, 3);
    assert!(select_best(&sprites, 64, 64, 0, &[], false).is_none());
}

#[test]
fn pinned_heuristic_is_reported() {
    let cfg = CombineConfig::builder()
        .with_canvas(128, 128)
        .margin(1)
        .mr_heuristic(Some(MaxRectsHeuristic::BottomLeft))
        .build();
    let out = pack_layout(vec![("a", 10, 10), ("b", 20, 5)], &cfg).expect("layout");
    assert_eq!(out.heuristic, Some(MaxRectsHeuristic::BottomLeft));
    assert_eq!(out.placements.len(), 2);
}

#[test]
fn sprites_that_do_not_fit_are_listed_not_fatal() {
    let cfg = CombineConfig::builder().with_canvas(32, 32).margin(0).build();
    let out = pack_layout(vec![("big", 40, 10), ("fit", 16, 16)], &cfg).expect("layout");
    assert_eq!(out.placements.len(), 1);
    assert!(out.get("fit").is_some());
    assert_eq!(out.dropped, vec!["big".to_string()]);
    assert_eq!(out.stats.total, 2);
}

#[test]
fn occupancy_is_placed_area_over_canvas() {
    let cfg = CombineConfig::builder().with_canvas(64, 64).margin(0).build();
    let inputs: Vec<(String, u32, u32)> = (0..4).map(|i| (format!("t{}", i), 16, 16)).collect();
    let out = pack_layout(inputs, &cfg).expect("layout");
    assert_eq!(out.stats.placed, 4);
    assert_eq!(out.stats.used_area, 4 * 16 * 16);
    assert_eq!(out.stats.canvas_area, 64 * 64);
    assert!((out.stats.occupancy - 0.25).abs() < 1e-9);
    assert!(out.stats.summary().contains("25.00%"));
}

#[test]
fn zero_area_sprites_are_dropped() {
    let cfg = CombineConfig::builder().with_canvas(64, 64).build();
    let out = pack_layout(vec![("empty", 0, 8), ("ok", 8, 8)], &cfg).expect("layout");
    assert_eq!(out.dropped, vec!["empty".to_string()]);
    assert!(out.get("ok").is_some());
}

#[test]
fn empty_input_yields_empty_layout() {
    let cfg = CombineConfig::default();
    let out = pack_layout(Vec::<(String, u32, u32)>::new(), &cfg).expect("layout");
    assert!(out.placements.is_empty());
    assert!(out.dropped.is_empty());
    assert_eq!(out.stats.occupancy, 0.0);
}

#[test]
fn duplicate_keys_are_rejected() {
    let cfg = CombineConfig::default();
    let err = pack_layout(vec![("a", 4, 4), ("a", 8, 8)], &cfg).unwrap_err();
    assert!(matches!(err, TexCombineError::InvalidInput(msg) if msg.contains("a")));
}

#[test]
fn invalid_canvas_is_a_configuration_error() {
    let cfg = CombineConfig::builder().with_canvas(0, 64).build();
    match pack_layout(vec![("a", 4, 4)], &cfg) {
        Err(TexCombineError::InvalidDimensions { width, height }) => {
            assert_eq!((width, height), (0, 64));
        }
        other => panic!("expected InvalidDimensions, got {:?}", other.map(|o| o.placements)),
    }

    let cfg = CombineConfig::builder().with_canvas(8, 8).margin(4).build();
    match cfg.validate() {
        Err(TexCombineError::InvalidConfig(msg)) => assert!(msg.contains("margin")),
        other => panic!("expected InvalidConfig, got {other:?}"),
    }
}

#[test]
fn option_selectors_parse_or_fail_fast() {
    assert_eq!("Gaussian".parse::<BleedAlgorithm>().unwrap(), BleedAlgorithm::Gaussian);
    assert_eq!("none".parse::<BleedAlgorithm>().unwrap(), BleedAlgorithm::None);
    assert_eq!("simple-row".parse::<LayoutStrategy>().unwrap(), LayoutStrategy::SimpleRow);
    assert_eq!("maxrects".parse::<LayoutStrategy>().unwrap(), LayoutStrategy::MaxRects);
    assert_eq!("bssf".parse::<MaxRectsHeuristic>().unwrap(), MaxRectsHeuristic::BestShortSideFit);

    match "blur".parse::<BleedAlgorithm>() {
        Err(TexCombineError::UnknownOption { kind, value }) => {
            assert_eq!(kind, "bleed algorithm");
            assert_eq!(value, "blur");
        }
        other => panic!("expected UnknownOption, got {other:?}"),
    }
    assert!("skyline".parse::<LayoutStrategy>().is_err());
    assert!("cp".parse::<MaxRectsHeuristic>().is_err());
}

#[test]
fn defaults_match_documented_surface() {
    let cfg = CombineConfig::default();
    assert_eq!(cfg.margin, 4);
    assert_eq!(cfg.bleed_algorithm, BleedAlgorithm::Gaussian);
    assert_eq!(cfg.layout_strategy, LayoutStrategy::MaxRects);
    assert_eq!(cfg.mr_heuristic, None);
    assert!(cfg.validate().is_ok());
}
