use std::collections::HashMap;

use image::{DynamicImage, Rgba, RgbaImage};
use tex_combine_core::error::TexCombineError;
use tex_combine_core::pipeline::{PreparedSprite, compose_atlas, find_aliases};
use tex_combine_core::prelude::*;

fn solid(w: u32, h: u32, color: [u8; 4]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba(color)))
}

fn sprite(key: &str, image: DynamicImage) -> InputSprite {
    InputSprite {
        key: key.to_string(),
        image,
    }
}

#[test]
fn combine_places_draws_and_bleeds_each_sprite() {
    let cfg = CombineConfig::builder().with_canvas(64, 64).margin(2).build();
    let red = [255, 0, 0, 255];
    let blue = [0, 0, 255, 255];
    let out = combine_sprites(
        vec![sprite("red", solid(8, 8, red)), sprite("blue", solid(6, 6, blue))],
        &cfg,
    )
    .expect("combine");

    assert_eq!(out.atlas.dimensions(), (64, 64));
    assert_eq!(out.color_map.dimensions(), (64, 64));
    assert_eq!(out.frames.len(), 2);
    assert!(out.dropped.is_empty());
    assert!(out.heuristic.is_some());

    for f in &out.frames {
        let color = if f.key == "red" { red } else { blue };
        assert!(!f.trimmed);
        assert_eq!(*out.atlas.get_pixel(f.frame.x, f.frame.y), Rgba(color));
        assert_eq!(*out.color_map.get_pixel(f.frame.x, f.frame.y), Rgba(color));
        // margin pixel left of the sprite picks up its colour but stays transparent
        let edge = out.atlas.get_pixel(f.frame.x - 1, f.frame.y);
        assert_eq!(*edge, Rgba([color[0], color[1], color[2], 0]));
    }

    let regions: Vec<Rect> = out.frames.iter().map(|f| f.frame.expand(2)).collect();
    for (x, y, p) in out.atlas.enumerate_pixels() {
        if !regions.iter().any(|r| r.contains_point(x, y)) {
            assert_eq!(*p, Rgba([0, 0, 0, 0]), "({x}, {y}) outside every region");
        }
    }
    assert_eq!(out.bleed_stats.regions, 2);
    assert_eq!(out.bleed_stats.unresolved, 0);
}

#[test]
fn combine_reports_sprites_that_do_not_fit() {
    let cfg = CombineConfig::builder().with_canvas(16, 16).margin(0).build();
    let out = combine_sprites(
        vec![
            sprite("a", solid(10, 10, [1, 1, 1, 255])),
            sprite("b", solid(10, 10, [2, 2, 2, 255])),
        ],
        &cfg,
    )
    .expect("combine");

    assert_eq!(out.frames.len(), 1);
    assert_eq!(out.dropped.len(), 1);
    assert_eq!(out.layout_stats.placed, 1);
    assert_eq!(out.layout_stats.total, 2);
    assert_eq!(out.atlas.dimensions(), (16, 16));
}

#[test]
fn trimming_places_only_the_opaque_bounds() {
    let mut img = RgbaImage::new(10, 10);
    for y in 3..7 {
        for x in 3..7 {
            img.put_pixel(x, y, Rgba([9, 8, 7, 255]));
        }
    }
    let cfg = CombineConfig::builder()
        .with_canvas(32, 32)
        .margin(1)
        .trim(true)
        .build();
    let out = combine_sprites(vec![sprite("t", DynamicImage::ImageRgba8(img.clone()))], &cfg)
        .expect("combine");

    let f = &out.frames[0];
    assert!(f.trimmed);
    assert_eq!((f.frame.w, f.frame.h), (4, 4));
    assert_eq!(f.source, Rect::new(3, 3, 4, 4));
    assert_eq!(f.source_size, (10, 10));
    assert_eq!(*out.atlas.get_pixel(f.frame.x, f.frame.y), Rgba([9, 8, 7, 255]));

    let cfg = CombineConfig::builder().with_canvas(32, 32).margin(1).build();
    let out = combine_sprites(vec![sprite("t", DynamicImage::ImageRgba8(img))], &cfg)
        .expect("combine");
    let f = &out.frames[0];
    assert!(!f.trimmed);
    assert_eq!(f.source, Rect::new(0, 0, 10, 10));
}

#[test]
fn combine_rejects_duplicate_keys() {
    let cfg = CombineConfig::builder().with_canvas(32, 32).build();
    let res = combine_sprites(
        vec![
            sprite("dup", solid(2, 2, [0, 0, 0, 255])),
            sprite("dup", solid(3, 3, [0, 0, 0, 255])),
        ],
        &cfg,
    );
    assert!(matches!(res, Err(TexCombineError::InvalidInput(_))));
}

#[test]
fn bleed_layout_checks_canvas_size() {
    let cfg = CombineConfig::builder().with_canvas(32, 32).margin(1).build();
    let layout = pack_layout(vec![("a", 4, 4)], &cfg).expect("layout");
    let mut wrong = RgbaImage::new(16, 16);
    match bleed_layout(&mut wrong, &layout, &cfg) {
        Err(TexCombineError::BufferMismatch { expected, actual }) => {
            assert_eq!(expected, (32, 32));
            assert_eq!(actual, (16, 16));
        }
        other => panic!("expected BufferMismatch, got {:?}", other.map(|f| f.stats)),
    }
}

#[test]
fn staged_pipeline_matches_combine() {
    let cfg = CombineConfig::builder()
        .with_canvas(48, 48)
        .margin(3)
        .bleed_algorithm(BleedAlgorithm::Weighted)
        .build();
    let mut checker = RgbaImage::new(9, 7);
    for (x, y, p) in checker.enumerate_pixels_mut() {
        if (x + y) % 3 == 0 {
            *p = Rgba([(x * 20) as u8, (y * 30) as u8, 90, 255]);
        }
    }
    let images = vec![
        ("checker".to_string(), DynamicImage::ImageRgba8(checker)),
        ("green".to_string(), solid(5, 11, [0, 200, 0, 255])),
        ("dot".to_string(), solid(1, 1, [10, 10, 10, 128])),
    ];

    let mut prepared = HashMap::new();
    let mut sizes = Vec::new();
    for (key, img) in &images {
        let p = PreparedSprite::new(img, cfg.trim);
        sizes.push((key.clone(), p.source.w, p.source.h));
        prepared.insert(key.clone(), p);
    }
    let layout = pack_layout(sizes, &cfg).expect("layout");
    let (mut atlas, regions) = compose_atlas(&layout, &prepared);
    assert_eq!(regions, sprite_regions(&layout.placements, cfg.margin));
    let staged = bleed_layout(&mut atlas, &layout, &cfg).expect("bleed");

    let inputs = images.into_iter().map(|(key, image)| InputSprite { key, image }).collect();
    let out = combine_sprites(inputs, &cfg).expect("combine");

    assert_eq!(out.atlas, atlas);
    assert_eq!(out.color_map, staged.color_map);
    assert_eq!(out.bleed_stats, staged.stats);
}

#[test]
fn identical_sprites_share_one_slot() {
    let red = [255, 0, 0, 255];
    let mut padded = RgbaImage::new(10, 10);
    for y in 2..8 {
        for x in 2..8 {
            padded.put_pixel(x, y, Rgba(red));
        }
    }
    let cfg = CombineConfig::builder()
        .with_canvas(64, 64)
        .margin(2)
        .trim(true)
        .build();
    let out = combine_sprites(
        vec![
            sprite("bullet", solid(6, 6, red)),
            sprite("bullet_copy", solid(6, 6, red)),
            sprite("bullet_padded", DynamicImage::ImageRgba8(padded)),
            sprite("bullet_blue", solid(6, 6, [0, 0, 255, 255])),
        ],
        &cfg,
    )
    .expect("combine");

    assert_eq!(out.frames.len(), 4);
    assert!(out.dropped.is_empty());
    assert_eq!(out.layout_stats.placed, 2);
    assert_eq!(out.bleed_stats.regions, 2);

    let by_key = |k: &str| out.frames.iter().find(|f| f.key == k).expect("frame");
    let first = by_key("bullet");
    assert_eq!(first.alias_of, None);
    for alias in ["bullet_copy", "bullet_padded"] {
        let f = by_key(alias);
        assert_eq!(f.frame, first.frame);
        assert_eq!(f.alias_of.as_deref(), Some("bullet"));
    }
    // trimming still reports each alias against its own source image
    assert_eq!(by_key("bullet_padded").source, Rect::new(2, 2, 6, 6));
    assert_eq!(by_key("bullet_padded").source_size, (10, 10));
    assert_eq!(by_key("bullet_blue").alias_of, None);
    assert_ne!(by_key("bullet_blue").frame, first.frame);
}

#[test]
fn aliases_follow_their_slot_when_dropped() {
    let cfg = CombineConfig::builder().with_canvas(16, 16).margin(0).build();
    let out = combine_sprites(
        vec![
            sprite("a", solid(10, 10, [1, 1, 1, 255])),
            sprite("b", solid(10, 10, [2, 2, 2, 255])),
            sprite("b2", solid(10, 10, [2, 2, 2, 255])),
        ],
        &cfg,
    )
    .expect("combine");

    assert_eq!(out.frames.len() + out.dropped.len(), 3);
    let b_placed = out.frames.iter().any(|f| f.key == "b");
    let b2_placed = out.frames.iter().any(|f| f.key == "b2");
    assert_eq!(b_placed, b2_placed);
}

#[test]
fn alias_detection_compares_placed_pixels() {
    let order: Vec<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
    let mut sprites = HashMap::new();
    sprites.insert("x".to_string(), PreparedSprite::new(&solid(3, 2, [5, 5, 5, 255]), false));
    sprites.insert("y".to_string(), PreparedSprite::new(&solid(2, 3, [5, 5, 5, 255]), false));
    sprites.insert("z".to_string(), PreparedSprite::new(&solid(3, 2, [5, 5, 5, 255]), false));

    let aliases = find_aliases(&order, &sprites);
    assert_eq!(aliases.len(), 1);
    assert_eq!(aliases.get("z").map(String::as_str), Some("x"));
    assert!(sprites["x"].same_pixels(&sprites["z"]));
    assert!(!sprites["x"].same_pixels(&sprites["y"]));
    assert_eq!(sprites["x"].content_hash(), sprites["z"].content_hash());
}
