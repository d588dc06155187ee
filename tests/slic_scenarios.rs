//! Superpixel clustering on synthetic images.

mod common;

use common::{RED, TEAL, checkerboard, init_logging, solid};
use texgz::slic::{Accumulation, ColorDistance, Slic, SlicParams};

fn params() -> SlicParams {
    SlicParams {
        size: 16,
        compactness: 10.0,
        neighborhood: 3,
        recenter: true,
        distance: ColorDistance::Euclidean,
        accumulation: Accumulation::Incremental,
    }
}

#[test]
fn solid_image_clusters_to_its_color() {
    init_logging();
    let tex = solid(64, 64, TEAL);
    for steps in [1, 3, 10] {
        let mut slic = Slic::new(&tex, params()).unwrap();
        slic.solve(steps);
        assert_eq!(slic.k(), 4);
        assert_eq!(slic.steps(), steps);
        assert!(slic.clusters().iter().all(|c| c.pixel == TEAL));
        assert_eq!(slic.output().unwrap(), tex);
        assert_eq!(slic.output_mean().unwrap(), tex);
    }
}

#[test]
fn solid_image_has_flat_deviation() {
    let tex = solid(64, 64, RED);
    let mut slic = Slic::new(&tex, params()).unwrap();
    slic.solve(2);
    let dev = slic.output_stddev().unwrap();
    assert!(dev.pixels().chunks(4).all(|p| p == [0, 0, 0, 255]));
}

#[test]
fn aligned_checkerboard_keeps_cell_colors() {
    let tex = checkerboard(64, 16);
    let mut slic = Slic::new(
        &tex,
        SlicParams {
            accumulation: Accumulation::Assigned,
            ..params()
        },
    )
    .unwrap();
    slic.solve(5);
    let mean = slic.output_mean().unwrap();
    for y in 0..64 {
        for x in 0..64 {
            let p = mean.pixel(x, y);
            assert!(p == RED || p == TEAL, "({x},{y}) = {p:?}");
        }
    }
}

#[test]
fn every_pixel_belongs_to_a_cluster() {
    let tex = checkerboard(32, 4);
    let mut slic = Slic::new(
        &tex,
        SlicParams {
            size: 8,
            ..params()
        },
    )
    .unwrap();
    slic.step();
    for y in 0..32 {
        for x in 0..32 {
            let owner = slic.owner(x, y).expect("assigned");
            assert!(owner < slic.clusters().len());
        }
    }
}

#[test]
fn centers_hold_their_seed_without_recenter() {
    let tex = checkerboard(64, 16);
    let mut slic = Slic::new(
        &tex,
        SlicParams {
            recenter: false,
            ..params()
        },
    )
    .unwrap();
    let seeded = slic.clusters().to_vec();
    slic.solve(3);
    for (now, before) in slic.clusters().iter().zip(&seeded) {
        assert_eq!((now.x, now.y), (before.x, before.y));
    }
    // the first cluster's window spans both cell colors
    assert_ne!(slic.clusters()[0].pixel, seeded[0].pixel);
}

/// 4×4 texture, black on the left and blue on the right.
fn blue_edge() -> texgz::texture::Texture {
    let mut tex = solid(4, 4, [0, 0, 0, 255]);
    for y in 0..4 {
        for x in 2..4 {
            tex.set_pixel(x, y, &[0, 0, 255, 255]);
        }
    }
    tex
}

fn tiny(distance: ColorDistance) -> SlicParams {
    SlicParams {
        size: 2,
        compactness: 0.0,
        neighborhood: 1,
        distance,
        ..params()
    }
}

#[test]
fn legacy_distance_merges_a_blue_only_edge() {
    let tex = blue_edge();

    let mut legacy = Slic::new(&tex, tiny(ColorDistance::Legacy)).unwrap();
    legacy.step();
    let mut euclidean = Slic::new(&tex, tiny(ColorDistance::Euclidean)).unwrap();
    euclidean.step();

    for y in 0..4 {
        for x in 0..4 {
            assert_eq!(legacy.owner(x, y), Some(0), "legacy ({x},{y})");
            let side = if x < 2 { 0 } else { 1 };
            assert_eq!(euclidean.owner(x, y), Some(side), "euclidean ({x},{y})");
        }
    }
}
