//! End-to-end integration tests: CSV images -> train -> tree files -> reload -> evaluate.

use std::fs;
use std::path::Path;

use depthforest_image::{DepthImage, write_image};
use depthforest_rf::{NumRange, RandomForest, RfError, TrainingParams, tree_file_name};
use tempfile::TempDir;

const WIDTH: usize = 61;
const HEIGHT: usize = 31;

/// Horizontal ramp with a labeled centre window, rising or falling in x.
fn ramp(rising: bool, label: usize) -> DepthImage {
    let mut depth = Vec::with_capacity(WIDTH * HEIGHT);
    let mut labels = Vec::with_capacity(WIDTH * HEIGHT);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let step = if rising { x } else { WIDTH - 1 - x };
            depth.push(2.0 + 0.01 * step as f64);
            let in_window = (20..=40).contains(&x) && (10..=20).contains(&y);
            labels.push(in_window.then_some(label));
        }
    }
    DepthImage::new(WIDTH, HEIGHT, depth, labels).unwrap()
}

fn write_images(dir: &Path) {
    write_image(dir, 0, &ramp(true, 0)).unwrap();
    write_image(dir, 1, &ramp(false, 1)).unwrap();
}

fn params(img_dir: &Path, tree_num: usize) -> TrainingParams {
    TrainingParams::new(tree_num)
        .unwrap()
        .with_label_num(2)
        .with_img_num(2)
        .with_train_img_num(2)
        .with_img_dir(img_dir)
        .with_sample_pixel_num(1000)
        .with_max_depth(6)
        .with_offset_num(20)
        .with_threshold_num(1)
        .with_offset_range(NumRange::new(-10.0, 10.0))
        .with_threshold_range(NumRange::new(0.0, 0.0))
        .with_seed(7)
}

#[test]
fn train_save_reload_evaluate() {
    let images = TempDir::new().unwrap();
    write_images(images.path());

    let cfg = params(images.path(), 4);
    let forest = RandomForest::train(&cfg).unwrap();
    assert_eq!(forest.n_trees(), 4);
    for summary in forest.tree_summaries() {
        assert_eq!(summary.n_leaves, 2);
    }

    let out = TempDir::new().unwrap();
    let forest_dir = out.path().join("forest");
    forest.write_forest(&forest_dir).unwrap();
    cfg.save_json(forest_dir.join("params.json")).unwrap();

    let reloaded_cfg = TrainingParams::load_json(forest_dir.join("params.json")).unwrap();
    assert_eq!(reloaded_cfg, cfg);

    let loaded = RandomForest::load_forest(cfg.tree_num(), cfg.label_num(), &forest_dir).unwrap();
    assert_eq!(loaded.trees(), forest.trees());

    for image in [ramp(true, 0), ramp(false, 1)] {
        for (pixel, _) in image.labeled_pixels() {
            assert_eq!(loaded.predict(&image, pixel), forest.predict(&image, pixel));
        }
        assert_eq!(loaded.test_classification(&image).unwrap(), 1.0);
        let cm = loaded.evaluate_image(&image).unwrap();
        assert_eq!(cm.accuracy(), 1.0);
    }
}

#[test]
fn training_from_disk_is_reproducible() {
    let images = TempDir::new().unwrap();
    write_images(images.path());
    let cfg = params(images.path(), 3).with_threshold_num(2);

    let a = RandomForest::train(&cfg).unwrap();
    let b = RandomForest::train(&cfg).unwrap();

    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    a.write_forest(dir_a.path()).unwrap();
    b.write_forest(dir_b.path()).unwrap();
    for i in 0..3 {
        let name = tree_file_name(i);
        assert_eq!(
            fs::read_to_string(dir_a.path().join(&name)).unwrap(),
            fs::read_to_string(dir_b.path().join(&name)).unwrap()
        );
    }
}

#[test]
fn missing_image_fails_training() {
    let images = TempDir::new().unwrap();
    write_image(images.path(), 0, &ramp(true, 0)).unwrap();
    let err = RandomForest::train(&params(images.path(), 1)).unwrap_err();
    assert!(matches!(err, RfError::Image(_)));
}

#[test]
fn corrupted_tree_file_fails_load() {
    let images = TempDir::new().unwrap();
    write_images(images.path());
    let forest = RandomForest::train(&params(images.path(), 2)).unwrap();

    let out = TempDir::new().unwrap();
    forest.write_forest(out.path()).unwrap();
    let path = out.path().join(tree_file_name(1));
    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replacen("L ", "Q ", 1)).unwrap();

    let err = RandomForest::load_forest(2, 2, out.path()).unwrap_err();
    assert!(matches!(err, RfError::MalformedTree { .. }));
}
