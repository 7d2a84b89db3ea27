//! Integration tests: in-memory images -> CSV grids -> image pool.

use std::fs;

use depthforest_image::{DepthImage, ImageError, ImagePool, ImageReader, PixelInfo, write_image};
use tempfile::TempDir;

fn checkerboard(width: usize, height: usize, near: f64) -> DepthImage {
    let mut depth = Vec::with_capacity(width * height);
    let mut labels = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let on = (x + y) % 2 == 0;
            depth.push(if on { near } else { near * 3.5 });
            labels.push(if x == 0 { None } else { Some(usize::from(on)) });
        }
    }
    DepthImage::new(width, height, depth, labels).unwrap()
}

#[test]
fn written_images_load_back_identically() {
    let dir = TempDir::new().unwrap();
    let images = vec![checkerboard(5, 4, 0.75), checkerboard(3, 7, 1.1)];
    for (id, img) in images.iter().enumerate() {
        write_image(dir.path(), id, img).unwrap();
    }

    let pool = ImagePool::load(dir.path(), 2).unwrap();
    assert_eq!(pool.len(), 2);
    for (loaded, original) in pool.iter().zip(&images) {
        assert_eq!(loaded, original);
    }
    assert_eq!(pool.get(0).label_at(PixelInfo::new(0, 0)), None);
    assert_eq!(pool.get(0).labeled_count(), 4 * 4);
}

#[test]
fn hand_written_grids_parse() {
    let dir = TempDir::new().unwrap();
    let reader = ImageReader::new(dir.path());
    fs::write(reader.depth_path(0), "1.0, 2.5,3\n4,5,6\n").unwrap();
    fs::write(reader.label_path(0), "0,,-1\n1,2,0\n").unwrap();

    let img = reader.read(0).unwrap();
    assert_eq!((img.width(), img.height()), (3, 2));
    assert_eq!(img.depth_at(PixelInfo::new(1, 0)), Some(2.5));
    assert_eq!(img.label_at(PixelInfo::new(1, 0)), None);
    assert_eq!(img.label_at(PixelInfo::new(2, 0)), None);
    assert_eq!(img.label_at(PixelInfo::new(1, 1)), Some(2));
    assert_eq!(img.max_label(), Some(2));
}

#[test]
fn label_grid_must_match_depth_grid() {
    let dir = TempDir::new().unwrap();
    let reader = ImageReader::new(dir.path());
    fs::write(reader.depth_path(0), "1,2\n3,4\n").unwrap();
    fs::write(reader.label_path(0), "0,1,0\n1,0,1\n").unwrap();
    assert!(matches!(
        reader.read(0),
        Err(ImageError::DimensionMismatch { .. })
    ));
}

#[test]
fn missing_image_stops_pool_load() {
    let dir = TempDir::new().unwrap();
    write_image(dir.path(), 0, &checkerboard(2, 2, 1.0)).unwrap();
    assert!(matches!(
        ImagePool::load(dir.path(), 2),
        Err(ImageError::FileNotFound { .. })
    ));
}
