//! Synthetic depth images shared by unit tests.

use depthforest_image::{DepthImage, ImagePool};

use crate::config::{NumRange, TrainingParams};

pub(crate) const WIDTH: usize = 61;
pub(crate) const HEIGHT: usize = 31;

/// Whether `(x, y)` lies in the labeled centre window.
///
/// Probes from the window with offsets in [-10, 10] stay inside the image.
pub(crate) fn in_window(x: usize, y: usize) -> bool {
    (20..=40).contains(&x) && (10..=20).contains(&y)
}

/// Horizontal depth ramp around 2.3, rising left to right when `rising`.
///
/// With threshold 0, any offset pair whose rounded x-shifts differ sends
/// every rising pixel to one side and every falling pixel to the other.
pub(crate) fn ramp(rising: bool, label: impl Fn(usize, usize) -> usize) -> DepthImage {
    let mut depth = Vec::with_capacity(WIDTH * HEIGHT);
    let mut labels = Vec::with_capacity(WIDTH * HEIGHT);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let step = if rising { x } else { WIDTH - 1 - x };
            depth.push(2.0 + 0.01 * step as f64);
            labels.push(in_window(x, y).then(|| label(x, y)));
        }
    }
    DepthImage::new(WIDTH, HEIGHT, depth, labels).unwrap()
}

/// Image 0 rises and is all label 0; image 1 falls and is all label 1.
pub(crate) fn separable_pool() -> ImagePool {
    ImagePool::from_images(vec![ramp(true, |_, _| 0), ramp(false, |_, _| 1)])
}

/// Parameters matched to [`separable_pool`].
pub(crate) fn separable_params(tree_num: usize) -> TrainingParams {
    TrainingParams::new(tree_num)
        .unwrap()
        .with_label_num(2)
        .with_img_num(2)
        .with_train_img_num(2)
        .with_sample_pixel_num(60)
        .with_max_depth(8)
        .with_min_sample_count(1)
        .with_offset_num(20)
        .with_threshold_num(1)
        .with_offset_range(NumRange::new(-10.0, 10.0))
        .with_threshold_range(NumRange::new(0.0, 0.0))
        .with_seed(42)
}
