//! Depth images, pixel geometry, and the training-sample store for depthforest.

mod error;
mod geometry;
mod image;
mod pool;
mod reader;
mod train_data;

pub use error::ImageError;
pub use geometry::{Offset, PixelInfo};
pub use image::{BACKGROUND_DEPTH, DepthImage};
pub use pool::ImagePool;
pub use reader::{ImageReader, write_image};
pub use train_data::{Sample, TrainData};
