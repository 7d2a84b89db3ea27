//! In-memory pool of training images.

use std::path::Path;

use tracing::{info, instrument};

use crate::image::DepthImage;
use crate::reader::ImageReader;
use crate::ImageError;

/// Depth images indexed by image id.
///
/// Shared read-only by every tree during training.
#[derive(Debug, Clone, Default)]
pub struct ImagePool {
    images: Vec<DepthImage>,
}

impl ImagePool {
    /// Wrap already-decoded images. Image `i` gets id `i`.
    #[must_use]
    pub fn from_images(images: Vec<DepthImage>) -> Self {
        Self { images }
    }

    /// Load images `0..count` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::EmptyPool`] when `count` is zero, or the first
    /// [`ImageReader`] error encountered.
    #[instrument(fields(dir = %dir.display()))]
    pub fn load(dir: &Path, count: usize) -> Result<Self, ImageError> {
        if count == 0 {
            return Err(ImageError::EmptyPool);
        }
        let reader = ImageReader::new(dir);
        let images = (0..count)
            .map(|id| reader.read(id))
            .collect::<Result<Vec<_>, _>>()?;
        let labeled: usize = images.iter().map(DepthImage::labeled_count).sum();
        info!(n_images = images.len(), labeled_pixels = labeled, "image pool loaded");
        Ok(Self { images })
    }

    /// Image with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range; sample ids are produced by the pool
    /// itself, so an unknown id is a programming error.
    #[must_use]
    pub fn get(&self, id: usize) -> &DepthImage {
        &self.images[id]
    }

    /// Number of images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the pool holds no image.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Iterate over images in id order.
    pub fn iter(&self) -> impl Iterator<Item = &DepthImage> {
        self.images.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::ImagePool;
    use crate::reader::write_image;
    use crate::{DepthImage, ImageError};
    use tempfile::TempDir;

    fn tiny(depth: f64, label: usize) -> DepthImage {
        DepthImage::new(2, 1, vec![depth, depth], vec![Some(label), None]).unwrap()
    }

    #[test]
    fn load_reads_images_in_id_order() {
        let dir = TempDir::new().unwrap();
        write_image(dir.path(), 0, &tiny(1.0, 0)).unwrap();
        write_image(dir.path(), 1, &tiny(2.0, 1)).unwrap();
        let pool = ImagePool::load(dir.path(), 2).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(1), &tiny(2.0, 1));
    }

    #[test]
    fn load_fails_on_missing_image() {
        let dir = TempDir::new().unwrap();
        write_image(dir.path(), 0, &tiny(1.0, 0)).unwrap();
        let err = ImagePool::load(dir.path(), 2).unwrap_err();
        assert!(matches!(err, ImageError::FileNotFound { .. }));
    }

    #[test]
    fn load_zero_images_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            ImagePool::load(dir.path(), 0),
            Err(ImageError::EmptyPool)
        ));
    }
}
