use image::GrayImage;
use ndarray::{Array2, ArrayView2};
use std::path::PathBuf;

use crate::error::{DatasetError, DatasetResult};

/// Immutable 8-bit grayscale grid indexed as `(row, col)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageGrid {
    pixels: Array2<u8>,
}

impl ImageGrid {
    pub fn new(pixels: Array2<u8>) -> Self {
        ImageGrid { pixels }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        ImageGrid::new(Array2::zeros((rows, cols)))
    }

    pub fn from_gray(img: &GrayImage) -> Self {
        let rows = img.height() as usize;
        let cols = img.width() as usize;
        let mut pixels = Array2::<u8>::zeros((rows, cols));
        for (x, y, pixel) in img.enumerate_pixels() {
            let image::Luma(data) = *pixel;
            pixels[(y as usize, x as usize)] = data[0];
        }
        ImageGrid { pixels }
    }

    pub fn rows(&self) -> usize {
        self.pixels.nrows()
    }

    pub fn cols(&self) -> usize {
        self.pixels.ncols()
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    /// Intensity at column `x`, row `y`. Panics outside the grid.
    pub fn at(&self, x: usize, y: usize) -> u8 {
        self.pixels[(y, x)]
    }

    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.pixels.view()
    }
}

/// Co-registered left, right and disparity grids of one stereo frame.
#[derive(Clone, Debug)]
pub struct ImageTriple {
    pub left: ImageGrid,
    pub right: ImageGrid,
    pub disparity: ImageGrid,
}

impl ImageTriple {
    /// Builds a triple, rejecting left/right grids whose extent differs from the disparity grid.
    pub fn new(
        left: ImageGrid,
        right: ImageGrid,
        disparity: ImageGrid,
        paths: &TriplePaths,
    ) -> DatasetResult<Self> {
        let expected = disparity.dims();
        for (grid, path) in [(&left, &paths.left), (&right, &paths.right)] {
            if grid.dims() != expected {
                return Err(DatasetError::DimensionMismatch {
                    path: path.clone(),
                    expected,
                    found: grid.dims(),
                });
            }
        }
        Ok(ImageTriple {
            left,
            right,
            disparity,
        })
    }
}

/// File locations of one triple.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriplePaths {
    pub left: PathBuf,
    pub right: PathBuf,
    pub disparity: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn paths() -> TriplePaths {
        TriplePaths {
            left: PathBuf::from("l.png"),
            right: PathBuf::from("r.png"),
            disparity: PathBuf::from("d.png"),
        }
    }

    #[test]
    fn from_gray_keeps_row_major_layout() {
        let mut img = GrayImage::new(3, 2);
        img.put_pixel(2, 1, Luma([77]));
        img.put_pixel(0, 1, Luma([5]));
        let grid = ImageGrid::from_gray(&img);
        assert_eq!(grid.dims(), (2, 3));
        assert_eq!(grid.at(2, 1), 77);
        assert_eq!(grid.at(0, 1), 5);
        assert_eq!(grid.at(1, 0), 0);
    }

    #[test]
    fn triple_rejects_mismatched_right_grid() {
        let err = ImageTriple::new(
            ImageGrid::zeros(10, 12),
            ImageGrid::zeros(10, 11),
            ImageGrid::zeros(10, 12),
            &paths(),
        )
        .unwrap_err();
        match err {
            DatasetError::DimensionMismatch {
                path,
                expected,
                found,
            } => {
                assert_eq!(path, PathBuf::from("r.png"));
                assert_eq!(expected, (10, 12));
                assert_eq!(found, (10, 11));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
