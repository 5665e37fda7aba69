//! Filesystem collaborators: disparity-map discovery and grayscale decode.
use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, Luma};

use crate::config::DatasetConfig;
use crate::error::{DatasetError, DatasetResult};
use crate::grid::{ImageGrid, ImageTriple, TriplePaths};

/// Regular files in `dir` ending in `.extension`, sorted by file name.
pub fn list_disparity_maps(dir: &Path, extension: &str) -> DatasetResult<Vec<PathBuf>> {
    let io_error = |e| DatasetError::Io {
        path: dir.to_path_buf(),
        source: e,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        if !entry.file_type().map_err(io_error)?.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Left/right paths share the disparity map's file stem.
pub fn triple_paths(root: &Path, disparity: &Path, config: &DatasetConfig) -> TriplePaths {
    let stem = disparity
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    let mut name = stem;
    name.push(".");
    name.push(&config.extension);
    TriplePaths {
        left: root.join(&config.left_dir).join(&name),
        right: root.join(&config.right_dir).join(&name),
        disparity: disparity.to_path_buf(),
    }
}

fn open_image(path: &Path) -> DatasetResult<DynamicImage> {
    image::open(path).map_err(|e| DatasetError::ImageLoad {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn load_grid(path: &Path) -> DatasetResult<ImageGrid> {
    let img = open_image(path)?.into_luma8();
    Ok(ImageGrid::from_gray(&img))
}

/// Decodes a disparity map. 16-bit maps store `d * 256`, so the high byte is the whole-pixel
/// disparity.
pub fn load_disparity(path: &Path) -> DatasetResult<ImageGrid> {
    let img = match open_image(path)? {
        DynamicImage::ImageLuma16(buf) => GrayImage::from_fn(buf.width(), buf.height(), |x, y| {
            let Luma(data) = *buf.get_pixel(x, y);
            Luma([(data[0] >> 8) as u8])
        }),
        other => other.into_luma8(),
    };
    Ok(ImageGrid::from_gray(&img))
}

pub fn load_triple(paths: &TriplePaths) -> DatasetResult<ImageTriple> {
    let disparity = load_disparity(&paths.disparity)?;
    let left = load_grid(&paths.left)?;
    let right = load_grid(&paths.right)?;
    ImageTriple::new(left, right, disparity, paths)
}
