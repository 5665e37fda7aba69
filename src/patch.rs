use ndarray::s;

use crate::grid::ImageGrid;

pub const PATCH_SIZE: usize = 9;
pub const HALF_PATCH_SIZE: i64 = 4;
pub const PIXEL_COUNT: usize = PATCH_SIZE * PATCH_SIZE;

/// A 9x9 intensity window, stored row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Patch([u8; PIXEL_COUNT]);

impl Patch {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// The patch footprint leaves the source grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutOfBounds {
    pub cx: i64,
    pub cy: i64,
}

fn is_inside(x: i64, y: i64, grid: &ImageGrid) -> bool {
    x >= 0 && x < grid.cols() as i64 && y >= 0 && y < grid.rows() as i64
}

/// Copies the window centered on `(cx, cy)`. Fails if either corner is outside the grid.
pub fn extract_patch(grid: &ImageGrid, cx: i64, cy: i64) -> Result<Patch, OutOfBounds> {
    let (left, top) = (cx - HALF_PATCH_SIZE, cy - HALF_PATCH_SIZE);
    let (right, bottom) = (cx + HALF_PATCH_SIZE, cy + HALF_PATCH_SIZE);
    if !is_inside(left, top, grid) || !is_inside(right, bottom, grid) {
        return Err(OutOfBounds { cx, cy });
    }
    let (x0, y0) = (left as usize, top as usize);
    let window = grid
        .view()
        .slice_move(s![y0..y0 + PATCH_SIZE, x0..x0 + PATCH_SIZE]);
    let mut data = [0u8; PIXEL_COUNT];
    for (dst, src) in data.iter_mut().zip(window.iter()) {
        *dst = *src;
    }
    Ok(Patch(data))
}
