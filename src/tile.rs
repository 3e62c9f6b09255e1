use std::ops::Range;

use crate::foundation::error::{BrotError, BrotResult};

/// Default tile edge in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 32;

/// Rectangular pixel region assigned to one job, already clipped to the image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    pub x: Range<u32>,
    pub y: Range<u32>,
}

impl Tile {
    pub fn width(&self) -> u32 {
        self.x.end - self.x.start
    }

    pub fn height(&self) -> u32 {
        self.y.end - self.y.start
    }

    pub fn pixel_count(&self) -> usize {
        (self.width() as usize) * (self.height() as usize)
    }
}

/// Maps flat job indices to tiles, row by row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGrid {
    image_width: u32,
    image_height: u32,
    tile_width: u32,
    tile_height: u32,
    tiles_per_row: u32,
    tiles_per_col: u32,
}

impl TileGrid {
    pub fn new(
        image_width: u32,
        image_height: u32,
        tile_width: u32,
        tile_height: u32,
    ) -> BrotResult<Self> {
        if tile_width == 0 || tile_height == 0 {
            return Err(BrotError::validation("tile width and height must be >= 1"));
        }
        Ok(Self {
            image_width,
            image_height,
            tile_width,
            tile_height,
            tiles_per_row: image_width.div_ceil(tile_width),
            tiles_per_col: image_height.div_ceil(tile_height),
        })
    }

    pub fn tiles_per_row(&self) -> u32 {
        self.tiles_per_row
    }

    /// Total number of jobs needed to cover the image.
    pub fn job_count(&self) -> usize {
        (self.tiles_per_row as usize) * (self.tiles_per_col as usize)
    }

    /// Unclipped top-left pixel of tile `index`.
    pub fn origin(&self, index: usize) -> (u32, u32) {
        let per_row = self.tiles_per_row.max(1) as usize;
        let col = (index % per_row) as u32;
        let row = (index / per_row) as u32;
        (
            col.saturating_mul(self.tile_width),
            row.saturating_mul(self.tile_height),
        )
    }

    /// Tile `index`, clipped to the image bounds.
    ///
    /// Indices past [`job_count`](Self::job_count) yield an empty tile.
    pub fn tile(&self, index: usize) -> Tile {
        let (x0, y0) = self.origin(index);
        let x0 = x0.min(self.image_width);
        let y0 = y0.min(self.image_height);
        Tile {
            x: x0..x0.saturating_add(self.tile_width).min(self.image_width),
            y: y0..y0.saturating_add(self.tile_height).min(self.image_height),
        }
    }

    /// Largest tile area, used to size per-job scratch.
    pub fn max_tile_pixels(&self) -> usize {
        (self.tile_width.min(self.image_width) as usize)
            * (self.tile_height.min(self.image_height) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_follows_row_major_order() {
        let grid = TileGrid::new(100, 50, 32, 16).unwrap();
        assert_eq!(grid.tiles_per_row(), 4);
        assert_eq!(grid.job_count(), 16);
        assert_eq!(grid.origin(0), (0, 0));
        assert_eq!(grid.origin(3), (96, 0));
        assert_eq!(grid.origin(4), (0, 16));
        assert_eq!(grid.origin(6), (64, 16));
    }

    #[test]
    fn edge_tiles_are_clipped() {
        let grid = TileGrid::new(100, 50, 32, 16).unwrap();
        let right = grid.tile(3);
        assert_eq!(right.x, 96..100);
        assert_eq!(right.width(), 4);

        let bottom_right = grid.tile(15);
        assert_eq!(bottom_right.x, 96..100);
        assert_eq!(bottom_right.y, 48..50);
        assert_eq!(bottom_right.pixel_count(), 8);
    }

    #[test]
    fn tiles_cover_every_pixel_exactly_once() {
        let (w, h) = (37u32, 23u32);
        let grid = TileGrid::new(w, h, 8, 5).unwrap();
        let mut hits = vec![0u8; (w * h) as usize];
        for i in 0..grid.job_count() {
            let t = grid.tile(i);
            for y in t.y.clone() {
                for x in t.x.clone() {
                    hits[(y * w + x) as usize] += 1;
                }
            }
        }
        assert!(hits.iter().all(|&n| n == 1));
    }

    #[test]
    fn empty_image_has_no_jobs() {
        let grid = TileGrid::new(0, 0, 16, 16).unwrap();
        assert_eq!(grid.job_count(), 0);
        assert_eq!(grid.tile(0).pixel_count(), 0);
    }

    #[test]
    fn max_tile_pixels_is_clipped_to_the_image() {
        assert_eq!(TileGrid::new(100, 100, 16, 8).unwrap().max_tile_pixels(), 128);
        assert_eq!(TileGrid::new(5, 3, 16, 8).unwrap().max_tile_pixels(), 15);
        assert_eq!(TileGrid::new(0, 0, 16, 8).unwrap().max_tile_pixels(), 0);
    }

    #[test]
    fn zero_tile_size_is_rejected() {
        assert!(TileGrid::new(10, 10, 0, 4).is_err());
        assert!(TileGrid::new(10, 10, 4, 0).is_err());
    }
}
