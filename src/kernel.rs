//! Escape-time kernel with 2x2 supersampling.
//!
//! The four subsamples of a pixel run as four lanes of one iteration loop. Every lane performs the
//! same arithmetic in the same order as [`escape_time`], so the lane form is a pure scheduling
//! choice and produces bit-identical counts.

use std::ops::{Add, Mul, Sub};

use crate::{
    foundation::core::{FrameParams, Precision},
    palette::{self, Palette, Rgb},
    tile::Tile,
};

/// Subsample offsets within a pixel cell, in pixel units.
pub const SUBSAMPLE_OFFSETS: [(f64, f64); 4] = [(0.0, 0.0), (0.5, 0.0), (0.0, 0.5), (0.5, 0.5)];

/// Squared escape radius.
pub const ESCAPE_RADIUS_SQ: f64 = 4.0;

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Floating-point type the kernel can iterate in.
pub trait Real:
    sealed::Sealed
    + Copy
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
{
    const ZERO: Self;

    fn from_f64(v: f64) -> Self;
    fn from_u32(v: u32) -> Self;
}

impl Real for f32 {
    const ZERO: Self = 0.0;

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn from_u32(v: u32) -> Self {
        v as f32
    }
}

impl Real for f64 {
    const ZERO: Self = 0.0;

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn from_u32(v: u32) -> Self {
        f64::from(v)
    }
}

#[inline(always)]
fn step<T: Real>(zx: T, zy: T, cx: T, cy: T) -> (T, T) {
    (zx * zx - zy * zy + cx, (zx + zx) * zy + cy)
}

#[inline(always)]
fn escaped<T: Real>(zx: T, zy: T) -> bool {
    zx * zx + zy * zy > T::from_f64(ESCAPE_RADIUS_SQ)
}

/// Iterate `z <- z^2 + c` from zero.
///
/// Returns the 1-based step at which `|z|^2 > 4` first held, or `max_iterations` if it never did.
pub fn escape_time<T: Real>(cx: T, cy: T, max_iterations: u32) -> u32 {
    let (mut zx, mut zy) = (T::ZERO, T::ZERO);
    for i in 1..=max_iterations {
        (zx, zy) = step(zx, zy, cx, cy);
        if escaped(zx, zy) {
            return i;
        }
    }
    max_iterations
}

/// [`escape_time`] for four points at once.
pub fn escape_time_x4<T: Real>(c: [(T, T); 4], max_iterations: u32) -> [u32; 4] {
    let mut zx = [T::ZERO; 4];
    let mut zy = [T::ZERO; 4];
    let mut out = [max_iterations; 4];
    let mut active = [true; 4];
    let mut remaining = 4;

    for i in 1..=max_iterations {
        for lane in 0..4 {
            if !active[lane] {
                continue;
            }
            (zx[lane], zy[lane]) = step(zx[lane], zy[lane], c[lane].0, c[lane].1);
            if escaped(zx[lane], zy[lane]) {
                out[lane] = i;
                active[lane] = false;
                remaining -= 1;
            }
        }
        if remaining == 0 {
            break;
        }
    }
    out
}

/// Complex-plane coordinates of the four subsamples of pixel `(px, py)`.
#[inline]
pub fn subsample_coords<T: Real>(px: u32, py: u32, params: &FrameParams) -> [(T, T); 4] {
    let ax = T::from_f64(params.x.scale);
    let bx = T::from_f64(params.x.offset);
    let ay = T::from_f64(params.y.scale);
    let by = T::from_f64(params.y.offset);
    let fx = T::from_u32(px);
    let fy = T::from_u32(py);
    SUBSAMPLE_OFFSETS.map(|(ox, oy)| {
        (
            (fx + T::from_f64(ox)) * ax + bx,
            (fy + T::from_f64(oy)) * ay + by,
        )
    })
}

fn shade_pixel_in<T: Real>(
    px: u32,
    py: u32,
    params: &FrameParams,
    palette: &Palette,
) -> [u8; 4] {
    let counts = escape_time_x4(subsample_coords::<T>(px, py, params), params.iterations);
    let samples: [Rgb; 4] = counts.map(|k| palette.color(k, params.iterations));
    palette::average_rgba8(&samples)
}

/// Supersampled RGBA8 color of one pixel at the frame's precision.
pub fn shade_pixel(px: u32, py: u32, params: &FrameParams, palette: &Palette) -> [u8; 4] {
    match params.precision {
        Precision::Single => shade_pixel_in::<f32>(px, py, params, palette),
        Precision::Double => shade_pixel_in::<f64>(px, py, params, palette),
    }
}

fn shade_tile_in<T: Real>(tile: &Tile, params: &FrameParams, palette: &Palette, out: &mut [u8]) {
    let row_bytes = tile.width() as usize * 4;
    if row_bytes == 0 {
        return;
    }
    for (row, py) in out.chunks_exact_mut(row_bytes).zip(tile.y.clone()) {
        for (px_out, px) in row.chunks_exact_mut(4).zip(tile.x.clone()) {
            px_out.copy_from_slice(&shade_pixel_in::<T>(px, py, params, palette));
        }
    }
}

/// Shade every pixel of `tile` into `out`, tightly packed with a stride of `tile.width() * 4`.
///
/// The precision branch is taken once per tile, not per pixel.
pub fn shade_tile(tile: &Tile, params: &FrameParams, palette: &Palette, out: &mut [u8]) {
    match params.precision {
        Precision::Single => shade_tile_in::<f32>(tile, params, palette, out),
        Precision::Double => shade_tile_in::<f64>(tile, params, palette, out),
    }
}

fn reference_pixel_in<T: Real>(px: u32, py: u32, params: &FrameParams) -> [u8; 4] {
    let mut samples = [palette::BLACK; 4];
    for (sample, (cx, cy)) in samples
        .iter_mut()
        .zip(subsample_coords::<T>(px, py, params))
    {
        let k = escape_time(cx, cy, params.iterations);
        if k < params.iterations {
            *sample = palette::hue(k);
        }
    }
    palette::average_rgba8(&samples)
}

/// Unoptimized scalar rendition of [`shade_pixel`]: one loop per subsample and the closed-form
/// hue instead of the palette table.
pub fn reference_pixel(px: u32, py: u32, params: &FrameParams) -> [u8; 4] {
    match params.precision {
        Precision::Single => reference_pixel_in::<f32>(px, py, params),
        Precision::Double => reference_pixel_in::<f64>(px, py, params),
    }
}
