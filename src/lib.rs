//! brotpool renders the Mandelbrot set on the CPU.
//!
//! A fixed set of worker threads is created once and driven through a barrier-dispatch cycle per
//! frame: the frame is cut into tiles, workers claim tile indices from a shared atomic counter,
//! and [`FrameRenderer::compute_frame`] returns only after the last tile is done.
//!
//! - [`ViewState`] owns navigation and produces an immutable [`FrameParams`] per frame.
//! - [`FrameRenderer`] fills a caller-owned [`PixelBuffer`].
//! - [`WorkerPool`] is usable on its own for any write-disjoint indexed workload.
#![forbid(unsafe_code)]

mod foundation;

pub mod kernel;
pub mod palette;
pub mod pool;
pub mod render;
pub mod tile;
pub mod view;

pub use crate::foundation::core::{AxisMap, FrameParams, PixelBuffer, Precision};
pub use crate::foundation::error::{BrotError, BrotResult, PoolError};
pub use crate::palette::Palette;
pub use crate::pool::{DispatchStats, JobFn, WorkerPool, available_workers};
pub use crate::render::{FrameRenderer, RenderOpts, RenderStats, render_reference};
pub use crate::tile::{Tile, TileGrid};
pub use crate::view::{ViewAction, ViewState};
