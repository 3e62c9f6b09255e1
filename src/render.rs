use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    foundation::{
        core::{FrameParams, PixelBuffer},
        error::{BrotError, BrotResult},
    },
    kernel,
    palette::Palette,
    pool::{DispatchStats, WorkerPool, available_workers},
    tile::{DEFAULT_TILE_SIZE, TileGrid},
};

/// Renderer configuration.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderOpts {
    /// Worker threads; `None` uses the available hardware parallelism.
    pub workers: Option<usize>,
    pub tile_width: u32,
    pub tile_height: u32,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            workers: None,
            tile_width: DEFAULT_TILE_SIZE,
            tile_height: DEFAULT_TILE_SIZE,
        }
    }
}

impl RenderOpts {
    pub fn validate(&self) -> BrotResult<()> {
        if self.workers == Some(0) {
            return Err(BrotError::validation("'workers' must be >= 1 when set"));
        }
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(BrotError::validation("tile width and height must be >= 1"));
        }
        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(available_workers)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderStats {
    /// Tiles (jobs) in the frame.
    pub tiles: usize,
    pub dispatch: DispatchStats,
}

type TileSlot = Mutex<Vec<u8>>;

fn lock_slot(slot: &TileSlot) -> MutexGuard<'_, Vec<u8>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Parallel frame renderer: owns the worker pool for its whole lifetime.
///
/// Each job moves the scratch vector out of its own slot, shades the tile into it with no lock
/// held, and moves it back. Slots are disjoint by job index, so no two jobs touch the same memory.
/// Once the dispatch barrier releases, the tiles are copied into the caller's buffer.
pub struct FrameRenderer {
    opts: RenderOpts,
    pool: WorkerPool,
    palette: Arc<Palette>,
    slots: Arc<Vec<TileSlot>>,
}

impl FrameRenderer {
    /// Validate `opts` and start the worker pool.
    pub fn new(opts: RenderOpts) -> BrotResult<Self> {
        opts.validate()?;
        let pool = WorkerPool::new(opts.worker_count())?;
        Ok(Self {
            opts,
            pool,
            palette: Arc::new(Palette::hue_ramp()),
            slots: Arc::new(Vec::new()),
        })
    }

    pub fn opts(&self) -> &RenderOpts {
        &self.opts
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Fill `buffer` with the frame described by `params`. Blocks until every tile is written.
    #[tracing::instrument(
        skip(self, buffer, params),
        fields(width = buffer.width, height = buffer.height, iterations = params.iterations)
    )]
    pub fn compute_frame(
        &mut self,
        buffer: &mut PixelBuffer,
        params: &FrameParams,
    ) -> BrotResult<RenderStats> {
        buffer.validate()?;
        let grid = TileGrid::new(
            buffer.width,
            buffer.height,
            self.opts.tile_width,
            self.opts.tile_height,
        )?;
        let tiles = grid.job_count();
        self.ensure_slots(&grid);

        let slots = Arc::clone(&self.slots);
        let palette = Arc::clone(&self.palette);
        let params = *params;
        self.pool.configure(
            Arc::new(move |job: usize, _worker: usize| {
                let tile = grid.tile(job);
                let mut scratch = std::mem::take(&mut *lock_slot(&slots[job]));
                scratch.resize(tile.pixel_count() * 4, 0);
                kernel::shade_tile(&tile, &params, &palette, &mut scratch);
                *lock_slot(&slots[job]) = scratch;
            }),
            tiles,
        );

        let dispatch = self.pool.dispatch()?;
        blit_tiles(&grid, &self.slots, buffer);
        Ok(RenderStats { tiles, dispatch })
    }

    /// Stop and join the worker pool.
    pub fn shutdown(mut self) {
        self.pool.shutdown();
    }

    fn ensure_slots(&mut self, grid: &TileGrid) {
        let tiles = grid.job_count();
        if self.slots.len() != tiles {
            let cap = grid.max_tile_pixels() * 4;
            self.slots = Arc::new(
                (0..tiles)
                    .map(|_| Mutex::new(Vec::with_capacity(cap)))
                    .collect(),
            );
        }
    }
}

impl std::fmt::Debug for FrameRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRenderer")
            .field("opts", &self.opts)
            .field("pool", &self.pool)
            .finish()
    }
}

fn blit_tiles(grid: &TileGrid, slots: &[TileSlot], buffer: &mut PixelBuffer) {
    let stride = buffer.width as usize * 4;
    for (job, slot) in slots.iter().enumerate().take(grid.job_count()) {
        let tile = grid.tile(job);
        let row_bytes = tile.width() as usize * 4;
        if row_bytes == 0 {
            continue;
        }
        let scratch = lock_slot(slot);
        for (src, y) in scratch.chunks_exact(row_bytes).zip(tile.y.clone()) {
            let start = y as usize * stride + tile.x.start as usize * 4;
            buffer.data[start..start + row_bytes].copy_from_slice(src);
        }
    }
}

/// Single-threaded scalar rendering of the same frame. Slow; used to check the parallel path.
pub fn render_reference(buffer: &mut PixelBuffer, params: &FrameParams) -> BrotResult<()> {
    buffer.validate()?;
    let width = buffer.width;
    if width == 0 {
        return Ok(());
    }
    for (i, px) in buffer.data.chunks_exact_mut(4).enumerate() {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        px.copy_from_slice(&kernel::reference_pixel(x, y, params));
    }
    Ok(())
}
