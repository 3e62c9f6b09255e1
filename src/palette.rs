/// Number of distinct hues; iteration counts wrap around modulo this.
pub const PALETTE_LEN: usize = 32;

/// Linear RGB in `[0, 1]`.
pub type Rgb = [f32; 3];

pub const BLACK: Rgb = [0.0, 0.0, 0.0];

/// Closed-form hue ramp for an escaped iteration count.
pub fn hue(iteration: u32) -> Rgb {
    let h = (iteration as usize % PALETTE_LEN) as f32 / PALETTE_LEN as f32;
    let h6 = h * 6.0;
    [
        ((h6 - 3.0).abs() - 1.0).clamp(0.0, 1.0),
        (2.0 - (h6 - 2.0).abs()).clamp(0.0, 1.0),
        (2.0 - (h6 - 4.0).abs()).clamp(0.0, 1.0),
    ]
}

/// Precomputed hue ramp. Entries equal [`hue`] exactly.
#[derive(Clone, Debug)]
pub struct Palette {
    table: [Rgb; PALETTE_LEN],
}

impl Default for Palette {
    fn default() -> Self {
        Self::hue_ramp()
    }
}

impl Palette {
    pub fn hue_ramp() -> Self {
        let mut table = [BLACK; PALETTE_LEN];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = hue(i as u32);
        }
        Self { table }
    }

    /// Color for a subsample that stopped at `iteration` under cap `max_iterations`.
    ///
    /// Points that never escaped (`iteration == max_iterations`) are black.
    #[inline]
    pub fn color(&self, iteration: u32, max_iterations: u32) -> Rgb {
        if iteration >= max_iterations {
            return BLACK;
        }
        self.table[iteration as usize % PALETTE_LEN]
    }
}

/// Per-channel mean of four subsample colors, quantized to opaque RGBA8.
#[inline]
pub fn average_rgba8(samples: &[Rgb; 4]) -> [u8; 4] {
    let mut out = [0, 0, 0, 255];
    for c in 0..3 {
        let sum = samples[0][c] + samples[1][c] + samples[2][c] + samples[3][c];
        out[c] = unit_to_u8(sum * 0.25);
    }
    out
}

#[inline]
pub fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
