use crate::foundation::error::{BrotError, BrotResult};

/// Floating-point width used for every coordinate and iteration in a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// IEEE-754 binary32.
    #[default]
    Single,
    /// IEEE-754 binary64.
    Double,
}

impl Precision {
    /// The other precision mode.
    pub fn toggled(self) -> Self {
        match self {
            Self::Single => Self::Double,
            Self::Double => Self::Single,
        }
    }
}

/// Affine map from a pixel coordinate on one axis to the complex plane: `p * scale + offset`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AxisMap {
    /// Plane units per pixel (`A`).
    pub scale: f64,
    /// Plane coordinate of pixel 0 (`B`).
    pub offset: f64,
}

impl AxisMap {
    pub fn new(scale: f64, offset: f64) -> Self {
        Self { scale, offset }
    }
}

/// Immutable per-frame snapshot consumed read-only by the kernel.
///
/// Built fresh every frame, usually by [`ViewState::frame_params`](crate::ViewState::frame_params).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameParams {
    /// Real axis mapping (pixel x).
    pub x: AxisMap,
    /// Imaginary axis mapping (pixel y).
    pub y: AxisMap,
    /// Iteration cap `N`. Points that survive `N` steps are treated as members of the set.
    pub iterations: u32,
    /// Precision used for the whole frame.
    pub precision: Precision,
}

/// Caller-owned row-major RGBA8 target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a zeroed buffer of `width * height` pixels.
    pub fn new(width: u32, height: u32) -> BrotResult<Self> {
        let len = rgba_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    /// RGBA value at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub(crate) fn validate(&self) -> BrotResult<()> {
        let expected = rgba_len(self.width, self.height)?;
        if self.data.len() != expected {
            return Err(BrotError::validation(format!(
                "pixel buffer holds {} bytes, expected {expected} for {}x{}",
                self.data.len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }
}

pub(crate) fn rgba_len(width: u32, height: u32) -> BrotResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| BrotError::validation("pixel buffer size overflow"))
}
