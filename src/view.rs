use crate::foundation::core::{AxisMap, FrameParams, Precision};

/// Zoom change per [`ViewAction::ZoomIn`] / [`ViewAction::ZoomOut`], relative to current zoom.
pub const ZOOM_STEP: f64 = 0.05;
/// Pan distance per step, relative to zoom.
pub const PAN_STEP: f64 = 0.01;
pub const PAN_STEP_FAST: f64 = 0.1;
pub const ITERATION_STEP: u32 = 1;
pub const ITERATION_STEP_FAST: u32 = 10;

/// Navigation input, applied by the single owner of [`ViewState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewAction {
    ZoomIn,
    ZoomOut,
    /// `dx`/`dy` are directions in `{-1, 0, 1}`; positive y moves down the image.
    Pan {
        dx: i8,
        dy: i8,
        fast: bool,
    },
    MoreIterations {
        fast: bool,
    },
    FewerIterations {
        fast: bool,
    },
    TogglePrecision,
}

/// Mutable navigation state owned by the host's input thread.
///
/// The renderer never sees this directly; it receives an immutable [`FrameParams`] snapshot from
/// [`frame_params`](Self::frame_params) once per frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub center_x: f64,
    pub center_y: f64,
    /// The view spans `center +- 2 * zoom` along the shorter image axis.
    pub zoom: f64,
    pub iterations: u32,
    pub precision: Precision,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            zoom: 1.0,
            iterations: 100,
            precision: Precision::Single,
        }
    }
}

impl ViewState {
    pub fn apply(&mut self, action: ViewAction) {
        match action {
            ViewAction::ZoomIn => self.zoom -= ZOOM_STEP * self.zoom,
            ViewAction::ZoomOut => self.zoom += ZOOM_STEP * self.zoom,
            ViewAction::Pan { dx, dy, fast } => {
                let step = (if fast { PAN_STEP_FAST } else { PAN_STEP }) * self.zoom;
                self.center_x += f64::from(dx.signum()) * step;
                self.center_y += f64::from(dy.signum()) * step;
            }
            ViewAction::MoreIterations { fast } => {
                let step = if fast {
                    ITERATION_STEP_FAST
                } else {
                    ITERATION_STEP
                };
                self.iterations = self.iterations.saturating_add(step);
            }
            ViewAction::FewerIterations { fast } => {
                let step = if fast {
                    ITERATION_STEP_FAST
                } else {
                    ITERATION_STEP
                };
                // Only step down when the whole step fits.
                if self.iterations >= step {
                    self.iterations -= step;
                }
            }
            ViewAction::TogglePrecision => self.precision = self.precision.toggled(),
        }
    }

    /// Snapshot for a `width x height` frame.
    pub fn frame_params(&self, width: u32, height: u32) -> FrameParams {
        let short = width.min(height).max(1);
        let scale = 4.0 * self.zoom / f64::from(short);
        FrameParams {
            x: AxisMap::new(scale, self.center_x - scale * f64::from(width) * 0.5),
            y: AxisMap::new(scale, self.center_y - scale * f64::from(height) * 0.5),
            iterations: self.iterations,
            precision: self.precision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_steps_are_relative() {
        let mut v = ViewState::default();
        v.apply(ViewAction::ZoomIn);
        assert!((v.zoom - 0.95).abs() < 1e-12);
        v.apply(ViewAction::ZoomOut);
        assert!((v.zoom - 0.9975).abs() < 1e-12);
    }

    #[test]
    fn pan_scales_with_zoom_and_speed() {
        let mut v = ViewState {
            zoom: 2.0,
            ..ViewState::default()
        };
        v.apply(ViewAction::Pan {
            dx: 1,
            dy: -1,
            fast: false,
        });
        assert!((v.center_x - 0.02).abs() < 1e-12);
        assert!((v.center_y + 0.02).abs() < 1e-12);
        v.apply(ViewAction::Pan {
            dx: -1,
            dy: 0,
            fast: true,
        });
        assert!((v.center_x + 0.18).abs() < 1e-12);
    }

    #[test]
    fn iterations_never_underflow() {
        let mut v = ViewState {
            iterations: 12,
            ..ViewState::default()
        };
        v.apply(ViewAction::FewerIterations { fast: true });
        assert_eq!(v.iterations, 2);
        v.apply(ViewAction::FewerIterations { fast: true });
        assert_eq!(v.iterations, 2);
        v.apply(ViewAction::FewerIterations { fast: false });
        v.apply(ViewAction::FewerIterations { fast: false });
        v.apply(ViewAction::FewerIterations { fast: false });
        assert_eq!(v.iterations, 0);
        v.apply(ViewAction::MoreIterations { fast: true });
        v.apply(ViewAction::MoreIterations { fast: false });
        assert_eq!(v.iterations, 11);
    }

    #[test]
    fn precision_toggle() {
        let mut v = ViewState::default();
        v.apply(ViewAction::TogglePrecision);
        assert_eq!(v.precision, Precision::Double);
        assert_eq!(v.frame_params(4, 4).precision, Precision::Double);
    }

    #[test]
    fn frame_params_center_the_view() {
        let v = ViewState {
            center_x: -0.5,
            center_y: 0.25,
            ..ViewState::default()
        };
        let p = v.frame_params(200, 100);
        assert!((p.x.scale - 0.04).abs() < 1e-12);
        assert_eq!(p.x.scale, p.y.scale);
        // Image center maps to the view center.
        assert!((100.0 * p.x.scale + p.x.offset + 0.5).abs() < 1e-12);
        assert!((50.0 * p.y.scale + p.y.offset - 0.25).abs() < 1e-12);
        // Shorter axis spans 4 * zoom.
        assert!((100.0 * p.y.scale - 4.0).abs() < 1e-12);
    }

    #[test]
    fn view_state_json_fills_missing_fields() {
        let v: ViewState = serde_json::from_str(r#"{"zoom": 0.5, "precision": "double"}"#).unwrap();
        assert_eq!(v.zoom, 0.5);
        assert_eq!(v.precision, Precision::Double);
        assert_eq!(v.iterations, 100);
    }
}
