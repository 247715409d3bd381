//! Sliding-window minimum variance analysis over a series

use ndarray::{s, Array1, Array2, Array3, Axis};
use tracing::{debug, error, warn};

use super::minvar;
use crate::errors::{CotransError, Result};
use crate::series::Vector3Series;

/// Window settings for [`minvar_matrix_make`], all in seconds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowOptions {
    /// Window width; defaults to the whole analysed interval
    pub window: Option<f64>,
    /// Offset between consecutive window starts; `None` or negative means
    /// half a window, `0.0` means a single window
    pub slide: Option<f64>,
    /// First window start; defaults to the first timestamp
    pub start: Option<f64>,
    /// End of the analysed interval; defaults to the last timestamp
    pub stop: Option<f64>,
    /// Also return the eigenvalue series
    pub eigenvalues: bool,
    /// Also return the min/mid/max axis series
    pub axes: bool,
}

impl WindowOptions {
    /// Windows of `window` seconds overlapping by half
    pub fn with_window(window: f64) -> Self {
        WindowOptions {
            window: Some(window),
            ..Default::default()
        }
    }

    pub fn slide(mut self, slide: f64) -> Self {
        self.slide = Some(slide);
        self
    }

    pub fn between(mut self, start: f64, stop: f64) -> Self {
        self.start = Some(start);
        self.stop = Some(stop);
        self
    }

    pub fn with_eigenvalues(mut self) -> Self {
        self.eigenvalues = true;
        self
    }

    pub fn with_axes(mut self) -> Self {
        self.axes = true;
        self
    }
}

/// Per-window minimum variance output
///
/// Slots whose window was empty or failed to decompose hold NaN.
#[derive(Debug, Clone)]
pub struct MinvarWindows {
    /// Window midpoints
    pub times: Array1<f64>,
    /// Matrix per window whose columns are the max, mid and min axes
    pub matrices: Array3<f64>,
    /// Eigenvalues per window, when requested
    pub eigenvalues: Option<Array2<f64>>,
    pub min_axis: Option<Array2<f64>>,
    pub mid_axis: Option<Array2<f64>>,
    pub max_axis: Option<Array2<f64>>,
    /// Number of windows that produced a basis
    pub filled: usize,
}

impl MinvarWindows {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Resolved window layout
#[derive(Debug, Clone, Copy, PartialEq)]
struct Layout {
    start: f64,
    window: f64,
    slide: f64,
    count: usize,
}

fn layout(series: &Vector3Series, options: &WindowOptions) -> Result<Layout> {
    let times = series.times();
    let start = options.start.unwrap_or(times[0]);
    let stop = options.stop.unwrap_or(times[times.len() - 1]);

    if (options.start.is_some() || options.stop.is_some()) && stop <= start {
        return Err(CotransError::InvalidWindow(format!(
            "stop {stop} is not after start {start}"
        )));
    }
    let window = match options.window {
        Some(w) if !(w > 0.0 && w.is_finite()) => {
            return Err(CotransError::InvalidWindow(format!(
                "window width must be positive, got {w}"
            )));
        }
        Some(w) => w,
        None => stop - start,
    };

    let slide = match options.slide {
        Some(s) if s >= 0.0 => s,
        _ => window / 2.0,
    };
    let count = if slide > 0.0 {
        let extra = ((stop - start - window) / slide).floor();
        if extra > 0.0 {
            1 + extra as usize
        } else {
            1
        }
    } else {
        1
    };

    Ok(Layout {
        start,
        window,
        slide,
        count,
    })
}

/// Slide a minimum variance window along `series`
///
/// Window `k` covers the closed interval `[start + k·slide, start + k·slide
/// + window]` and is reported at its midpoint. The window count is fixed up
/// front; windows with no samples or an eigen failure are skipped and left
/// as NaN.
pub fn minvar_matrix_make(series: &Vector3Series, options: &WindowOptions) -> Result<MinvarWindows> {
    if series.is_empty() {
        let err = CotransError::EmptyData {
            variable: series.name().to_string(),
        };
        error!(variable = series.name(), error = %err, "minimum variance analysis rejected");
        return Err(err);
    }
    let Layout {
        start,
        window,
        slide,
        count,
    } = layout(series, options).map_err(|err| {
        error!(variable = series.name(), error = %err, "minimum variance analysis rejected");
        err
    })?;
    debug!(
        variable = series.name(),
        window, slide, count, "minimum variance window layout"
    );

    let times = series.times();
    let values = series.values();
    let nan_rows = move || Array2::from_elem((count, 3), f64::NAN);

    let mut out = MinvarWindows {
        times: Array1::from_shape_fn(count, |k| start + k as f64 * slide + window / 2.0),
        matrices: Array3::from_elem((count, 3, 3), f64::NAN),
        eigenvalues: options.eigenvalues.then(nan_rows),
        min_axis: options.axes.then(nan_rows),
        mid_axis: options.axes.then(nan_rows),
        max_axis: options.axes.then(nan_rows),
        filled: 0,
    };

    for k in 0..count {
        let lo_t = start + k as f64 * slide;
        let hi_t = lo_t + window;
        let lo = times.as_slice().map_or_else(
            || times.iter().take_while(|&&t| t < lo_t).count(),
            |t| t.partition_point(|&t| t < lo_t),
        );
        let hi = times.as_slice().map_or_else(
            || times.iter().take_while(|&&t| t <= hi_t).count(),
            |t| t.partition_point(|&t| t <= hi_t),
        );
        if hi <= lo {
            debug!(variable = series.name(), window = k, "no samples in window, skipped");
            continue;
        }

        let result = match minvar(values.slice(s![lo..hi, ..])) {
            Ok(result) => result,
            Err(err) => {
                warn!(variable = series.name(), window = k, error = %err, "window skipped");
                continue;
            }
        };

        for r in 0..3 {
            for c in 0..3 {
                out.matrices[[k, r, c]] = result.basis[(c, r)];
            }
        }
        if let Some(ev) = out.eigenvalues.as_mut() {
            for j in 0..3 {
                ev[[k, j]] = result.eigenvalues[j];
            }
        }
        for (axes, axis) in [
            (out.max_axis.as_mut(), result.max_axis()),
            (out.mid_axis.as_mut(), result.mid_axis()),
            (out.min_axis.as_mut(), result.min_axis()),
        ] {
            if let Some(axes) = axes {
                axes.index_axis_mut(Axis(0), k)
                    .assign(&Array1::from_iter(axis.iter().copied()));
            }
        }
        out.filled += 1;
    }

    Ok(out)
}
