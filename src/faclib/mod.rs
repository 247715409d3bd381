//! Field-aligned coordinate systems
//!
//! Builds one right-handed orthonormal triple per sample with `z` along the
//! magnetic field. The variants differ only in the seed direction that fixes
//! the rotation about `z`:
//!
//! | variant   | seed                                  | assembly |
//! |-----------|---------------------------------------|----------|
//! | `Xgse`    | GSE X axis                            | y first  |
//! | `Ygse`    | GSE Y axis                            | x first  |
//! | `Ygsm`    | GSM Y axis                            | x first  |
//! | `Phigeo`  | azimuthal direction of position, GEO  | x first  |
//! | `Mphigeo` | azimuthal direction of position, GEO  | y first  |
//! | `Phism`   | azimuthal direction of position, SM   | x first  |
//! | `Mphism`  | azimuthal direction of position, SM   | y first  |
//!
//! "x first" takes `x = ‖seed × z‖`, `y = z × x`; "y first" takes
//! `y = ‖z × seed‖`, `x = y × z`.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, Array3};
use tracing::{debug, error};

use crate::cotrans::Cotrans;
use crate::errors::{CotransError, Result};
use crate::framelib::CoordinateFrame;
use crate::series::rotation::from_axes;
use crate::series::{cross_rows, normalize_rows, Vector3Series};

/// Named field-aligned coordinate variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacVariant {
    Xgse,
    Ygse,
    Ygsm,
    Phigeo,
    Mphigeo,
    Phism,
    Mphism,
}

/// Which axis is built from the seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assembly {
    XFirst,
    YFirst,
}

/// Where the seed direction comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seed {
    Axis(CoordinateFrame, usize),
    Azimuth(CoordinateFrame),
}

impl FacVariant {
    pub const ALL: [FacVariant; 7] = [
        FacVariant::Xgse,
        FacVariant::Ygse,
        FacVariant::Ygsm,
        FacVariant::Phigeo,
        FacVariant::Mphigeo,
        FacVariant::Phism,
        FacVariant::Mphism,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FacVariant::Xgse => "Xgse",
            FacVariant::Ygse => "Ygse",
            FacVariant::Ygsm => "Ygsm",
            FacVariant::Phigeo => "Phigeo",
            FacVariant::Mphigeo => "Mphigeo",
            FacVariant::Phism => "Phism",
            FacVariant::Mphism => "Mphism",
        }
    }

    /// Whether the variant needs a spacecraft position series
    pub fn needs_position(&self) -> bool {
        matches!(self.seed(), Seed::Azimuth(_))
    }

    fn seed(&self) -> Seed {
        match self {
            FacVariant::Xgse => Seed::Axis(CoordinateFrame::Gse, 0),
            FacVariant::Ygse => Seed::Axis(CoordinateFrame::Gse, 1),
            FacVariant::Ygsm => Seed::Axis(CoordinateFrame::Gsm, 1),
            FacVariant::Phigeo | FacVariant::Mphigeo => Seed::Azimuth(CoordinateFrame::Geo),
            FacVariant::Phism | FacVariant::Mphism => Seed::Azimuth(CoordinateFrame::Sm),
        }
    }

    fn assembly(&self) -> Assembly {
        match self {
            FacVariant::Xgse | FacVariant::Mphigeo | FacVariant::Mphism => Assembly::YFirst,
            FacVariant::Ygse | FacVariant::Ygsm | FacVariant::Phigeo | FacVariant::Phism => {
                Assembly::XFirst
            }
        }
    }
}

impl fmt::Display for FacVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FacVariant {
    type Err = CotransError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        FacVariant::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CotransError::UnknownVariant(s.to_string()))
    }
}

/// Field-aligned basis per sample
#[derive(Debug, Clone)]
pub struct FacBasis {
    pub variant: FacVariant,
    /// Frame the field and the axes are expressed in
    pub frame: CoordinateFrame,
    /// Rows are x, y, z; `matrices[i] · B[i]` lies along z
    pub matrices: Array3<f64>,
    pub x: Array2<f64>,
    pub y: Array2<f64>,
    pub z: Array2<f64>,
}

/// Field-aligned basis for `field`, working in its tagged frame
///
/// An untagged field is taken to be in GSE.
pub fn fac_matrix_make(
    field: &Vector3Series,
    variant: FacVariant,
    position: Option<&Vector3Series>,
    cotrans: &Cotrans,
) -> Result<FacBasis> {
    fac_matrix_make_in(field, None, variant, position, cotrans)
}

/// Field-aligned basis with an explicit working frame
///
/// `frame` overrides the field's tag. The position series is taken to be in
/// GSE unless it carries its own tag.
pub fn fac_matrix_make_in(
    field: &Vector3Series,
    frame: Option<&str>,
    variant: FacVariant,
    position: Option<&Vector3Series>,
    cotrans: &Cotrans,
) -> Result<FacBasis> {
    let working = match (frame, field.frame_tag()) {
        (Some(frame), _) => CoordinateFrame::parse_arg(frame, "frame"),
        (None, Some(tag)) => tag.frame(),
        (None, None) => Ok(CoordinateFrame::Gse),
    }
    .map_err(|err| reject(field.name(), err))?;

    if field.is_empty() {
        return Err(reject(
            field.name(),
            CotransError::EmptyData {
                variable: field.name().to_string(),
            },
        ));
    }

    let seed = match variant.seed() {
        Seed::Axis(frame, axis) => {
            let mut values = Array2::zeros((field.len(), 3));
            values.column_mut(axis).fill(1.0);
            let seed = field.derived(format!("{}_seed", field.name()), values, None);
            cotrans.rotate(&seed, frame, working)?.values().clone()
        }
        Seed::Azimuth(frame) => {
            let position = position.ok_or_else(|| {
                let err = CotransError::MissingSupportData {
                    variable: "position".to_string(),
                };
                error!(
                    variable = "position",
                    field = field.name(),
                    %variant,
                    error = %err,
                    "field-aligned basis rejected"
                );
                err
            })?;
            azimuth_seed(field, position, frame, working, cotrans)?
        }
    };

    let z = field.normalized().values().clone();
    let (x, y) = match variant.assembly() {
        Assembly::XFirst => {
            let x = normalize_rows(&cross_rows(&seed, &z));
            let y = cross_rows(&z, &x);
            (x, y)
        }
        Assembly::YFirst => {
            let y = normalize_rows(&cross_rows(&z, &seed));
            let x = cross_rows(&y, &z);
            (x, y)
        }
    };
    debug!(
        variable = field.name(),
        %variant,
        frame = %working,
        samples = field.len(),
        "built field-aligned basis"
    );

    Ok(FacBasis {
        variant,
        frame: working,
        matrices: from_axes(&x, &y, &z),
        x,
        y,
        z,
    })
}

/// Azimuthal direction `(-y, x, 0)` of the position in `frame`, expressed
/// in the working frame
fn azimuth_seed(
    field: &Vector3Series,
    position: &Vector3Series,
    frame: CoordinateFrame,
    working: CoordinateFrame,
    cotrans: &Cotrans,
) -> Result<Array2<f64>> {
    if position.times() != field.times() {
        return Err(reject(
            position.name(),
            CotransError::SeriesShape {
                variable: position.name().to_string(),
                reason: format!("position timestamps differ from those of {}", field.name()),
            },
        ));
    }
    let position_frame = match position.frame_tag() {
        Some(tag) => tag.frame().map_err(|err| reject(position.name(), err))?,
        None => CoordinateFrame::Gse,
    };

    let r = cotrans.rotate(position, position_frame, frame)?;
    let mut phi = Array2::zeros(r.values().raw_dim());
    for (mut out, p) in phi.rows_mut().into_iter().zip(r.values().rows()) {
        out[0] = -p[1];
        out[1] = p[0];
    }
    let phi = r.derived(format!("{}_phi", position.name()), phi, None);
    Ok(cotrans.rotate(&phi, frame, working)?.values().clone())
}

fn reject(variable: &str, err: CotransError) -> CotransError {
    error!(variable, error = %err, "field-aligned basis rejected");
    err
}
