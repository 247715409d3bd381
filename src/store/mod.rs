//! Named-variable store and by-name wrappers
//!
//! The numerical modules work on values. Analysis sessions usually hold
//! their data as named variables instead; the wrappers here read inputs by
//! name, call the pure operations and store the outputs under new names.

use std::collections::{BTreeMap, HashMap};

use ndarray::{Array1, Array3};
use tracing::{debug, error};

use crate::cotrans::Cotrans;
use crate::errors::{CotransError, Result};
use crate::faclib::{fac_matrix_make_in, FacVariant};
use crate::minvarlib::{minvar_matrix_make, WindowOptions};
use crate::series::Vector3Series;

/// Free-form attributes stored alongside a variable
pub type Metadata = BTreeMap<String, String>;

/// Metadata key recording the frame of a stored variable
pub const COORDINATE_SYSTEM: &str = "coordinate_system";

/// Value held under one name
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    Vectors(Vector3Series),
    Matrices {
        times: Array1<f64>,
        matrices: Array3<f64>,
    },
}

impl Variable {
    pub fn times(&self) -> &Array1<f64> {
        match self {
            Variable::Vectors(series) => series.times(),
            Variable::Matrices { times, .. } => times,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredVariable {
    pub value: Variable,
    pub metadata: Metadata,
}

/// Storage of named variables
pub trait VariableStore: Send + Sync {
    /// Look up a variable, `None` if absent
    fn get(&self, name: &str) -> Option<&StoredVariable>;

    /// Store a variable, replacing any previous one of the same name
    fn store(&mut self, name: &str, value: Variable, metadata: Metadata);

    /// Duplicate a variable under a new name
    ///
    /// Returns false if `from` does not exist.
    fn copy(&mut self, from: &str, to: &str) -> bool;

    /// All stored names, sorted
    fn names(&self) -> Vec<String>;

    /// A vector series by name
    ///
    /// Absent names and matrix variables are reported as missing support
    /// data.
    fn get_vectors(&self, name: &str) -> Result<&Vector3Series> {
        match self.get(name).map(|v| &v.value) {
            Some(Variable::Vectors(series)) => Ok(series),
            Some(Variable::Matrices { .. }) => {
                error!(variable = name, "stored variable holds matrices, not vectors");
                Err(CotransError::MissingSupportData {
                    variable: name.to_string(),
                })
            }
            None => {
                error!(variable = name, "variable not found in store");
                Err(CotransError::MissingSupportData {
                    variable: name.to_string(),
                })
            }
        }
    }
}

/// HashMap-backed store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    variables: HashMap<String, StoredVariable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Store a series under its own name, recording its frame tag
    pub fn insert_series(&mut self, series: Vector3Series) {
        let mut metadata = Metadata::new();
        if let Some(tag) = series.frame_tag() {
            metadata.insert(COORDINATE_SYSTEM.to_string(), tag.to_string());
        }
        let name = series.name().to_string();
        self.store(&name, Variable::Vectors(series), metadata);
    }
}

impl VariableStore for MemoryStore {
    fn get(&self, name: &str) -> Option<&StoredVariable> {
        self.variables.get(name)
    }

    fn store(&mut self, name: &str, value: Variable, metadata: Metadata) {
        let value = match value {
            Variable::Vectors(series) if series.name() != name => {
                Variable::Vectors(series.with_name(name))
            }
            other => other,
        };
        self.variables
            .insert(name.to_string(), StoredVariable { value, metadata });
    }

    fn copy(&mut self, from: &str, to: &str) -> bool {
        match self.variables.get(from).cloned() {
            Some(stored) => {
                self.store(to, stored.value, stored.metadata);
                true
            }
            None => false,
        }
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.variables.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Transform a stored series and store the result
///
/// The output is named `name_out`, or `<name_in>_<frame_out>` when not
/// given. Returns the output name.
pub fn cotrans_var<S: VariableStore + ?Sized>(
    store: &mut S,
    cotrans: &Cotrans,
    name_in: &str,
    name_out: Option<&str>,
    frame_in: Option<&str>,
    frame_out: Option<&str>,
) -> Result<String> {
    let (out, mut metadata) = {
        let stored = store.get(name_in);
        let metadata = stored.map(|s| s.metadata.clone()).unwrap_or_default();
        let input = store.get_vectors(name_in)?;
        (cotrans.transform(input, frame_in, frame_out)?, metadata)
    };
    let name = name_out.unwrap_or(out.name()).to_string();
    if let Some(tag) = out.frame_tag() {
        metadata.insert(COORDINATE_SYSTEM.to_string(), tag.to_string());
    }
    debug!(input = name_in, output = %name, "stored transformed variable");
    store.store(&name, Variable::Vectors(out), metadata);
    Ok(name)
}

/// Sliding-window minimum variance of a stored series
///
/// Stores `<prefix>_mat` with the per-window matrices and, when requested,
/// `<prefix>_eigenvalues`, `<prefix>_min`, `<prefix>_mid` and `<prefix>_max`.
/// The prefix defaults to `<name>_mva`. Returns the stored names.
pub fn minvar_matrix_make_var<S: VariableStore + ?Sized>(
    store: &mut S,
    name: &str,
    options: &WindowOptions,
    prefix: Option<&str>,
) -> Result<Vec<String>> {
    let (windows, frame) = {
        let input = store.get_vectors(name)?;
        (
            minvar_matrix_make(input, options)?,
            input.frame_tag().map(|t| t.to_string()),
        )
    };
    let prefix = prefix.map_or_else(|| format!("{name}_mva"), str::to_string);

    let mut metadata = Metadata::new();
    metadata.insert("source".to_string(), name.to_string());
    if let Some(frame) = frame {
        metadata.insert(COORDINATE_SYSTEM.to_string(), frame);
    }

    let mut stored = Vec::new();
    let mut put = |store: &mut S, suffix: &str, value: Variable| {
        let full = format!("{prefix}_{suffix}");
        store.store(&full, value, metadata.clone());
        stored.push(full);
    };

    put(
        &mut *store,
        "mat",
        Variable::Matrices {
            times: windows.times.clone(),
            matrices: windows.matrices,
        },
    );
    for (suffix, values) in [
        ("eigenvalues", windows.eigenvalues),
        ("min", windows.min_axis),
        ("mid", windows.mid_axis),
        ("max", windows.max_axis),
    ] {
        if let Some(values) = values {
            let series = Vector3Series::new(suffix, windows.times.clone(), values)?;
            put(&mut *store, suffix, Variable::Vectors(series));
        }
    }
    debug!(input = name, outputs = ?stored, "stored minimum variance variables");
    Ok(stored)
}

/// Field-aligned basis for a stored field series
///
/// `variant` is parsed case-insensitively; `position` names the position
/// series for the variants that need one. The matrices are stored as
/// `name_out`, defaulting to `<field>_fac_mat`. Returns the output name.
pub fn fac_matrix_make_var<S: VariableStore + ?Sized>(
    store: &mut S,
    cotrans: &Cotrans,
    field: &str,
    variant: &str,
    position: Option<&str>,
    name_out: Option<&str>,
) -> Result<String> {
    let variant: FacVariant = variant.parse()?;
    let basis = {
        let b = store.get_vectors(field)?;
        let frame = store
            .get(field)
            .and_then(|s| s.metadata.get(COORDINATE_SYSTEM))
            .map(String::as_str);
        let position = match (variant.needs_position(), position) {
            (true, Some(name)) => Some(store.get_vectors(name)?),
            _ => None,
        };
        fac_matrix_make_in(b, frame, variant, position, cotrans)?
    };

    let name = name_out.map_or_else(|| format!("{field}_fac_mat"), str::to_string);
    let mut metadata = Metadata::new();
    metadata.insert("source".to_string(), field.to_string());
    metadata.insert("fac_variant".to_string(), variant.to_string());
    metadata.insert(COORDINATE_SYSTEM.to_string(), basis.frame.to_string());
    let times = store.get_vectors(field)?.times().clone();
    store.store(
        &name,
        Variable::Matrices {
            times,
            matrices: basis.matrices,
        },
        metadata,
    );
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::igrflib::FixedEpoch;
    use crate::test_utils::{at_level, capture_events, random_series};
    use std::sync::Arc;
    use tracing::Level;

    fn session() -> (MemoryStore, Cotrans) {
        let mut store = MemoryStore::new();
        let b = random_series("b_gse", 120, 41, 200.0).with_frame("GSE");
        let values = random_series("pos", 120, 42, 4.0e4).values().clone();
        let pos = Vector3Series::new("pos_gse", b.times().clone(), values)
            .unwrap()
            .with_frame("GSE");
        store.insert_series(b);
        store.insert_series(pos);
        (store, Cotrans::with_dipole_model(Arc::new(FixedEpoch::new(2020.0))))
    }

    #[test]
    fn test_store_get_copy_names() {
        let (mut store, _) = session();
        assert_eq!(store.names(), vec!["b_gse", "pos_gse"]);
        assert!(store.copy("b_gse", "b_copy"));
        assert!(!store.copy("missing", "x"));
        assert_eq!(store.get_vectors("b_copy").unwrap().name(), "b_copy");
        assert_eq!(
            store.get("b_copy").unwrap().metadata[COORDINATE_SYSTEM],
            "GSE"
        );
        assert_eq!(
            store.get_vectors("nothing").unwrap_err(),
            CotransError::MissingSupportData {
                variable: "nothing".to_string()
            }
        );
    }

    #[test]
    fn test_missing_variables_are_logged() {
        let (mut store, cotrans) = session();
        let (err, events) = capture_events(|| {
            cotrans_var(&mut store, &cotrans, "b_gsm", None, None, Some("sm")).unwrap_err()
        });
        assert_eq!(
            err,
            CotransError::MissingSupportData {
                variable: "b_gsm".to_string()
            }
        );
        let errors = at_level(&events, Level::ERROR);
        assert_eq!(errors.len(), 1, "{events:?}");
        assert_eq!(errors[0].field("variable"), Some("b_gsm"));

        fac_matrix_make_var(&mut store, &cotrans, "b_gse", "xgse", None, Some("fac")).unwrap();
        let (err, events) = capture_events(|| store.get_vectors("fac").unwrap_err());
        assert!(matches!(err, CotransError::MissingSupportData { .. }));
        let errors = at_level(&events, Level::ERROR);
        assert_eq!(errors.len(), 1, "{events:?}");
        assert!(errors[0].message.contains("matrices"));
    }

    #[test]
    fn test_cotrans_var_default_and_explicit_names() {
        let (mut store, cotrans) = session();
        let name = cotrans_var(&mut store, &cotrans, "b_gse", None, None, Some("gsm")).unwrap();
        assert_eq!(name, "b_gse_gsm");
        let stored = store.get("b_gse_gsm").unwrap();
        assert_eq!(stored.metadata[COORDINATE_SYSTEM], "gsm");

        let name =
            cotrans_var(&mut store, &cotrans, "b_gse_gsm", Some("b_sm"), None, Some("sm")).unwrap();
        assert_eq!(name, "b_sm");
        assert!(store.get_vectors("b_sm").unwrap().frame_tag().unwrap().matches("SM"));
    }

    #[test]
    fn test_cotrans_var_failure_stores_nothing() {
        let (mut store, cotrans) = session();
        let before = store.names();
        let err = cotrans_var(&mut store, &cotrans, "b_gse", None, Some("gei"), Some("geo"))
            .unwrap_err();
        assert!(matches!(err, CotransError::FrameMismatch { .. }));
        assert_eq!(store.names(), before);
    }

    #[test]
    fn test_minvar_var_stores_requested_outputs() {
        let (mut store, _) = session();
        let t = store.get_vectors("b_gse").unwrap().times().clone();
        let window = (t[t.len() - 1] - t[0]) / 4.0;
        let options = WindowOptions::with_window(window)
            .slide(window * 0.8)
            .with_eigenvalues()
            .with_axes();
        let names = minvar_matrix_make_var(&mut store, "b_gse", &options, None).unwrap();
        assert_eq!(
            names,
            vec![
                "b_gse_mva_mat",
                "b_gse_mva_eigenvalues",
                "b_gse_mva_min",
                "b_gse_mva_mid",
                "b_gse_mva_max"
            ]
        );
        match &store.get("b_gse_mva_mat").unwrap().value {
            Variable::Matrices { times, matrices } => {
                // 1 + floor(0.75 / 0.2)
                assert_eq!(times.len(), 4);
                assert_eq!(matrices.dim(), (4, 3, 3));
            }
            other => panic!("unexpected variable {other:?}"),
        }
        assert_eq!(store.get("b_gse_mva_min").unwrap().value.times().len(), 4);

        let plain = minvar_matrix_make_var(
            &mut store,
            "b_gse",
            &WindowOptions::with_window(window),
            Some("mva"),
        )
        .unwrap();
        assert_eq!(plain, vec!["mva_mat"]);
    }

    #[test]
    fn test_fac_var_needs_position_for_azimuthal_variants() {
        let (mut store, cotrans) = session();
        let name =
            fac_matrix_make_var(&mut store, &cotrans, "b_gse", "xgse", None, None).unwrap();
        assert_eq!(name, "b_gse_fac_mat");
        assert_eq!(store.get(&name).unwrap().metadata["fac_variant"], "Xgse");

        let (err, events) = capture_events(|| {
            fac_matrix_make_var(&mut store, &cotrans, "b_gse", "phigeo", None, None).unwrap_err()
        });
        assert_eq!(
            err,
            CotransError::MissingSupportData {
                variable: "position".to_string()
            }
        );
        let errors = at_level(&events, Level::ERROR);
        assert_eq!(errors.len(), 1, "{events:?}");
        assert_eq!(errors[0].field("variable"), Some("position"));

        let err = fac_matrix_make_var(&mut store, &cotrans, "b_gse", "phism", Some("r"), None)
            .unwrap_err();
        assert_eq!(
            err,
            CotransError::MissingSupportData {
                variable: "r".to_string()
            }
        );

        let name = fac_matrix_make_var(
            &mut store,
            &cotrans,
            "b_gse",
            "Mphism",
            Some("pos_gse"),
            Some("fac"),
        )
        .unwrap();
        assert_eq!(name, "fac");

        assert_eq!(
            fac_matrix_make_var(&mut store, &cotrans, "b_gse", "vdh", None, None).unwrap_err(),
            CotransError::UnknownVariant("vdh".to_string())
        );
    }
}
