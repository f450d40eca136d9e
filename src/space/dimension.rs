use super::value::ParamValue;

/// Relative tolerance for matching a real value against a grid point.
///
/// A value `v` lies on grid point `g` iff `|v - g| <= GRID_TOLERANCE * max(1, |g|)`.
pub(crate) const GRID_TOLERANCE: f64 = 1e-9;

/// Largest index count a stepped real dimension may declare; past 2^53 the
/// grid points stop being distinct `f64` values.
const MAX_REAL_STEPS: f64 = 9_007_199_254_740_992.0;

/// How a dimension's candidate values are declared.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DimensionKind {
    /// Every integer in `low..=high`.
    Integer { low: i64, high: i64 },

    /// `low, low + step, low + 2*step, ...` up to and including `high`
    /// (within [`GRID_TOLERANCE`]).
    Real { low: f64, high: f64, step: f64 },

    /// An explicit, strictly increasing list of real values.
    RealGrid { values: Vec<f64> },

    /// Unordered labels, indexed in declaration order.
    Categorical { choices: Vec<String> },
}

/// One named parameter of the search space.
///
/// # Examples
///
/// ```
/// use u_blackbox::space::Dimension;
///
/// let depth = Dimension::integer("depth", 1, 8);
/// let lr = Dimension::real("lr", 0.0, 1.0, 0.25);
/// assert_eq!(depth.len(), 8);
/// assert_eq!(lr.len(), 5);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimension {
    name: String,
    kind: DimensionKind,
}

impl Dimension {
    pub fn integer(name: impl Into<String>, low: i64, high: i64) -> Self {
        Self {
            name: name.into(),
            kind: DimensionKind::Integer { low, high },
        }
    }

    pub fn real(name: impl Into<String>, low: f64, high: f64, step: f64) -> Self {
        Self {
            name: name.into(),
            kind: DimensionKind::Real { low, high, step },
        }
    }

    pub fn real_grid(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            kind: DimensionKind::RealGrid { values },
        }
    }

    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        choices: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: DimensionKind::Categorical {
                choices: choices.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &DimensionKind {
        &self.kind
    }

    /// Number of candidate values (0 for an invalid declaration).
    pub fn len(&self) -> usize {
        self.count().unwrap_or(0)
    }

    /// Candidate count, or `None` when the declaration is malformed or the
    /// count does not fit in `usize`.
    fn count(&self) -> Option<usize> {
        match &self.kind {
            DimensionKind::Integer { low, high } => {
                if high < low {
                    return None;
                }
                usize::try_from(high.abs_diff(*low)).ok()?.checked_add(1)
            }
            DimensionKind::Real { low, high, step } => {
                if !(step.is_finite() && *step > 0.0 && low.is_finite() && high.is_finite())
                    || high < low
                {
                    return None;
                }
                let steps = ((high - low) / step + GRID_TOLERANCE).floor();
                if steps.is_nan() || steps >= MAX_REAL_STEPS {
                    return None;
                }
                (steps as usize).checked_add(1)
            }
            DimensionKind::RealGrid { values } => Some(values.len()),
            DimensionKind::Categorical { choices } => Some(choices.len()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks the declaration is well formed.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("dimension name must not be empty".into());
        }
        match &self.kind {
            DimensionKind::Integer { low, high } => {
                if high < low {
                    return Err(format!("'{}': high {high} < low {low}", self.name));
                }
                if self.count().is_none() {
                    return Err(format!("'{}': range {low}..={high} is too wide", self.name));
                }
            }
            DimensionKind::Real { low, high, step } => {
                if !low.is_finite() || !high.is_finite() {
                    return Err(format!("'{}': bounds must be finite", self.name));
                }
                if !(step.is_finite() && *step > 0.0) {
                    return Err(format!("'{}': step must be positive, got {step}", self.name));
                }
                if high < low {
                    return Err(format!("'{}': high {high} < low {low}", self.name));
                }
                if self.count().is_none() {
                    return Err(format!("'{}': range {low}..={high} is too wide", self.name));
                }
            }
            DimensionKind::RealGrid { values } => {
                if values.is_empty() {
                    return Err(format!("'{}': no values", self.name));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(format!("'{}': values must be finite", self.name));
                }
                if values.windows(2).any(|w| w[1] <= w[0]) {
                    return Err(format!("'{}': values must be strictly increasing", self.name));
                }
            }
            DimensionKind::Categorical { choices } => {
                if choices.is_empty() {
                    return Err(format!("'{}': no choices", self.name));
                }
                for (i, c) in choices.iter().enumerate() {
                    if choices[..i].contains(c) {
                        return Err(format!("'{}': duplicate choice '{c}'", self.name));
                    }
                }
            }
        }
        Ok(())
    }

    /// Value at `index`, or `None` past the end.
    pub fn value_at(&self, index: usize) -> Option<ParamValue> {
        if index >= self.len() {
            return None;
        }
        Some(match &self.kind {
            // index < len, so the sum lands in low..=high even when it wraps.
            DimensionKind::Integer { low, .. } => ParamValue::Int(low.wrapping_add(index as i64)),
            DimensionKind::Real { low, step, .. } => ParamValue::Real(low + index as f64 * step),
            DimensionKind::RealGrid { values } => ParamValue::Real(values[index]),
            DimensionKind::Categorical { choices } => ParamValue::Categorical(choices[index].clone()),
        })
    }

    /// Index of `value`, or `None` if it is not on this dimension's grid.
    ///
    /// Integer values are accepted by real dimensions and integral reals by
    /// integer dimensions.
    pub fn index_of(&self, value: &ParamValue) -> Option<usize> {
        match (&self.kind, value) {
            (DimensionKind::Categorical { choices }, ParamValue::Categorical(c)) => {
                choices.iter().position(|x| x == c)
            }
            (DimensionKind::Categorical { .. }, _) => None,
            (_, ParamValue::Categorical(_)) => None,
            (DimensionKind::Integer { low, high }, ParamValue::Int(x)) => {
                if !(*low..=*high).contains(x) {
                    return None;
                }
                usize::try_from(x.abs_diff(*low)).ok()
            }
            (DimensionKind::Integer { .. }, ParamValue::Real(r)) => {
                // 2^63 is exact in f64; anything at or past it saturates.
                if r.fract() != 0.0 || !(*r >= i64::MIN as f64 && *r < i64::MAX as f64) {
                    return None;
                }
                self.index_of(&ParamValue::Int(*r as i64))
            }
            (DimensionKind::Real { low, step, .. }, v) => {
                let x = v.as_f64()?;
                let raw = ((x - low) / step).round();
                if raw < 0.0 || raw as usize >= self.len() {
                    return None;
                }
                let idx = raw as usize;
                on_grid(x, low + idx as f64 * step).then_some(idx)
            }
            (DimensionKind::RealGrid { values }, v) => {
                let x = v.as_f64()?;
                let idx = values.partition_point(|g| *g < x);
                [idx.checked_sub(1), Some(idx)]
                    .into_iter()
                    .flatten()
                    .filter(|&i| i < values.len())
                    .find(|&i| on_grid(x, values[i]))
            }
        }
    }
}

fn on_grid(x: f64, grid: f64) -> bool {
    (x - grid).abs() <= GRID_TOLERANCE * grid.abs().max(1.0)
}
