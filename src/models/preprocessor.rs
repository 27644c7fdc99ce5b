// Fitted column transformer: raw feature rows -> numeric model input
use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, FeatureError};
use crate::features::FeatureRow;
use crate::models::artifact::Artifact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HandleUnknown {
    #[default]
    Error,
    Ignore,
}

/// One fitted step of the column transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnTransform {
    StandardScaler {
        columns: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    OneHotEncoder {
        columns: Vec<String>,
        categories: Vec<Vec<String>>,
        #[serde(default)]
        drop_first: bool,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
    Passthrough {
        columns: Vec<String>,
    },
}

impl ColumnTransform {
    pub fn columns(&self) -> &[String] {
        match self {
            ColumnTransform::StandardScaler { columns, .. }
            | ColumnTransform::OneHotEncoder { columns, .. }
            | ColumnTransform::Passthrough { columns } => columns,
        }
    }

    pub fn output_width(&self) -> usize {
        match self {
            ColumnTransform::StandardScaler { columns, .. }
            | ColumnTransform::Passthrough { columns } => columns.len(),
            ColumnTransform::OneHotEncoder {
                categories,
                drop_first,
                ..
            } => categories
                .iter()
                .map(|c| if *drop_first { c.len().saturating_sub(1) } else { c.len() })
                .sum(),
        }
    }

    fn apply(&self, row: &FeatureRow, out: &mut Vec<f64>) -> Result<(), FeatureError> {
        match self {
            ColumnTransform::StandardScaler {
                columns,
                mean,
                scale,
            } => {
                for (i, column) in columns.iter().enumerate() {
                    let x = row.number(column)?;
                    let s = if scale[i] == 0.0 { 1.0 } else { scale[i] };
                    out.push((x - mean[i]) / s);
                }
            }
            ColumnTransform::OneHotEncoder {
                columns,
                categories,
                drop_first,
                handle_unknown,
            } => {
                for (column, cats) in columns.iter().zip(categories) {
                    let value = row.text(column)?;
                    let position = cats.iter().position(|c| c == value);
                    if position.is_none() && *handle_unknown == HandleUnknown::Error {
                        return Err(FeatureError::UnknownCategory {
                            column: column.clone(),
                            value: value.to_string(),
                        });
                    }
                    let skip = usize::from(*drop_first);
                    out.extend(
                        (skip..cats.len()).map(|i| if Some(i) == position { 1.0 } else { 0.0 }),
                    );
                }
            }
            ColumnTransform::Passthrough { columns } => {
                for column in columns {
                    out.push(row.number(column)?);
                }
            }
        }
        Ok(())
    }

    fn check(&self, index: usize) -> Result<(), ArtifactError> {
        match self {
            ColumnTransform::StandardScaler {
                columns,
                mean,
                scale,
            } => {
                if mean.len() != columns.len() || scale.len() != columns.len() {
                    return Err(ArtifactError::invalid(format!(
                        "transform {index}: scaler has {} columns but {} means and {} scales",
                        columns.len(),
                        mean.len(),
                        scale.len()
                    )));
                }
                if mean.iter().chain(scale).any(|v| !v.is_finite()) {
                    return Err(ArtifactError::invalid(format!(
                        "transform {index}: scaler statistics must be finite"
                    )));
                }
            }
            ColumnTransform::OneHotEncoder {
                columns,
                categories,
                ..
            } => {
                if categories.len() != columns.len() {
                    return Err(ArtifactError::invalid(format!(
                        "transform {index}: encoder has {} columns but {} category lists",
                        columns.len(),
                        categories.len()
                    )));
                }
                if let Some((column, _)) = columns
                    .iter()
                    .zip(categories)
                    .find(|(_, cats)| cats.is_empty())
                {
                    return Err(ArtifactError::invalid(format!(
                        "transform {index}: no categories for column '{column}'"
                    )));
                }
            }
            ColumnTransform::Passthrough { .. } => {}
        }
        Ok(())
    }
}

/// Ordered list of column transforms. Output columns are concatenated in
/// transform order; columns no transform names are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub transforms: Vec<ColumnTransform>,
}

impl Preprocessor {
    pub fn new(transforms: Vec<ColumnTransform>) -> Result<Self, ArtifactError> {
        let preprocessor = Self { transforms };
        preprocessor.validate()?;
        Ok(preprocessor)
    }

    /// Every input column, in the order the transforms consume them.
    pub fn input_columns(&self) -> impl Iterator<Item = &str> {
        self.transforms
            .iter()
            .flat_map(|t| t.columns().iter().map(String::as_str))
    }

    pub fn output_width(&self) -> usize {
        self.transforms.iter().map(ColumnTransform::output_width).sum()
    }

    pub fn transform_row(&self, row: &FeatureRow) -> Result<Vec<f64>, FeatureError> {
        let mut out = Vec::with_capacity(self.output_width());
        for transform in &self.transforms {
            transform.apply(row, &mut out)?;
        }
        Ok(out)
    }

    pub fn transform(&self, rows: &[FeatureRow]) -> Result<Vec<Vec<f64>>, FeatureError> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }

    /// Columns present in `row` that no transform uses.
    pub fn unused_columns<'a>(&self, row: &'a FeatureRow) -> Vec<&'a str> {
        row.columns()
            .filter(|c| !self.input_columns().any(|name| name == *c))
            .collect()
    }
}

impl Artifact for Preprocessor {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.transforms.is_empty() {
            return Err(ArtifactError::invalid("preprocessor has no transforms"));
        }
        for (index, transform) in self.transforms.iter().enumerate() {
            transform.check(index)?;
        }
        let mut seen = std::collections::HashSet::new();
        for column in self.input_columns() {
            if !seen.insert(column) {
                return Err(ArtifactError::invalid(format!(
                    "column '{column}' is used by more than one transform"
                )));
            }
        }
        if self.output_width() == 0 {
            return Err(ArtifactError::invalid("preprocessor produces no output columns"));
        }
        Ok(())
    }
}
