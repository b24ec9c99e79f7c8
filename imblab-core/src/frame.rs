//! Normalization of raw tables into the canonical binary-classification frame.
//!
//! Canonical shape: feature columns named `"0".."n-1"` in source order,
//! followed by a `target` column of dtype `Int32` holding only `0` and `1`.
//! Class `1` is treated as the minority class throughout the crate.

use crate::data::{is_missing, ColumnRef, RawTable, Source};
use crate::error::DatasetError;
use polars::prelude::*;

/// Name of the label column in every frame.
pub const TARGET: &str = "target";

/// Which of the non-target columns become features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Features {
    /// Every column that is neither the target nor dropped.
    Remaining,
    /// The first `n` remaining columns.
    Leading(usize),
    /// Only the last `n` columns of the table are kept; the target must be
    /// one of them.
    Trailing(usize),
}

/// How raw target cells become `0`/`1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Labels {
    /// `1` when the cell equals one of these labels, `0` otherwise.
    Positive(&'static [&'static str]),
    /// The cell is already `0` or `1`.
    Binary,
}

/// Everything needed to turn a source into a normalized frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub source: Source,
    pub target: ColumnRef,
    pub drop: Vec<ColumnRef>,
    pub features: Features,
    pub labels: Labels,
    /// Drop rows with a missing cell in any selected column.
    pub drop_incomplete: bool,
}

impl Recipe {
    /// A recipe keeping every non-target column with no missing-row filter.
    pub fn new(source: Source, target: ColumnRef, labels: Labels) -> Self {
        Self {
            source,
            target,
            drop: Vec::new(),
            features: Features::Remaining,
            labels,
            drop_incomplete: false,
        }
    }

    pub fn dropping(mut self, columns: impl IntoIterator<Item = ColumnRef>) -> Self {
        self.drop.extend(columns);
        self
    }

    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    pub fn drop_incomplete(mut self) -> Self {
        self.drop_incomplete = true;
        self
    }
}

/// A dataset ready for persistence: display name plus canonical frame.
#[derive(Debug, Clone)]
pub struct NamedFrame {
    pub name: String,
    pub frame: DataFrame,
}

impl NamedFrame {
    pub fn new(name: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            name: name.into(),
            frame,
        }
    }
}

/// Per-class row counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassCounts {
    pub negative: usize,
    pub positive: usize,
}

impl ClassCounts {
    pub fn total(&self) -> usize {
        self.negative + self.positive
    }

    /// Majority-to-minority ratio `negative / positive`.
    pub fn imbalance_ratio(&self) -> f64 {
        if self.positive == 0 {
            f64::INFINITY
        } else {
            self.negative as f64 / self.positive as f64
        }
    }
}

/// Apply a recipe to a raw table.
///
/// Features keep their source column names; [`canonicalize`] renames them.
pub fn normalize(raw: &RawTable, recipe: &Recipe) -> Result<DataFrame, DatasetError> {
    let target_idx = raw.resolve(&recipe.target)?;
    let dropped = recipe
        .drop
        .iter()
        .map(|c| raw.resolve(c))
        .collect::<Result<Vec<_>, _>>()?;

    let feature_idx = select_features(raw, target_idx, &dropped, recipe.features)?;

    let rows: Vec<&Vec<String>> = raw
        .rows
        .iter()
        .filter(|row| {
            !recipe.drop_incomplete
                || !feature_idx
                    .iter()
                    .chain(std::iter::once(&target_idx))
                    .any(|&i| is_missing(&row[i]))
        })
        .collect();

    let target = rows
        .iter()
        .enumerate()
        .map(|(i, row)| encode_label(&row[target_idx], i, recipe.labels))
        .collect::<Result<Vec<i32>, _>>()?;

    let mut columns: Vec<Column> = feature_idx
        .iter()
        .map(|&idx| typed_column(&raw.columns[idx], rows.iter().map(|row| row[idx].as_str())))
        .collect();
    columns.push(Column::new(TARGET.into(), target));

    Ok(DataFrame::new(columns)?)
}

fn select_features(
    raw: &RawTable,
    target_idx: usize,
    dropped: &[usize],
    features: Features,
) -> Result<Vec<usize>, DatasetError> {
    let keep = |i: &usize| *i != target_idx && !dropped.contains(i);
    let width = raw.width();

    match features {
        Features::Remaining => Ok((0..width).filter(keep).collect()),
        Features::Leading(n) => {
            let selected: Vec<usize> = (0..width).filter(keep).take(n).collect();
            if selected.len() < n {
                return Err(DatasetError::invalid(
                    "features",
                    format!("asked for {n} leading features, table has {}", selected.len()),
                ));
            }
            Ok(selected)
        }
        Features::Trailing(n) => {
            if n > width || target_idx < width - n {
                return Err(DatasetError::invalid(
                    "features",
                    format!("last {n} of {width} columns must exist and include the target"),
                ));
            }
            Ok((width - n..width).filter(keep).collect())
        }
    }
}

fn encode_label(cell: &str, row: usize, labels: Labels) -> Result<i32, DatasetError> {
    if is_missing(cell) {
        return Err(DatasetError::MissingTarget { row });
    }
    match labels {
        Labels::Positive(positives) => Ok(positives.iter().any(|l| label_matches(cell, l)) as i32),
        Labels::Binary => match cell.trim().parse::<f64>() {
            Ok(v) if v == 0.0 => Ok(0),
            Ok(v) if v == 1.0 => Ok(1),
            _ => Err(DatasetError::NonBinaryTarget(cell.trim().to_string())),
        },
    }
}

/// Cells compare after trimming; numeric cells compare by value.
fn label_matches(cell: &str, label: &str) -> bool {
    let (cell, label) = (cell.trim(), label.trim());
    if cell == label {
        return true;
    }
    matches!(
        (cell.parse::<f64>(), label.parse::<f64>()),
        (Ok(a), Ok(b)) if a == b
    )
}

/// Build a column with the narrowest dtype that holds every present cell:
/// `Int64`, then `Float64`, then `String`. Missing cells become nulls.
fn typed_column<'a>(name: &str, cells: impl Iterator<Item = &'a str>) -> Column {
    let cells: Vec<Option<&str>> = cells
        .map(|c| (!is_missing(c)).then(|| c.trim()))
        .collect();

    let ints: Option<Vec<Option<i64>>> = cells
        .iter()
        .map(|c| match c {
            Some(v) => v.parse::<i64>().ok().map(Some),
            None => Some(None),
        })
        .collect();
    if let Some(values) = ints {
        return Column::new(name.into(), values);
    }

    let floats: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|c| match c {
            Some(v) => v.parse::<f64>().ok().map(Some),
            None => Some(None),
        })
        .collect();
    if let Some(values) = floats {
        return Column::new(name.into(), values);
    }

    let strings: Vec<Option<String>> = cells.iter().map(|c| c.map(str::to_string)).collect();
    Column::new(name.into(), strings)
}

/// Rename features to `"0".."n-1"` and move `target` to the end.
pub fn canonicalize(df: DataFrame) -> Result<DataFrame, DatasetError> {
    let target = df
        .column(TARGET)
        .map_err(|_| DatasetError::ColumnNotFound(TARGET.into()))?
        .clone();

    let mut columns: Vec<Column> = df
        .get_columns()
        .iter()
        .filter(|c| c.name().as_str() != TARGET)
        .enumerate()
        .map(|(i, c)| {
            let mut c = c.clone();
            c.rename(i.to_string().into());
            c
        })
        .collect();
    columns.push(target);

    Ok(DataFrame::new(columns)?)
}

/// Check that a frame has the canonical shape.
pub fn validate_canonical(name: &str, df: &DataFrame) -> Result<(), DatasetError> {
    let names = df.get_column_names();
    let Some((last, features)) = names.split_last() else {
        return Err(DatasetError::invalid(name, "frame has no columns"));
    };
    if last.as_str() != TARGET {
        return Err(DatasetError::invalid(name, "target is not the last column"));
    }
    for (i, feature) in features.iter().enumerate() {
        if feature.as_str() != i.to_string() {
            return Err(DatasetError::invalid(
                name,
                format!("feature column {i} is named '{feature}'"),
            ));
        }
    }

    let target = df.column(TARGET)?;
    if target.dtype() != &DataType::Int32 {
        return Err(DatasetError::invalid(
            name,
            format!("target dtype is {}, expected i32", target.dtype()),
        ));
    }
    if target.null_count() > 0 {
        return Err(DatasetError::invalid(name, "target contains nulls"));
    }
    if let Some(bad) = target.i32()?.into_iter().flatten().find(|v| *v != 0 && *v != 1) {
        return Err(DatasetError::NonBinaryTarget(bad.to_string()));
    }
    Ok(())
}

/// Count rows per class.
pub fn class_counts(df: &DataFrame) -> Result<ClassCounts, DatasetError> {
    let target = df
        .column(TARGET)
        .map_err(|_| DatasetError::ColumnNotFound(TARGET.into()))?;

    let mut counts = ClassCounts::default();
    for value in target.i32()?.into_iter() {
        match value {
            Some(0) => counts.negative += 1,
            Some(1) => counts.positive += 1,
            Some(other) => return Err(DatasetError::NonBinaryTarget(other.to_string())),
            None => return Err(DatasetError::MissingTarget { row: counts.total() }),
        }
    }
    Ok(counts)
}

/// Number of feature columns of a canonical frame.
pub fn feature_count(df: &DataFrame) -> usize {
    df.width().saturating_sub(1)
}
