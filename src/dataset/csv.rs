use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;
use ndarray::{Array1, Array2};

use super::Dataset;
use crate::{NetErr, Result};

/// Which column of a CSV file holds the labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LabelColumn {
    /// The MNIST CSV layout: `label, pixel0, pixel1, ...`.
    #[default]
    First,
    Last,
    /// Every column is a feature.
    None,
}

impl Dataset {
    /// Reads a dataset out of a headerless CSV file of numbers.
    ///
    /// # Arguments
    /// * `path` - The file to read.
    /// * `labels` - Where the labels are, if anywhere.
    ///
    /// # Errors
    /// `InvalidDataset` if the file is empty, has rows of different lengths, values that aren't
    /// numbers or labels that aren't non negative integers. `Io` if it can't be read.
    pub fn from_csv<P: AsRef<Path>>(path: P, labels: LabelColumn) -> Result<Self> {
        let path = path.as_ref();
        debug!("reading dataset from {}", path.display());

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .trim(Trim::All)
            .from_path(path)
            .map_err(csv_error)?;

        let mut features = Vec::new();
        let mut targets = Vec::new();
        let mut width = None;

        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(csv_error)?;
            let (label, values) = split_label(&record, labels, row)?;

            let expected = *width.get_or_insert(values.len());
            if values.len() != expected || expected == 0 {
                return Err(NetErr::InvalidDataset(format!(
                    "row {row} has {} features, expected {expected}",
                    values.len()
                )));
            }

            for (col, value) in values.iter().enumerate() {
                features.push(parse_value(value, row, col)?);
            }

            if let Some(label) = label {
                targets.push(label);
            }
        }

        let Some(width) = width else {
            return Err(NetErr::InvalidDataset(format!(
                "{} has no rows",
                path.display()
            )));
        };

        let rows = features.len() / width;
        let features = Array2::from_shape_vec((rows, width), features)
            .map_err(|e| NetErr::InvalidDataset(e.to_string()))?;

        let labels = match labels {
            LabelColumn::None => None,
            _ => Some(Array1::from_vec(targets)),
        };

        debug!("read {rows} rows of {width} features");
        Dataset::new(features, labels)
    }
}

fn split_label(
    record: &StringRecord,
    labels: LabelColumn,
    row: usize,
) -> Result<(Option<usize>, Vec<&str>)> {
    let mut values: Vec<&str> = record.iter().collect();

    let label = match labels {
        LabelColumn::None => return Ok((None, values)),
        LabelColumn::First if !values.is_empty() => values.remove(0),
        LabelColumn::Last if !values.is_empty() => values.remove(values.len() - 1),
        _ => {
            return Err(NetErr::InvalidDataset(format!("row {row} is empty")));
        }
    };

    Ok((Some(parse_label(label, row)?), values))
}

/// Parses a class label, written either as an integer or as a float with no fractional part.
fn parse_label(value: &str, row: usize) -> Result<usize> {
    let invalid = || NetErr::InvalidDataset(format!("invalid label {value:?} at row {row}"));

    if let Ok(label) = value.parse::<usize>() {
        return Ok(label);
    }

    let label: f64 = value.parse().map_err(|_| invalid())?;
    if !label.is_finite() || label < 0. || label.fract() != 0. {
        return Err(invalid());
    }

    Ok(label as usize)
}

fn parse_value(value: &str, row: usize, col: usize) -> Result<f32> {
    value.parse().map_err(|_| {
        NetErr::InvalidDataset(format!(
            "invalid value {value:?} at row {row}, column {col}"
        ))
    })
}

fn csv_error(e: csv::Error) -> NetErr {
    if !e.is_io_error() {
        return NetErr::InvalidDataset(e.to_string());
    }

    match e.into_kind() {
        csv::ErrorKind::Io(e) => NetErr::Io(e),
        kind => NetErr::InvalidDataset(format!("{kind:?}")),
    }
}
