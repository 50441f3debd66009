mod csv;
mod image;
mod scale;

pub use self::{
    csv::LabelColumn,
    image::{features_of, image_features, normalize_pixel, read_image, render},
    scale::scale,
};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::{NetErr, Result};

/// A table of samples, one per row, optionally labeled with their class.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Array2<f32>,
    labels: Option<Array1<usize>>,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Errors
    /// `InvalidDataset` if there are labels but not one per row.
    pub fn new(features: Array2<f32>, labels: Option<Array1<usize>>) -> Result<Self> {
        if let Some(labels) = &labels
            && labels.len() != features.nrows()
        {
            return Err(NetErr::InvalidDataset(format!(
                "{} labels for {} rows",
                labels.len(),
                features.nrows()
            )));
        }

        Ok(Self { features, labels })
    }

    pub fn features(&self) -> ArrayView2<'_, f32> {
        self.features.view()
    }

    /// The class of each row, if the dataset is labeled.
    pub fn labels(&self) -> Option<ArrayView1<'_, usize>> {
        self.labels.as_ref().map(|labels| labels.view())
    }

    /// The amount of samples.
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The amount of features per sample.
    pub fn width(&self) -> usize {
        self.features.ncols()
    }

    /// Returns a copy of this dataset with its features standardized column by column.
    pub fn scaled(&self) -> Self {
        Self {
            features: scale(self.features.view()),
            labels: self.labels.clone(),
        }
    }
}
