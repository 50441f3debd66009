use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::{NetErr, Result};

/// The ordered layer widths of a network: input width, hidden widths and output width.
///
/// An `Architecture` always has at least two widths and none of them is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Architecture(Vec<usize>);

impl Architecture {
    /// Creates a new `Architecture`.
    ///
    /// # Errors
    /// `InvalidArchitecture` if there are fewer than two widths or any of them is zero.
    pub fn new<I>(widths: I) -> Result<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        let widths: Vec<_> = widths.into_iter().collect();

        if widths.len() < 2 {
            return Err(NetErr::InvalidArchitecture(format!(
                "expected at least 2 layer widths, got {}",
                widths.len()
            )));
        }

        if let Some(i) = widths.iter().position(|&w| w == 0) {
            return Err(NetErr::InvalidArchitecture(format!(
                "layer width {i} must be greater than 0"
            )));
        }

        Ok(Self(widths))
    }

    pub fn widths(&self) -> &[usize] {
        &self.0
    }

    pub fn input_width(&self) -> usize {
        self.0[0]
    }

    pub fn output_width(&self) -> usize {
        self.0[self.0.len() - 1]
    }

    /// The amount of dense layers, one per adjacent pair of widths.
    pub fn num_layers(&self) -> usize {
        self.0.len() - 1
    }

    /// Iterates the `(input, output)` width of every layer.
    pub fn layer_dims(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.windows(2).map(|w| (w[0], w[1]))
    }
}

impl TryFrom<Vec<usize>> for Architecture {
    type Error = NetErr;

    fn try_from(value: Vec<usize>) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Architecture> for Vec<usize> {
    fn from(value: Architecture) -> Self {
        value.0
    }
}

impl Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
