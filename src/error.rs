use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, NetErr>;

/// The crate's error type.
#[derive(Debug)]
pub enum NetErr {
    /// The layer widths do not describe a valid network.
    InvalidArchitecture(String),
    /// A vector or matrix does not have the size the network expects.
    DimensionMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// A label is not a valid class index for the network.
    LabelOutOfRange {
        row: usize,
        label: usize,
        classes: usize,
    },
    /// Classification was requested on a network that was neither trained nor loaded.
    UninitializedNetwork,
    CheckpointNotFound {
        path: PathBuf,
    },
    CheckpointCorrupt {
        path: PathBuf,
        msg: String,
    },
    /// A stored tensor (or the stored architecture) disagrees with the requested architecture.
    CheckpointShapeMismatch {
        tensor: String,
        got: Vec<usize>,
        expected: Vec<usize>,
    },
    InvalidConfig(String),
    InvalidDataset(String),
    InvalidImage(String),
    Io(io::Error),
}

impl Display for NetErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetErr::InvalidArchitecture(msg) => write!(f, "invalid architecture: {msg}"),
            NetErr::DimensionMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "dimension mismatch for {what}: got {got}, expected {expected}"
            ),
            NetErr::LabelOutOfRange {
                row,
                label,
                classes,
            } => write!(
                f,
                "label {label} at row {row} is out of range for {classes} classes"
            ),
            NetErr::UninitializedNetwork => {
                write!(f, "the network has neither trained nor loaded weights")
            }
            NetErr::CheckpointNotFound { path } => {
                write!(f, "checkpoint not found at {}", path.display())
            }
            NetErr::CheckpointCorrupt { path, msg } => {
                write!(f, "corrupt checkpoint at {}: {msg}", path.display())
            }
            NetErr::CheckpointShapeMismatch {
                tensor,
                got,
                expected,
            } => write!(
                f,
                "checkpoint shape mismatch for {tensor}: got {got:?}, expected {expected:?}"
            ),
            NetErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            NetErr::InvalidDataset(msg) => write!(f, "invalid dataset: {msg}"),
            NetErr::InvalidImage(msg) => write!(f, "invalid image: {msg}"),
            NetErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for NetErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NetErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for NetErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl NetErr {
    /// Builds a `CheckpointCorrupt` error for the file at `path`.
    pub(crate) fn corrupt<P, M>(path: P, msg: M) -> Self
    where
        P: Into<PathBuf>,
        M: Display,
    {
        Self::CheckpointCorrupt {
            path: path.into(),
            msg: msg.to_string(),
        }
    }
}
