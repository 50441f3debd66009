use std::{
    ffi::OsString,
    fs, io,
    path::{Component, Path, PathBuf},
};

use log::debug;
use ndarray::{Array1, Array2};
use safetensors::{Dtype, SafeTensors, tensor::TensorView};

use super::{
    Checkpoint,
    manifest::{FORMAT_VERSION, Manifest},
};
use crate::{
    NetErr, Result,
    arch::{Network, layers::Dense},
    config::Architecture,
};

/// Where checkpoints go when no path is given, so that resuming doesn't need one either.
pub const DEFAULT_MANIFEST_PATH: &str = "checkpoint/manifest.json";

/// Persists checkpoints as a JSON manifest plus a safetensors weights file next to it.
///
/// The weights file shares the manifest's stem: `run/net.json` pairs with
/// `run/net.safetensors`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointStore {
    manifest_path: PathBuf,
}

impl Default for CheckpointStore {
    fn default() -> Self {
        Self::new(DEFAULT_MANIFEST_PATH)
    }
}

impl CheckpointStore {
    /// Creates a new `CheckpointStore` keyed by a manifest path.
    pub fn new<P: Into<PathBuf>>(manifest_path: P) -> Self {
        Self {
            manifest_path: manifest_path.into(),
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// The companion weights file this store writes.
    pub fn weights_path(&self) -> PathBuf {
        self.manifest_path.with_extension("safetensors")
    }

    /// Whether a manifest exists at this store's path.
    pub fn exists(&self) -> bool {
        self.manifest_path.is_file()
    }

    /// Writes `checkpoint`, replacing any previous one.
    ///
    /// Both files are written to temporaries and renamed into place, weights first.
    ///
    /// # Errors
    /// `Io` if any file operation fails.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let weights_path = self.weights_path();
        debug!(
            "saving checkpoint to {} and {}",
            self.manifest_path.display(),
            weights_path.display()
        );

        if let Some(dir) = self
            .manifest_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
        {
            fs::create_dir_all(dir)?;
        }

        let weights = encode_layers(checkpoint.layers())
            .map_err(|e| NetErr::Io(io::Error::other(e.to_string())))?;
        write_atomic(&weights_path, &weights)?;

        let manifest = Manifest {
            version: FORMAT_VERSION,
            architecture: checkpoint.architecture().clone(),
            hyperparameters: *checkpoint.hyperparameters(),
            epochs_completed: checkpoint.epochs_completed(),
            weights: file_name(&weights_path),
        };

        let manifest = serde_json::to_vec_pretty(&manifest).map_err(io::Error::other)?;
        write_atomic(&self.manifest_path, &manifest)?;

        Ok(())
    }

    /// Reads the stored checkpoint.
    ///
    /// # Errors
    /// `CheckpointNotFound` if the manifest or its weights file is missing, `CheckpointCorrupt`
    /// if either can't be parsed, `CheckpointShapeMismatch` if a tensor disagrees with the
    /// stored architecture and `Io` for other read failures.
    pub fn load(&self) -> Result<Checkpoint> {
        let path = &self.manifest_path;
        debug!("loading checkpoint from {}", path.display());

        let content = read(path)?;
        let manifest: Manifest =
            serde_json::from_slice(&content).map_err(|e| NetErr::corrupt(path, e))?;

        if manifest.version != FORMAT_VERSION {
            return Err(NetErr::corrupt(
                path,
                format!("unsupported format version {}", manifest.version),
            ));
        }

        manifest
            .hyperparameters
            .validate()
            .map_err(|e| NetErr::corrupt(path, e))?;

        let weights_path = path.with_file_name(weights_file(&manifest.weights, path)?);
        let weights = read(&weights_path)?;
        let layers = decode_layers(&weights, &manifest.architecture, &weights_path)?;

        Ok(Checkpoint::from_parts(
            manifest.architecture,
            manifest.hyperparameters,
            layers,
            manifest.epochs_completed,
        ))
    }

    /// Reads the stored checkpoint and rebuilds its network.
    ///
    /// # Errors
    /// Same as [`CheckpointStore::load`], plus `CheckpointShapeMismatch` if the stored
    /// network doesn't have the given architecture.
    pub fn load_network(&self, architecture: &Architecture) -> Result<Network> {
        self.load()?.into_network(architecture)
    }
}

/// Saves `network` into a checkpoint keyed by `manifest_path`.
///
/// # Errors
/// Same as [`CheckpointStore::save`].
pub fn save<P: AsRef<Path>>(network: &Network, manifest_path: P) -> Result<()> {
    CheckpointStore::new(manifest_path.as_ref()).save(&Checkpoint::capture(network))
}

/// Loads the network checkpointed at `manifest_path`, which must have `architecture`.
///
/// # Errors
/// Same as [`CheckpointStore::load_network`].
pub fn load<P: AsRef<Path>>(architecture: &Architecture, manifest_path: P) -> Result<Network> {
    CheckpointStore::new(manifest_path.as_ref()).load_network(architecture)
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => NetErr::CheckpointNotFound {
            path: path.to_path_buf(),
        },
        _ => NetErr::Io(e),
    })
}

/// Checks that the manifest names a plain file next to it.
fn weights_file<'m>(name: &'m str, manifest_path: &Path) -> Result<&'m Path> {
    let file = Path::new(name);
    let mut components = file.components();

    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(file),
        _ => Err(NetErr::corrupt(
            manifest_path,
            format!("weights must be a file name next to the manifest, got {name:?}"),
        )),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn weight_name(layer: usize) -> String {
    format!("layers.{layer}.weight")
}

fn bias_name(layer: usize) -> String {
    format!("layers.{layer}.bias")
}

fn to_bytes<'a, I>(values: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a f32>,
{
    let values: Vec<f32> = values.into_iter().copied().collect();
    bytemuck::cast_slice(&values).to_vec()
}

/// Serializes every layer's weights and biases as F32 safetensors.
fn encode_layers(layers: &[Dense]) -> std::result::Result<Vec<u8>, safetensors::SafeTensorError> {
    let tensors: Vec<(String, Vec<usize>, Vec<u8>)> = layers
        .iter()
        .enumerate()
        .flat_map(|(i, layer)| {
            [
                (
                    weight_name(i),
                    layer.weights().shape().to_vec(),
                    to_bytes(layer.weights()),
                ),
                (
                    bias_name(i),
                    vec![layer.output_width()],
                    to_bytes(layer.biases()),
                ),
            ]
        })
        .collect();

    let views = tensors
        .iter()
        .map(|(name, shape, data)| {
            TensorView::new(Dtype::F32, shape.clone(), data).map(|view| (name.as_str(), view))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    safetensors::serialize(views.iter().map(|(name, view)| (*name, view)), &None)
}

/// Rebuilds the layers of `architecture` from a safetensors buffer.
fn decode_layers(bytes: &[u8], architecture: &Architecture, path: &Path) -> Result<Vec<Dense>> {
    let tensors = SafeTensors::deserialize(bytes).map_err(|e| NetErr::corrupt(path, e))?;

    architecture
        .layer_dims()
        .enumerate()
        .map(|(i, (input, output))| {
            let weights = read_tensor(&tensors, &weight_name(i), &[output, input], path)?;
            let weights = Array2::from_shape_vec((output, input), weights)
                .map_err(|e| NetErr::corrupt(path, e))?;

            let biases = read_tensor(&tensors, &bias_name(i), &[output], path)?;
            Dense::new(weights, Array1::from_vec(biases))
        })
        .collect()
}

fn read_tensor(
    tensors: &SafeTensors<'_>,
    name: &str,
    expected: &[usize],
    path: &Path,
) -> Result<Vec<f32>> {
    let tensor = tensors
        .tensor(name)
        .map_err(|e| NetErr::corrupt(path, format!("{name}: {e}")))?;

    if tensor.dtype() != Dtype::F32 {
        return Err(NetErr::corrupt(
            path,
            format!("{name} has dtype {:?}, expected F32", tensor.dtype()),
        ));
    }

    if tensor.shape() != expected {
        return Err(NetErr::CheckpointShapeMismatch {
            tensor: name.into(),
            got: tensor.shape().to_vec(),
            expected: expected.to_vec(),
        });
    }

    let values = tensor
        .data()
        .chunks_exact(size_of::<f32>())
        .map(bytemuck::pod_read_unaligned::<f32>)
        .collect();

    Ok(values)
}
