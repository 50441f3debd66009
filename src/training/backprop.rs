use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::{NetErr, Result, arch::Network};

/// Makes one stochastic gradient descent pass over the dataset, one row at a time, in order.
///
/// Every row is checked before the first update, so on error the network is left untouched.
///
/// # Arguments
/// * `network` - The network to train.
/// * `features` - One sample per row.
/// * `labels` - The class of each row.
///
/// # Returns
/// The mean squared error of the pass, measured before each row's update.
///
/// # Errors
/// `DimensionMismatch` if the features don't fit the network or there isn't one label per row,
/// `LabelOutOfRange` if a label isn't one of the network's classes, `InvalidDataset` if there
/// are no rows.
pub fn train_one_epoch(
    network: &mut Network,
    features: ArrayView2<f32>,
    labels: ArrayView1<usize>,
) -> Result<f32> {
    network.check_dataset(features, labels)?;

    if features.nrows() == 0 {
        return Err(NetErr::InvalidDataset("there are no samples to train on".into()));
    }

    let mut loss = 0.;
    for (x, &label) in features.rows().into_iter().zip(labels) {
        loss += train_sample(network, x, label)?;
    }

    network.finish_epoch();

    Ok(loss / features.nrows() as f32)
}

/// Backpropagates a single sample and updates every layer with its deltas.
fn train_sample(network: &mut Network, x: ArrayView1<f32>, label: usize) -> Result<f32> {
    let learning_rate = network.hyperparameters().learning_rate;

    let pass = network.forward(x)?;
    let activations = pass.activations();

    let error = pass.output() - &network.target(label);
    let loss = error.pow2().mean().unwrap_or_default();

    let deltas = deltas(network, activations, error);

    for ((layer, delta), a) in network.layers_mut().iter_mut().zip(&deltas).zip(activations) {
        layer.update(delta.view(), a.view(), learning_rate);
    }

    Ok(loss)
}

/// Computes the delta of every layer, first to last, using the current weights.
fn deltas(network: &Network, activations: &[Array1<f32>], error: Array1<f32>) -> Vec<Array1<f32>> {
    let act_fn = network.hyperparameters().activation;
    let layers = network.layers();
    let n = layers.len();

    // activations[l] is the input of layer l and the output of layer l - 1
    let mut deltas = vec![error * act_fn.derivative(activations[n].view())];
    for l in (1..n).rev() {
        let next = &deltas[deltas.len() - 1];
        let delta = layers[l].backward(next.view()) * act_fn.derivative(activations[l].view());
        deltas.push(delta);
    }

    deltas.reverse();
    deltas
}
