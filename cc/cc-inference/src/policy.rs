// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use cc_core::NN_INPUT_SIZE;
use serde::Deserialize;

use crate::Error;

/// A pre-trained congestion-control policy: a pure function from a
/// `NN_INPUT_SIZE`-wide recurrent observation window to a scalar action.
///
/// Implementations must be safe to call from both the caller's thread
/// (immediate mode) and the batching worker thread (batched mode), hence
/// `Send + Sync` rather than `&mut self`.
pub trait Policy: Send + Sync {
    /// Evaluates a single observation.
    fn infer(&self, observation: &[f32; NN_INPUT_SIZE]) -> f32;

    /// Evaluates a batch of observations in enqueue order. The default
    /// implementation calls [`Policy::infer`] once per row; implementations
    /// backed by a real batched tensor runtime should override this for a
    /// single `[N, NN_INPUT_SIZE]` evaluation.
    fn infer_batch(&self, observations: &[[f32; NN_INPUT_SIZE]]) -> Vec<f32> {
        observations.iter().map(|obs| self.infer(obs)).collect()
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Activation {
    Relu,
    Tanh,
    Linear,
}

impl Activation {
    fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Linear => x,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Layer {
    /// `weights[out][in]`.
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    activation: Activation,
}

/// On-disk checkpoint shape. `input_tensor`/`training_flag_tensor`/
/// `output_tensor` are metadata carried over from the model I/O contract
/// (`s0` / `Actor_is_training` / `actor/Mul`) for documentation and
/// diagnostics; none of them drives the forward pass, which is plain
/// matrix-vector arithmetic over `layers`.
#[derive(Debug, Deserialize)]
struct Checkpoint {
    #[serde(default = "default_input_tensor")]
    input_tensor: String,
    #[serde(default = "default_training_flag_tensor")]
    training_flag_tensor: String,
    #[serde(default = "default_output_tensor")]
    output_tensor: String,
    layers: Vec<Layer>,
}

fn default_input_tensor() -> String {
    "s0".to_string()
}
fn default_training_flag_tensor() -> String {
    "Actor_is_training".to_string()
}
fn default_output_tensor() -> String {
    "actor/Mul".to_string()
}

/// A small feed-forward policy, hand-evaluated from a JSON checkpoint.
///
/// Stands in for the frozen TensorFlow graph the original loads by
/// `(graph_path, checkpoint_path)`: no ONNX/TensorFlow/tch binding is
/// grounded anywhere in the retrieval pack, so the policy's *interface*
/// (the [`Policy`] trait, matching `inference_imdt`/`submit`'s two calling
/// conventions) is preserved exactly while its *backend* is a plain dense
/// net evaluated with `Vec<f32>` arithmetic.
#[derive(Debug)]
pub struct DenseNetPolicy {
    input_tensor: String,
    training_flag_tensor: String,
    output_tensor: String,
    layers: Vec<Layer>,
}

impl DenseNetPolicy {
    /// Loads a checkpoint from `path`. A malformed or unreadable checkpoint
    /// is a start-up abort ("model load errors at
    /// start-up abort the process") — this function returns the error for
    /// the caller's `main` to propagate and exit non-zero.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| Error::ModelFile {
            path: path.display().to_string(),
            source,
        })?;
        let checkpoint: Checkpoint =
            serde_json::from_slice(&bytes).map_err(|source| Error::ModelLoad {
                path: path.display().to_string(),
                source,
            })?;

        let mut expected_in = NN_INPUT_SIZE;
        for (i, layer) in checkpoint.layers.iter().enumerate() {
            let got_in = layer.weights.first().map(|row| row.len()).unwrap_or(0);
            if got_in != expected_in {
                return Err(Error::ShapeMismatch {
                    layer: i,
                    got: got_in,
                    want: expected_in,
                });
            }
            expected_in = layer.weights.len();
        }

        Ok(Self {
            input_tensor: checkpoint.input_tensor,
            training_flag_tensor: checkpoint.training_flag_tensor,
            output_tensor: checkpoint.output_tensor,
            layers: checkpoint.layers,
        })
    }

    /// Tensor-name metadata from the checkpoint, for logging/diagnostics.
    pub fn tensor_names(&self) -> (&str, &str, &str) {
        (&self.input_tensor, &self.training_flag_tensor, &self.output_tensor)
    }

    fn forward(&self, observation: &[f32; NN_INPUT_SIZE]) -> Vec<f32> {
        let mut activations: Vec<f32> = observation.to_vec();
        for layer in &self.layers {
            let mut next = Vec::with_capacity(layer.weights.len());
            for (row, &bias) in layer.weights.iter().zip(&layer.bias) {
                let sum: f32 = row.iter().zip(&activations).map(|(w, a)| w * a).sum();
                next.push(layer.activation.apply(sum + bias));
            }
            activations = next;
        }
        activations
    }
}

impl Policy for DenseNetPolicy {
    fn infer(&self, observation: &[f32; NN_INPUT_SIZE]) -> f32 {
        self.forward(observation).first().copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_checkpoint(json: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(json.as_bytes()).unwrap();
        f
    }

    fn identity_checkpoint() -> String {
        // One linear layer: NN_INPUT_SIZE -> 1, weights all zero except the
        // first input, bias zero, so infer() == observation[0].
        let mut row = vec![0.0; NN_INPUT_SIZE];
        row[0] = 1.0;
        serde_json::json!({
            "layers": [{
                "weights": [row],
                "bias": [0.0],
                "activation": "linear",
            }]
        })
        .to_string()
    }

    #[test]
    fn loads_and_evaluates_a_single_linear_layer() {
        let f = write_checkpoint(&identity_checkpoint());
        let policy = DenseNetPolicy::load(f.path()).unwrap();
        let mut obs = [0.0f32; NN_INPUT_SIZE];
        obs[0] = 0.42;
        assert!((policy.infer(&obs) - 0.42).abs() < 1e-6);
    }

    #[test]
    fn tensor_name_metadata_defaults_match_the_model_io_contract() {
        let f = write_checkpoint(&identity_checkpoint());
        let policy = DenseNetPolicy::load(f.path()).unwrap();
        assert_eq!(policy.tensor_names(), ("s0", "Actor_is_training", "actor/Mul"));
    }

    #[test]
    fn shape_mismatch_is_rejected_at_load_time() {
        let bad = serde_json::json!({
            "layers": [{
                "weights": [[1.0, 2.0]],
                "bias": [0.0],
                "activation": "linear",
            }]
        })
        .to_string();
        let f = write_checkpoint(&bad);
        assert!(matches!(
            DenseNetPolicy::load(f.path()),
            Err(Error::ShapeMismatch { layer: 0, .. })
        ));
    }

    #[test]
    fn default_infer_batch_matches_per_row_infer() {
        let f = write_checkpoint(&identity_checkpoint());
        let policy = DenseNetPolicy::load(f.path()).unwrap();
        let mut a = [0.0f32; NN_INPUT_SIZE];
        let mut b = [0.0f32; NN_INPUT_SIZE];
        a[0] = 1.0;
        b[0] = 2.0;
        let batch = policy.infer_batch(&[a, b]);
        assert_eq!(batch, vec![policy.infer(&a), policy.infer(&b)]);
    }
}
