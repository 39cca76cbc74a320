// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

/// Errors surfaced by the inference engine.
///
/// A model-load error at start-up is fatal to the
/// process (callers should propagate [`Error::ModelLoad`] out of `main`);
/// an evaluation error is fatal only to the one request that triggered it
/// (the engine logs and drops that reply, see [`crate::Engine`]).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load policy checkpoint from {path}: {source}")]
    ModelLoad {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read policy checkpoint file {path}: {source}")]
    ModelFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("policy evaluation failed: {0}")]
    Eval(String),

    #[error("checkpoint layer {layer} shape mismatch: input width {got}, expected {want}")]
    ShapeMismatch {
        layer: usize,
        got: usize,
        want: usize,
    },
}
