// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

/// Errors surfaced by the shared flow/observation/message types.
///
/// Transport- and inference-specific errors live in their own crates;
/// this enum only covers malformed data that can be detected without
/// any I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed telemetry JSON: {0}")]
    MalformedTelemetry(#[from] serde_json::Error),

    #[error("unknown message type: {0}")]
    UnknownMessageType(u8),

    #[error("ALIVE message is missing its state object")]
    MissingState,
}
