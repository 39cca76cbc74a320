// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

/// Errors surfaced by the control-plane server's transport and protocol
/// glue. None of these are fatal to the process: the
/// reactor logs and either closes the offending session (stream) or drops
/// the offending datagram (UDP).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] cc_codec::Error),

    #[error(transparent)]
    Message(#[from] cc_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
