// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

/// Errors surfaced by the sender-side control driver and its peers.
///
/// A tick timeout or a transport hiccup skips the current
/// control cycle rather than tearing anything down; the variant that
/// matters to callers deciding whether to keep running is
/// [`Error::ControlChannelClosed`]. The CLI's own fatal-at-start-up checks
/// (missing required flags, missing model/helper paths) are reported as
/// plain strings out of `main` rather than through this enum.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("control-plane transport error: {0}")]
    Transport(#[from] cc_codec::Error),

    #[error(transparent)]
    Message(#[from] cc_core::Error),

    #[error("control-plane message encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("control channel closed")]
    ControlChannelClosed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
