// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Control-plane server (C2): a single-reactor listener that maintains
//! per-flow contexts (C3) and dispatches ALIVE requests to the inference
//! engine (C4), over either a Unix-domain stream or a UDP socket (C6 for
//! framing).

mod dispatch;
mod error;
mod registry;
pub mod transport;

pub use dispatch::{dispatch, DispatchEvent};
pub use error::Error;
pub use registry::FlowRegistry;
