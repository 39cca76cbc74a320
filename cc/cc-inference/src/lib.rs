// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Owns a single pre-trained congestion-control policy and serves two
//! calling conventions over it: immediate (synchronous, caller's thread)
//! and batched (enqueue now, evaluated together with whatever coalesces
//! within a fixed interval, replies dispatched from a background worker).

mod engine;
mod error;
mod policy;

pub use engine::{global, install, Engine, ReplyCallback};
pub use error::Error;
pub use policy::{DenseNetPolicy, Policy};
