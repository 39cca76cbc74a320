//! Shared data model for the congestion-control plane: per-flow sliding
//! observation state, the feature transform that turns raw kernel telemetry
//! into a fixed-width vector, the policy action mapping, and the JSON wire
//! messages exchanged between the sender driver and the control-plane
//! server.

mod action;
mod error;
mod flow;
mod message;
mod observation;

pub use action::map_action;
pub use error::Error;
pub use flow::FlowContext;
pub use message::{ClientMessage, MessageType, ServerMessage};
pub use observation::Telemetry;

/// Width of a single normalized observation vector.
pub const STATE_SIZE: usize = 10;
/// Number of observations retained in the sliding recurrent window.
pub const RECURRENT_NUM: usize = 5;
/// Width of the recurrent window handed to the policy (`STATE_SIZE * RECURRENT_NUM`).
pub const NN_INPUT_SIZE: usize = STATE_SIZE * RECURRENT_NUM;
/// TCP MSS assumed by the observation transform, in bytes.
pub const MSS_BYTES: f64 = 1460.0;

pub type Result<T, E = Error> = core::result::Result<T, E>;
