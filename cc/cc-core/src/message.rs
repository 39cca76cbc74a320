// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{Error, Telemetry};
use serde::{Deserialize, Serialize};

/// Wire values for the `type` field of a client message. Part of the wire
/// contract — do not renumber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Init = 0,
    Start = 1,
    End = 2,
    Alive = 3,
    Observe = 4,
}

impl TryFrom<u8> for MessageType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageType::Init),
            1 => Ok(MessageType::Start),
            2 => Ok(MessageType::End),
            3 => Ok(MessageType::Alive),
            4 => Ok(MessageType::Observe),
            other => Err(Error::UnknownMessageType(other)),
        }
    }
}

/// The raw shape of every client -> server message: a `type` tag plus the
/// fields relevant to that type. Unknown fields (and unknown `type` values,
/// handled one level up) are ignored rather than rejected.
#[derive(Clone, Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: u8,
    flow_id: u64,
    #[serde(default)]
    state: Option<Telemetry>,
}

/// A decoded client -> server message.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientMessage {
    Start { flow_id: u64 },
    Alive { flow_id: u64, state: Telemetry },
    End { flow_id: u64 },
    /// `INIT`/`OBSERVE` are part of the wire contract but carry no handling
    /// rule in this control plane; the server silently ignores them.
    Ignored,
}

impl ClientMessage {
    /// Parses one JSON payload (already framed, length-prefix stripped) into
    /// a `ClientMessage`. Unknown `type` values decode as `Ignored` rather
    /// than erroring, matching the "unknown types are silently ignored"
    /// wire contract.
    pub fn parse(payload: &[u8]) -> Result<Self, Error> {
        let envelope: Envelope = serde_json::from_slice(payload)?;
        let kind = match MessageType::try_from(envelope.kind) {
            Ok(kind) => kind,
            Err(_) => return Ok(ClientMessage::Ignored),
        };

        Ok(match kind {
            MessageType::Start => ClientMessage::Start {
                flow_id: envelope.flow_id,
            },
            MessageType::Alive => ClientMessage::Alive {
                flow_id: envelope.flow_id,
                state: envelope.state.ok_or(Error::MissingState)?,
            },
            MessageType::End => ClientMessage::End {
                flow_id: envelope.flow_id,
            },
            MessageType::Init | MessageType::Observe => ClientMessage::Ignored,
        })
    }
}

/// A server -> client reply.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    StartAck { flow_id: u64 },
    AliveAck { flow_id: u64, cwnd: u32 },
}

impl ServerMessage {
    pub fn to_json_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("reply payloads always serialize")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start() {
        let msg = ClientMessage::parse(br#"{"type":1,"flow_id":42,"state":null}"#).unwrap();
        assert_eq!(msg, ClientMessage::Start { flow_id: 42 });
    }

    #[test]
    fn parses_end() {
        let msg = ClientMessage::parse(br#"{"type":2,"flow_id":42}"#).unwrap();
        assert_eq!(msg, ClientMessage::End { flow_id: 42 });
    }

    #[test]
    fn unknown_type_is_ignored_not_an_error() {
        let msg = ClientMessage::parse(br#"{"type":99,"flow_id":1}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ignored);
    }

    #[test]
    fn alive_round_trips_reply() {
        let reply = ServerMessage::AliveAck {
            flow_id: 42,
            cwnd: 37,
        };
        let json = String::from_utf8(reply.to_json_bytes()).unwrap();
        assert!(json.contains("\"flow_id\":42"));
        assert!(json.contains("\"cwnd\":37"));
    }
}
