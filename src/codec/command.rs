//! Outbound MCU command packets.
//!
//! Wire format: `$<commandId>,<stateId>,<param1>,<param2>*<HH>\r\n`, where
//! `HH` is the XOR of the payload's ASCII bytes in two uppercase hex digits.

use bytes::Bytes;
use std::fmt;

use crate::{LinkError, Result};

/// Device commands understood by the MCU firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McuCommand {
    StartMeasurement,
    StopMeasurement,
    ResetSystem,
    GetStatus,
    SetMode { state: i32, param1: i32, param2: i32 },
    Calibrate,
    GetState { state: i32 },
}

impl McuCommand {
    pub fn packet(self) -> CommandPacket {
        match self {
            McuCommand::StartMeasurement => CommandPacket::new(0, 0, 0, 0),
            McuCommand::StopMeasurement => CommandPacket::new(1, 0, 0, 0),
            McuCommand::ResetSystem => CommandPacket::new(2, 0, 0, 0),
            McuCommand::GetStatus => CommandPacket::new(3, 0, 0, 0),
            McuCommand::SetMode { state, param1, param2 } => {
                CommandPacket::new(4, state, param1, param2)
            }
            McuCommand::Calibrate => CommandPacket::new(5, 3, 0, 0),
            McuCommand::GetState { state } => CommandPacket::new(6, state, 0, 0),
        }
    }
}

impl From<McuCommand> for CommandPacket {
    fn from(command: McuCommand) -> Self {
        command.packet()
    }
}

/// One framed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandPacket {
    pub command_id: i32,
    pub state_id: i32,
    pub param1: i32,
    pub param2: i32,
}

impl CommandPacket {
    pub fn new(command_id: i32, state_id: i32, param1: i32, param2: i32) -> Self {
        Self { command_id, state_id, param1, param2 }
    }

    /// `commandId,stateId,param1,param2`
    pub fn payload(&self) -> String {
        format!("{},{},{},{}", self.command_id, self.state_id, self.param1, self.param2)
    }

    pub fn checksum(&self) -> u8 {
        xor_checksum(self.payload().as_bytes())
    }

    /// The full wire packet, including the trailing `\r\n`.
    pub fn encode(&self) -> String {
        let payload = self.payload();
        format!("${}*{:02X}\r\n", payload, xor_checksum(payload.as_bytes()))
    }

    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(self.encode())
    }

    /// Parse a wire packet, verifying its checksum. The line ending is optional.
    pub fn parse(packet: &str) -> Result<Self> {
        let body = packet.trim_end_matches(['\r', '\n']);
        let body = body
            .strip_prefix('$')
            .ok_or_else(|| LinkError::parse("Command packet", "missing '$' prefix"))?;
        let (payload, checksum) = body
            .split_once('*')
            .ok_or_else(|| LinkError::parse("Command packet", "missing '*' checksum separator"))?;

        let expected = u8::from_str_radix(checksum, 16).map_err(|err| {
            LinkError::parse("Command packet", format!("invalid checksum '{}': {}", checksum, err))
        })?;
        let actual = xor_checksum(payload.as_bytes());
        if expected != actual {
            return Err(LinkError::parse(
                "Command packet",
                format!("checksum mismatch: expected {:02X}, computed {:02X}", expected, actual),
            ));
        }

        let fields = payload
            .split(',')
            .map(|field| {
                field.trim().parse::<i32>().map_err(|err| {
                    LinkError::parse("Command packet", format!("invalid field '{}': {}", field, err))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        match fields.as_slice() {
            &[command_id, state_id, param1, param2] => {
                Ok(Self::new(command_id, state_id, param1, param2))
            }
            _ => Err(LinkError::parse(
                "Command packet",
                format!("expected 4 fields, found {}", fields.len()),
            )),
        }
    }
}

impl fmt::Display for CommandPacket {
    /// Renders the packet with `\r` and `\n` escaped, as it appears in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode().replace('\r', "\\r").replace('\n', "\\n"))
    }
}

/// XOR of all bytes.
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, byte| acc ^ byte)
}
