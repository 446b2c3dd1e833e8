// src/protocol.rs

use crate::outbound::OutboundCommand;

/// MIDI channel 10, zero based.
pub const PARAMETER_CHANNEL: u8 = 9;

pub const NOTE_OFF: u8 = 0x80;
pub const CONTROL_CHANGE: u8 = 0xB0;

/// Module -> host: note-off on channel 10, note = address, velocity = value.
pub const REPORT_STATUS: u8 = NOTE_OFF | PARAMETER_CHANNEL;
/// Host -> module: control change on channel 10 (185).
pub const SET_STATUS: u8 = CONTROL_CHANGE | PARAMETER_CHANNEL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MidiMessage {
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

impl MidiMessage {
    /// Accepts exactly three bytes.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match *bytes {
            [status, data1, data2] => Some(Self {
                status,
                data1,
                data2,
            }),
            _ => None,
        }
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 3] {
        [self.status, self.data1, self.data2]
    }

    #[inline]
    pub fn parameter_set(command: OutboundCommand) -> Self {
        Self {
            status: SET_STATUS,
            data1: command.device_address,
            data2: command.value,
        }
    }
}

/// A module reporting the current value of one of its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterReport {
    pub device_address: u8,
    pub value: u8,
}

/// Recognises a parameter report. Anything else (wrong length, other status
/// or channel) yields `None` and is meant to be dropped.
///
/// A musical note-off on channel 10 is indistinguishable from a report; the
/// module is expected never to send one.
#[inline]
pub fn decode_report(bytes: &[u8]) -> Option<ParameterReport> {
    let message = MidiMessage::from_bytes(bytes)?;
    if message.status != REPORT_STATUS {
        return None;
    }
    Some(ParameterReport {
        device_address: message.data1,
        value: message.data2,
    })
}
