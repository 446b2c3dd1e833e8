// src/catalog.rs

use std::borrow::Cow;

pub const MAX_NUM_PADS: usize = 8;

/// Address used to tell the module which pad the following commands apply to.
pub const PAD_SELECT_ADDRESS: u8 = 108;

pub const PAD_TYPES: [&str; 18] = [
    "PD120", "PD80R", "PD8", "FD8", "VH12", "VH12CTRL", "KD7", "TP80", "CY6", "CY8", "DIABOLO12",
    "CY5", "HD1TOM", "PD6", "KD8", "PDX8", "KD120", "PD5",
];

pub const CURVE_TYPES: [&str; 5] = ["LINEAR", "EXP1", "EXP2", "LOG1", "LOG2"];

/// How a command's numeric value is presented to the user.
/// Transport is always the raw number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    PadType,
    Curve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub device_address: u8,
    /// Inclusive upper bound; the lower bound is always zero.
    pub max_value: u8,
    pub kind: ValueKind,
}

const fn command(
    name: &'static str,
    device_address: u8,
    max_value: u8,
    kind: ValueKind,
) -> CommandDescriptor {
    CommandDescriptor {
        name,
        device_address,
        max_value,
        kind,
    }
}

pub const NUM_COMMANDS: usize = 12;

pub static COMMANDS: [CommandDescriptor; NUM_COMMANDS] = [
    command("type", 102, PAD_TYPES.len() as u8 - 1, ValueKind::PadType),
    command("thresh", 103, 31, ValueKind::Number),
    command("sens", 104, 31, ValueKind::Number),
    command("pos thres", 105, 31, ValueKind::Number),
    command("pos sens", 106, 31, ValueKind::Number),
    command("rim thres", 107, 31, ValueKind::Number),
    command("curve", 109, CURVE_TYPES.len() as u8 - 1, ValueKind::Curve),
    command("spike", 110, 4, ValueKind::Number),
    command("rim/pos", 111, 3, ValueKind::Number),
    command("note", 112, 127, ValueKind::Number),
    command("note rim", 113, 127, ValueKind::Number),
    command("cross", 114, 31, ValueKind::Number),
];

impl CommandDescriptor {
    #[inline]
    pub fn clamp(&self, raw: i32) -> u8 {
        raw.clamp(0, self.max_value as i32) as u8
    }

    /// Human readable form of `value`, resolving enumeration names where the
    /// command indexes one.
    pub fn label(&self, value: u8) -> Cow<'static, str> {
        let names: &[&'static str] = match self.kind {
            ValueKind::Number => &[],
            ValueKind::PadType => &PAD_TYPES,
            ValueKind::Curve => &CURVE_TYPES,
        };
        match names.get(value as usize) {
            Some(name) => Cow::Borrowed(*name),
            None => Cow::Owned(value.to_string()),
        }
    }
}

#[inline]
pub fn describe(command_index: usize) -> Option<&'static CommandDescriptor> {
    COMMANDS.get(command_index)
}

/// Reverse lookup used when decoding parameter reports. `None` means the
/// event should be ignored.
#[inline]
pub fn lookup_by_device_address(address: u8) -> Option<usize> {
    COMMANDS
        .iter()
        .position(|cmd| cmd.device_address == address)
}
