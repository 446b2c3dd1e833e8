// src/mirror.rs

use crate::catalog::{self, CommandDescriptor, MAX_NUM_PADS, NUM_COMMANDS};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

/// Host-side belief of the module's parameter state.
///
/// Shared between the control thread and the block callback. Every field is
/// an independent atomic and is clamped before it is stored, so a reader can
/// never observe an out-of-range value. Multi-field reads may be torn, which
/// is fine for display purposes.
#[derive(Debug)]
pub struct ParameterMirror {
    values: [AtomicU8; NUM_COMMANDS],
    selected_pad: AtomicUsize,
    selected_command: AtomicUsize,
    changed: AtomicBool,
}

/// Plain copy of the mirror for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorSnapshot {
    pub selected_pad: usize,
    pub selected_command: usize,
    pub values: [u8; NUM_COMMANDS],
}

impl MirrorSnapshot {
    pub fn selected_descriptor(&self) -> &'static CommandDescriptor {
        &catalog::COMMANDS[self.selected_command.min(NUM_COMMANDS - 1)]
    }

    pub fn selected_value(&self) -> u8 {
        self.values[self.selected_command.min(NUM_COMMANDS - 1)]
    }
}

impl Default for ParameterMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterMirror {
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|_| AtomicU8::new(0)),
            selected_pad: AtomicUsize::new(0),
            selected_command: AtomicUsize::new(0),
            // Start dirty so the first render happens without waiting for input.
            changed: AtomicBool::new(true),
        }
    }

    /// Stores `raw` clamped into the command's range and returns the stored
    /// value. Unknown command indices are ignored.
    #[inline]
    pub fn set_value(&self, command_index: usize, raw: i32) -> Option<u8> {
        let descriptor = catalog::describe(command_index)?;
        let value = descriptor.clamp(raw);
        let previous = self.values[command_index].swap(value, Ordering::Relaxed);
        if previous != value {
            self.changed.store(true, Ordering::Release);
        }
        Some(value)
    }

    #[inline]
    pub fn value(&self, command_index: usize) -> Option<u8> {
        self.values
            .get(command_index)
            .map(|v| v.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn selected_pad(&self) -> usize {
        self.selected_pad.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn selected_command(&self) -> usize {
        self.selected_command.load(Ordering::Relaxed)
    }

    /// Moves the pad selection by `delta` without wrapping. Returns the new pad.
    pub fn navigate_pad(&self, delta: i32) -> usize {
        let pad = step_index(&self.selected_pad, delta, MAX_NUM_PADS);
        self.changed.store(true, Ordering::Release);
        pad
    }

    /// Moves the command selection by `delta` without wrapping. Returns the
    /// new command index.
    pub fn navigate_command(&self, delta: i32) -> usize {
        let command = step_index(&self.selected_command, delta, NUM_COMMANDS);
        self.changed.store(true, Ordering::Release);
        command
    }

    /// Applies `delta` to the selected command's value, clamped, and returns
    /// the descriptor and new value so the caller can send it to the module.
    pub fn adjust_selected(&self, delta: i32) -> (&'static CommandDescriptor, u8) {
        let index = self.selected_command().min(NUM_COMMANDS - 1);
        let descriptor = &catalog::COMMANDS[index];
        let step = |current: u8| Some(descriptor.clamp(current as i32 + delta));
        // The closure never returns None, so both arms carry the previous value.
        let previous = match self.values[index].fetch_update(
            Ordering::AcqRel,
            Ordering::Relaxed,
            step,
        ) {
            Ok(prev) | Err(prev) => prev,
        };
        self.changed.store(true, Ordering::Release);
        (descriptor, descriptor.clamp(previous as i32 + delta))
    }

    pub fn snapshot(&self) -> MirrorSnapshot {
        MirrorSnapshot {
            selected_pad: self.selected_pad(),
            selected_command: self.selected_command(),
            values: std::array::from_fn(|i| self.values[i].load(Ordering::Relaxed)),
        }
    }

    /// Returns whether anything changed since the last call and clears the
    /// flag. This is the render notification.
    #[inline]
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }
}

fn step_index(index: &AtomicUsize, delta: i32, len: usize) -> usize {
    let max = len.saturating_sub(1) as i64;
    let step = |current: usize| Some((current as i64 + delta as i64).clamp(0, max) as usize);
    let previous = match index.fetch_update(Ordering::AcqRel, Ordering::Relaxed, step) {
        Ok(prev) | Err(prev) => prev,
    };
    (previous as i64 + delta as i64).clamp(0, max) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed_at_first_pad_and_command() {
        let mirror = ParameterMirror::new();
        let snapshot = mirror.snapshot();
        assert_eq!(snapshot.selected_pad, 0);
        assert_eq!(snapshot.selected_command, 0);
        assert!(snapshot.values.iter().all(|&v| v == 0));
    }

    #[test]
    fn set_value_clamps_into_range() {
        let mirror = ParameterMirror::new();
        assert_eq!(mirror.set_value(1, 40), Some(31));
        assert_eq!(mirror.value(1), Some(31));
        assert_eq!(mirror.set_value(1, -5), Some(0));
        assert_eq!(mirror.set_value(9, 127), Some(127));
        assert_eq!(mirror.set_value(NUM_COMMANDS, 3), None);
    }

    #[test]
    fn set_value_twice_only_signals_once() {
        let mirror = ParameterMirror::new();
        mirror.take_changed();
        mirror.set_value(2, 12);
        assert!(mirror.take_changed());
        mirror.set_value(2, 12);
        assert!(!mirror.take_changed());
        assert_eq!(mirror.value(2), Some(12));
    }

    #[test]
    fn pad_navigation_stops_at_the_last_pad() {
        let mirror = ParameterMirror::new();
        for _ in 0..8 {
            mirror.navigate_pad(1);
        }
        assert_eq!(mirror.selected_pad(), 7);
        assert_eq!(mirror.navigate_pad(1), 7);
        assert_eq!(mirror.selected_pad(), 7);
    }

    #[test]
    fn selection_never_leaves_its_range() {
        let mirror = ParameterMirror::new();
        let deltas = [-1, -1, 1, 1, 1, -1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, -1];
        for (i, &delta) in deltas.iter().cycle().take(200).enumerate() {
            let pad = mirror.navigate_pad(if i % 3 == 0 { -delta } else { delta });
            let cmd = mirror.navigate_command(delta);
            assert!(pad < MAX_NUM_PADS);
            assert!(cmd < NUM_COMMANDS);
        }
        assert_eq!(mirror.navigate_command(-100), 0);
        assert_eq!(mirror.navigate_command(100), NUM_COMMANDS - 1);
    }

    #[test]
    fn adjust_selected_saturates_at_max() {
        let mirror = ParameterMirror::new();
        mirror.navigate_command(1);
        let (descriptor, value) = (0..35).map(|_| mirror.adjust_selected(1)).last().unwrap();
        assert_eq!(descriptor.device_address, 103);
        assert_eq!(value, 31);
        assert_eq!(mirror.value(1), Some(31));
    }

    #[test]
    fn adjust_selected_does_not_underflow() {
        let mirror = ParameterMirror::new();
        let (descriptor, value) = mirror.adjust_selected(-1);
        assert_eq!(descriptor.name, "type");
        assert_eq!(value, 0);
    }

    #[test]
    fn snapshot_reports_selected_value() {
        let mirror = ParameterMirror::new();
        mirror.navigate_command(1);
        mirror.navigate_command(1);
        mirror.navigate_command(1);
        mirror.navigate_command(1);
        mirror.navigate_command(1);
        mirror.navigate_command(1);
        mirror.set_value(6, 3);
        let snapshot = mirror.snapshot();
        assert_eq!(snapshot.selected_descriptor().name, "curve");
        assert_eq!(snapshot.selected_value(), 3);
    }
}
