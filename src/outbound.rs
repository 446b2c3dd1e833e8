// src/outbound.rs

use std::sync::atomic::{AtomicU32, Ordering};

const PENDING: u32 = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboundCommand {
    pub device_address: u8,
    pub value: u8,
}

impl OutboundCommand {
    pub fn new(device_address: u8, value: u8) -> Self {
        Self {
            device_address,
            value,
        }
    }

    #[inline]
    fn pack(self) -> u32 {
        PENDING | (self.device_address as u32) << 8 | self.value as u32
    }

    #[inline]
    fn unpack(packed: u32) -> Option<Self> {
        if packed & PENDING == 0 {
            return None;
        }
        Some(Self {
            device_address: (packed >> 8) as u8,
            value: packed as u8,
        })
    }
}

/// Single-entry mailbox from the control thread to the block callback.
///
/// Address, value and the pending flag share one atomic word, so a post is
/// never observed half written. A post before the previous one was drained
/// replaces it: only the latest user intent is worth sending.
#[derive(Debug, Default)]
pub struct OutboundSlot {
    packed: AtomicU32,
}

impl OutboundSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `command`, returning the pending command it replaced, if any.
    #[inline]
    pub fn post(&self, command: OutboundCommand) -> Option<OutboundCommand> {
        OutboundCommand::unpack(self.packed.swap(command.pack(), Ordering::AcqRel))
    }

    /// Takes the pending command and leaves the slot empty. Block callback only.
    #[inline]
    pub fn drain(&self) -> Option<OutboundCommand> {
        OutboundCommand::unpack(self.packed.swap(0, Ordering::AcqRel))
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.packed.load(Ordering::Acquire) & PENDING != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn empty_slot_drains_nothing() {
        let slot = OutboundSlot::new();
        assert!(!slot.is_pending());
        assert_eq!(slot.drain(), None);
    }

    #[test]
    fn drain_takes_exactly_once() {
        let slot = OutboundSlot::new();
        assert_eq!(slot.post(OutboundCommand::new(103, 31)), None);
        assert!(slot.is_pending());
        assert_eq!(slot.drain(), Some(OutboundCommand::new(103, 31)));
        assert_eq!(slot.drain(), None);
    }

    #[test]
    fn second_post_replaces_the_first() {
        let slot = OutboundSlot::new();
        slot.post(OutboundCommand::new(103, 4));
        let replaced = slot.post(OutboundCommand::new(108, 2));
        assert_eq!(replaced, Some(OutboundCommand::new(103, 4)));
        assert_eq!(slot.drain(), Some(OutboundCommand::new(108, 2)));
        assert_eq!(slot.drain(), None);
    }

    #[test]
    fn zero_address_and_value_still_count_as_pending() {
        let slot = OutboundSlot::new();
        slot.post(OutboundCommand::new(0, 0));
        assert_eq!(slot.drain(), Some(OutboundCommand::new(0, 0)));
    }

    #[test]
    fn concurrent_posts_never_tear() {
        let slot = Arc::new(OutboundSlot::new());
        let writer = {
            let slot = slot.clone();
            thread::spawn(move || {
                for v in 0..10_000u32 {
                    let v = (v % 128) as u8;
                    slot.post(OutboundCommand::new(v, v));
                }
            })
        };
        let mut seen = 0;
        while !writer.is_finished() || slot.is_pending() {
            if let Some(cmd) = slot.drain() {
                assert_eq!(cmd.device_address, cmd.value);
                seen += 1;
            }
        }
        writer.join().unwrap();
        assert!(seen >= 1);
    }
}
