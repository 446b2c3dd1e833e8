// src/processor.rs

use crate::catalog;
use crate::control::ControlContext;
use crate::protocol::{self, MidiMessage};
use ringbuf::{HeapConsumer, HeapProducer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Upper bound on inbound events decoded in one block. Anything beyond stays
/// queued for the next block.
pub const MAX_EVENTS_PER_BLOCK: usize = 64;

/// One byte longer than the longest message we accept, so that over-long
/// messages survive the copy as over-long and get rejected by the decoder.
const RAW_EVENT_BYTES: usize = 4;

const OUT_BUFFER_CAPACITY: usize = 4;

/// Fixed-size copy of an inbound MIDI message, cheap to pass through a ring
/// buffer without allocating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawMidiEvent {
    len: u8,
    bytes: [u8; RAW_EVENT_BYTES],
}

impl RawMidiEvent {
    pub fn from_slice(message: &[u8]) -> Self {
        let len = message.len().min(RAW_EVENT_BYTES);
        let mut bytes = [0; RAW_EVENT_BYTES];
        bytes[..len].copy_from_slice(&message[..len]);
        Self {
            len: len as u8,
            bytes,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

/// Outbound events produced by one block.
#[derive(Debug, Default)]
pub struct MidiEventBuffer {
    events: [MidiMessage; OUT_BUFFER_CAPACITY],
    len: usize,
}

impl MidiEventBuffer {
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Returns false when the buffer is full and the event was not stored.
    #[inline]
    pub fn push(&mut self, message: MidiMessage) -> bool {
        match self.events.get_mut(self.len) {
            Some(slot) => {
                *slot = message;
                self.len += 1;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[MidiMessage] {
        &self.events[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BlockSummary {
    pub applied: usize,
    pub ignored: usize,
    pub sent: Option<MidiMessage>,
}

/// The per-block protocol step.
///
/// Decodes every inbound event into the mirror, then drains the outbound slot
/// into at most one control-change event in `out`. `out` is cleared first, so
/// nothing from an earlier block is ever sent twice. Never allocates, never
/// blocks, and treats every malformed or unknown event as noise.
pub fn process_block<'a, I>(
    context: &ControlContext,
    inbound: I,
    out: &mut MidiEventBuffer,
) -> BlockSummary
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut summary = BlockSummary::default();

    for bytes in inbound {
        let matched = protocol::decode_report(bytes).and_then(|report| {
            catalog::lookup_by_device_address(report.device_address)
                .map(|index| (index, report.value))
        });
        match matched {
            Some((index, value)) => {
                context.mirror.set_value(index, value as i32);
                summary.applied += 1;
            }
            None => summary.ignored += 1,
        }
    }

    out.clear();
    if let Some(command) = context.outbound.drain() {
        let message = MidiMessage::parameter_set(command);
        out.push(message);
        summary.sent = Some(message);
    }

    summary
}

/// Binds `process_block` to the transport's lock-free queues. Owned by the
/// audio callback.
pub struct MidiProcessor {
    context: Arc<ControlContext>,
    inbound: HeapConsumer<RawMidiEvent>,
    outbound: HeapProducer<MidiMessage>,
    scratch: [RawMidiEvent; MAX_EVENTS_PER_BLOCK],
    out_buffer: MidiEventBuffer,
    dropped_sends: Arc<AtomicUsize>,
}

impl MidiProcessor {
    pub fn new(
        context: Arc<ControlContext>,
        inbound: HeapConsumer<RawMidiEvent>,
        outbound: HeapProducer<MidiMessage>,
        dropped_sends: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            context,
            inbound,
            outbound,
            scratch: [RawMidiEvent::default(); MAX_EVENTS_PER_BLOCK],
            out_buffer: MidiEventBuffer::default(),
            dropped_sends,
        }
    }

    pub fn run_block(&mut self) -> BlockSummary {
        let count = self.inbound.pop_slice(&mut self.scratch);
        let summary = process_block(
            &self.context,
            self.scratch[..count].iter().map(RawMidiEvent::as_bytes),
            &mut self.out_buffer,
        );
        for message in self.out_buffer.as_slice() {
            if self.outbound.push(*message).is_err() {
                // writer thread fell behind
                self.dropped_sends.fetch_add(1, Ordering::Relaxed);
            }
        }
        summary
    }
}
