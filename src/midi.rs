use crate::processor::RawMidiEvent;
use crate::protocol::MidiMessage;
use anyhow::{anyhow, Result};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort, MidiOutput, MidiOutputPort};
use ringbuf::{HeapConsumer, HeapProducer};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const WRITER_POLL_INTERVAL: Duration = Duration::from_millis(1);

pub fn get_midi_input_ports(client_name: &str) -> Result<Vec<(String, MidiInputPort)>> {
    let midi_in = MidiInput::new(client_name)?;
    let ports = midi_in.ports();
    let mut result = Vec::with_capacity(ports.len());
    for port in ports.iter() {
        let name = midi_in.port_name(port)?;
        result.push((name, port.clone()));
    }
    Ok(result)
}

pub fn get_midi_output_ports(client_name: &str) -> Result<Vec<(String, MidiOutputPort)>> {
    let midi_out = MidiOutput::new(client_name)?;
    let ports = midi_out.ports();
    let mut result = Vec::with_capacity(ports.len());
    for port in ports.iter() {
        let name = midi_out.port_name(port)?;
        result.push((name, port.clone()));
    }
    Ok(result)
}

/// Picks a port: the exact configured name if given, otherwise the first
/// port whose name contains one of `hints` (in hint order), otherwise the
/// first port.
pub fn select_port<'a, P>(
    ports: &'a [(String, P)],
    preferred: Option<&str>,
    hints: &[String],
) -> Option<&'a (String, P)> {
    if let Some(name) = preferred {
        if let Some(found) = ports.iter().find(|(port_name, _)| port_name == name) {
            return Some(found);
        }
        tracing::warn!("configured MIDI port '{}' not found, falling back to hints", name);
    }
    hints
        .iter()
        .find_map(|hint| ports.iter().find(|(port_name, _)| port_name.contains(hint.as_str())))
        .or_else(|| ports.first())
}

/// Opens the inbound connection. Every message is copied into `producer`
/// for the block callback; if the callback falls behind, events are dropped
/// and counted.
pub fn connect_input(
    client_name: &str,
    port: &MidiInputPort,
    mut producer: HeapProducer<RawMidiEvent>,
    overflow_count: Arc<AtomicUsize>,
) -> Result<MidiInputConnection<()>> {
    let mut midi_in = MidiInput::new(client_name)?;
    midi_in.ignore(Ignore::None);

    let port_name = midi_in.port_name(port)?;
    tracing::info!("Opening MIDI input connection to: {}", port_name);

    match midi_in.connect(
        port,
        &format!("{}-in", client_name),
        move |_stamp, message, _| {
            if producer.push(RawMidiEvent::from_slice(message)).is_err() {
                overflow_count.fetch_add(1, Ordering::Relaxed);
            }
        },
        (),
    ) {
        Ok(conn) => Ok(conn),
        Err(e) => Err(anyhow!("Failed to connect to MIDI input port: {}", e)),
    }
}

/// Opens the outbound connection and spawns the thread that forwards events
/// queued by the block callback. The thread owns the connection and closes
/// it once `should_exit` is set.
pub fn spawn_output_writer(
    client_name: &str,
    port: &MidiOutputPort,
    mut consumer: HeapConsumer<MidiMessage>,
    should_exit: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    let midi_out = MidiOutput::new(client_name)?;
    let port_name = midi_out.port_name(port)?;
    tracing::info!("Opening MIDI output connection to: {}", port_name);

    let mut conn = match midi_out.connect(port, &format!("{}-out", client_name)) {
        Ok(conn) => conn,
        Err(e) => return Err(anyhow!("Failed to connect to MIDI output port: {}", e)),
    };

    let handle = thread::Builder::new()
        .name("midi-writer".into())
        .spawn(move || {
            while !should_exit.load(Ordering::Relaxed) {
                while let Some(message) = consumer.pop() {
                    // No retry: the user re-issues the adjustment if it got lost.
                    if let Err(e) = conn.send(&message.to_bytes()) {
                        tracing::warn!(?message, "MIDI send failed: {}", e);
                    }
                }
                thread::sleep(WRITER_POLL_INTERVAL);
            }
            conn.close();
            tracing::info!("MIDI writer thread for '{}' exited gracefully.", port_name);
        })?;
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named_ports(names: &[&str]) -> Vec<(String, usize)> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.to_string(), i))
            .collect()
    }

    fn hints() -> Vec<String> {
        vec!["Edrumulus".to_string(), "ttymidi".to_string()]
    }

    #[test]
    fn exact_name_wins() {
        let ports = named_ports(&["Midi Through", "ttymidi:MIDI_out", "Edrumulus MIDI 1"]);
        let picked = select_port(&ports, Some("Midi Through"), &hints()).unwrap();
        assert_eq!(picked.1, 0);
    }

    #[test]
    fn hints_are_tried_in_order() {
        let ports = named_ports(&["Midi Through", "ttymidi:MIDI_out", "Edrumulus MIDI 1"]);
        assert_eq!(select_port(&ports, None, &hints()).unwrap().1, 2);
        let ports = named_ports(&["Midi Through", "ttymidi:MIDI_out"]);
        assert_eq!(select_port(&ports, Some("missing"), &hints()).unwrap().1, 1);
    }

    #[test]
    fn falls_back_to_first_port() {
        let ports = named_ports(&["Midi Through", "USB Keys"]);
        assert_eq!(select_port(&ports, None, &hints()).unwrap().1, 0);
        let none: Vec<(String, usize)> = Vec::new();
        assert!(select_port(&none, None, &hints()).is_none());
    }
}
