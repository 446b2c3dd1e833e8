// src/app.rs

use crate::audio_io;
use crate::control::ControlContext;
use crate::midi;
use crate::processor::{MidiProcessor, RawMidiEvent};
use crate::protocol::MidiMessage;
use crate::settings::AppSettings;
use anyhow::{anyhow, Context, Result};
use cpal::Stream;
use midir::MidiInputConnection;
use ringbuf::HeapRb;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

const INBOUND_QUEUE_CAPACITY: usize = 1024;
const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// One running transport session: MIDI ports, the block clock stream and the
/// context they share. Dropping the session tears it down in order.
pub struct Session {
    context: Arc<ControlContext>,
    _output_stream: Option<Stream>,
    _midi_connection: Option<MidiInputConnection<()>>,
    writer_handle: Option<JoinHandle<()>>,
    should_exit: Arc<AtomicBool>,
    xrun_count: Arc<AtomicUsize>,
    inbound_overflow: Arc<AtomicUsize>,
    dropped_sends: Arc<AtomicUsize>,
}

impl Session {
    pub fn start(settings: &AppSettings) -> Result<Self> {
        let client_name = settings.client_name.as_str();
        let mut session = Self {
            context: Arc::new(ControlContext::new()),
            _output_stream: None,
            _midi_connection: None,
            writer_handle: None,
            should_exit: Arc::new(AtomicBool::new(false)),
            xrun_count: Arc::new(AtomicUsize::new(0)),
            inbound_overflow: Arc::new(AtomicUsize::new(0)),
            dropped_sends: Arc::new(AtomicUsize::new(0)),
        };

        let input_ports = midi::get_midi_input_ports(client_name)?;
        let output_ports = midi::get_midi_output_ports(client_name)?;
        for (name, _) in &input_ports {
            tracing::debug!("MIDI input port available: {}", name);
        }
        for (name, _) in &output_ports {
            tracing::debug!("MIDI output port available: {}", name);
        }

        let (_, input_port) = midi::select_port(
            &input_ports,
            settings.midi_input_port.as_deref(),
            &settings.port_hints,
        )
        .ok_or_else(|| anyhow!("No MIDI input port available"))?;
        let (_, output_port) = midi::select_port(
            &output_ports,
            settings.midi_output_port.as_deref(),
            &settings.port_hints,
        )
        .ok_or_else(|| anyhow!("No MIDI output port available"))?;

        let (inbound_producer, inbound_consumer) =
            HeapRb::<RawMidiEvent>::new(INBOUND_QUEUE_CAPACITY).split();
        let (outbound_producer, outbound_consumer) =
            HeapRb::<MidiMessage>::new(OUTBOUND_QUEUE_CAPACITY).split();

        session.writer_handle = Some(midi::spawn_output_writer(
            client_name,
            output_port,
            outbound_consumer,
            session.should_exit.clone(),
        )?);
        session._midi_connection = Some(midi::connect_input(
            client_name,
            input_port,
            inbound_producer,
            session.inbound_overflow.clone(),
        )?);

        let processor = MidiProcessor::new(
            session.context.clone(),
            inbound_consumer,
            outbound_producer,
            session.dropped_sends.clone(),
        );
        let host_id = audio_io::resolve_host_id(settings.host_name.as_deref());
        tracing::info!("Using audio host: {}", host_id.name());
        let (stream, _, _) = audio_io::init_and_run_stream(
            host_id,
            settings.output_device.as_deref(),
            settings.sample_rate,
            settings.buffer_size,
            processor,
            session.xrun_count.clone(),
        )
        .context("Failed to start the audio block clock")?;
        session._output_stream = Some(stream);

        Ok(session)
    }

    pub fn context(&self) -> &ControlContext {
        &self.context
    }

    /// Stops the block callback first, then the MIDI side. Safe to call twice.
    pub fn stop(&mut self) {
        let was_running = self._output_stream.is_some() || self.writer_handle.is_some();
        self._output_stream.take();
        if let Some(connection) = self._midi_connection.take() {
            connection.close();
        }
        self.should_exit.store(true, Ordering::Relaxed);
        if let Some(handle) = self.writer_handle.take() {
            if let Err(e) = handle.join() {
                tracing::error!("Error joining MIDI writer thread: {:?}", e);
            }
        }
        if was_running {
            tracing::info!(
                stream_errors = self.xrun_count.load(Ordering::Relaxed),
                inbound_overflow = self.inbound_overflow.load(Ordering::Relaxed),
                dropped_sends = self.dropped_sends.load(Ordering::Relaxed),
                "Transport session stopped."
            );
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}
