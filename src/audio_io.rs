// src/audio_io.rs

use crate::processor::MidiProcessor;
use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, FromSample, HostId, Sample, SampleFormat, Stream, StreamConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Resolves the configured host by name, defaulting to JACK when it is
/// available and to the platform default otherwise.
pub fn resolve_host_id(host_name: Option<&str>) -> HostId {
    let available = cpal::available_hosts();
    if let Some(name) = host_name {
        if let Some(id) = available.iter().find(|id| id.name() == name) {
            return *id;
        }
        tracing::warn!("Audio host '{}' not available, using default", name);
    }
    available
        .iter()
        .find(|id| id.name().eq_ignore_ascii_case("jack"))
        .copied()
        .unwrap_or_else(|| cpal::default_host().id())
}

/// Opens an output stream whose callback is the real-time MIDI block clock.
/// The audio itself is silence; each callback runs exactly one block of the
/// MIDI processor. Returns the stream with the active sample rate and block
/// size.
pub fn init_and_run_stream(
    host_id: HostId,
    output_device_name: Option<&str>,
    requested_sample_rate: Option<u32>,
    requested_buffer_size: Option<u32>,
    processor: MidiProcessor,
    xrun_count: Arc<AtomicUsize>,
) -> Result<(Stream, u32, u32)> {
    let host = cpal::host_from_id(host_id)?;
    let output_device = if let Some(name) = output_device_name {
        host.output_devices()?
            .find(|d| d.name().ok().as_deref() == Some(name))
            .ok_or_else(|| anyhow::anyhow!("Output device not found: {}", name))?
    } else {
        host.default_output_device()
            .ok_or_else(|| anyhow::anyhow!("No default output device"))?
    };
    tracing::info!("Using output device: {}", output_device.name()?);

    let default_output_config = output_device.default_output_config()?;
    let sample_format = default_output_config.sample_format();

    let mut config: StreamConfig = default_output_config.into();
    if let Some(sr) = requested_sample_rate {
        config.sample_rate = cpal::SampleRate(sr);
    }
    if let Some(bs) = requested_buffer_size {
        config.buffer_size = BufferSize::Fixed(bs);
    }

    let stream = match sample_format {
        SampleFormat::F32 => build_block_stream::<f32>(&output_device, &config, processor, xrun_count)?,
        SampleFormat::I16 => build_block_stream::<i16>(&output_device, &config, processor, xrun_count)?,
        SampleFormat::U16 => build_block_stream::<u16>(&output_device, &config, processor, xrun_count)?,
        format => return Err(anyhow::anyhow!("Unsupported sample format {}", format)),
    };
    stream.play()?;

    let active_sr = config.sample_rate.0;
    let active_bs = match config.buffer_size {
        BufferSize::Fixed(size) => size,
        BufferSize::Default => 512, // A reasonable assumption if default
    };

    tracing::info!(
        "Started block clock with Sample Rate: {} Hz, Buffer Size: {} Samples",
        active_sr,
        active_bs
    );

    Ok((stream, active_sr, active_bs))
}

fn build_block_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mut processor: MidiProcessor,
    xrun_count: Arc<AtomicUsize>,
) -> Result<Stream>
where
    T: Sample + cpal::SizedSample + FromSample<f32> + Send + 'static,
{
    let err_fn = move |err| {
        tracing::error!("an error occurred on output stream: {}", err);
        xrun_count.fetch_add(1, Ordering::Relaxed);
    };
    let silence = T::from_sample(0.0f32);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            processor.run_block();
            data.fill(silence);
        },
        err_fn,
        None,
    )?;
    Ok(stream)
}
