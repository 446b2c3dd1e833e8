//! Parameter synchronisation between a host terminal and an Edrumulus
//! drum-trigger module over MIDI.
//!
//! The protocol core (`catalog`, `mirror`, `outbound`, `protocol`,
//! `processor`, `control`) has no transport dependencies and is driven by
//! tests with synthetic events. `midi` and `audio_io` bind it to real ports
//! and an audio block clock; `app` and `ui` make up the terminal program.

pub mod app;
pub mod audio_io;
pub mod catalog;
pub mod control;
pub mod midi;
pub mod mirror;
pub mod outbound;
pub mod processor;
pub mod protocol;
pub mod settings;
pub mod ui;
