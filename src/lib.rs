//! termlens library crate.
//!
//! Renders a live camera source as colored characters in the terminal.
//! The pipeline: the capture subprocess emits a raw pixel byte stream,
//! [`frame::FrameAssembler`] reassembles it into frames, [`view`] maps
//! terminal cells to source pixels under zoom and pan, [`render`] encodes
//! samples into glyph/color cells and writes only the changed ones.

pub mod capture;
pub mod config;
pub mod devices;
pub mod event_loop;
pub mod frame;
pub mod input;
pub mod render;
pub mod terminal;
pub mod view;
