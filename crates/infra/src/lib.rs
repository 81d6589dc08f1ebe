//! Earworks infrastructure: audio file adapters

pub mod audio;

pub use audio::{ir_loader, wav};
