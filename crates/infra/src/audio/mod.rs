//! Audio file adapters built on hound
//!
//! The core only sees decoded mono or stereo float buffers; everything that
//! touches the filesystem lives here:
//! - `wav`: decode to mono, encode mono or stereo 32-bit float
//! - `ir_loader`: build the named impulse-response library from config entries

pub mod ir_loader;
pub mod wav;

pub use ir_loader::load_library;
pub use wav::{read_mono, write_mono, write_stereo};
