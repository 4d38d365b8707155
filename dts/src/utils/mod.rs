//! Utility functions and supporting infrastructure.
//!
//! Provides bitstream I/O, error handling, percent escaping and
//! timestamp computation.

pub mod bitstream_io;
pub mod errors;
pub mod escape;
pub mod timing;
