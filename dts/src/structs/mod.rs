//! Data structures describing stream components.
//!
//! Contains the DTS core frame header, the stream parameters derived from
//! it, and the components of a parsed network URL.

pub mod header;
pub mod url;
