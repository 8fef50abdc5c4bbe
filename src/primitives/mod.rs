//! Low-level primitives shared by the relationship cache.

/// Byte-level utilities and encoding/decoding.
///
/// Hosts the varint codec that packs relationship ids into id blocks.
pub mod bytes;
