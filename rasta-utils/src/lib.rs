/// Explicit little-endian byte-level field access for wire formats.
pub mod bytes;
