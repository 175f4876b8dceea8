//! Outer I/O layer: recordings and RR lists from disk or memory.

pub mod text;
pub mod wav;
