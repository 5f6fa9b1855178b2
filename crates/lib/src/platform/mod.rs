//! Host detection and cross-compilation targets.

pub mod os;
pub mod target;

pub use os::HostOs;
pub use target::Compile;
