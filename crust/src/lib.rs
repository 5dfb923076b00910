//! Freestanding support bits shared by the kernel crates.
//!
//! This crate carries the pieces that every kernel service leans on but that
//! have no hardware in them: the once-only module initialization pattern and
//! a lazily-initialized mutex. It also re-exports the boot and logging crates
//! so the kernel pulls them from one place.
#![no_std]

mod module;
mod oncemut;

pub use module::KernelModule;
pub use oncemut::OnceMutex;

pub use limine;
pub use log;
pub use spin;
