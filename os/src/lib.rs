//! Interrupt and exception dispatch core for a single-core x86_64 kernel.
//!
//! Owns the vector table, the 8259 PIC pair and the handler registry, and
//! routes every vector from its entry trampoline to a registered handler.
//! Start at [`interrupts::init`].

#![cfg_attr(not(test), no_std)]

#[macro_use]
pub mod klog;

pub mod arch;
pub mod interrupts;
pub mod serial;

#[cfg(test)]
mod testing;
