//! x86_64 primitives used by the interrupt core: port I/O, the CPU
//! operations behind [`cpu::Platform`], and the GDT/TSS the gates point into.

pub mod cpu;
pub mod gdt;
pub mod port;
