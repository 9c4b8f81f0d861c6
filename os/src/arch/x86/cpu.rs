//! CPU-level operations the interrupt core depends on.

use x86_64::instructions::{hlt, interrupts, tables};
use x86_64::registers::control::Cr2;
use x86_64::registers::segmentation::{Segment, CS};
use x86_64::structures::DescriptorTablePointer;

use super::port::{PortIo, Ports};

/// Everything the interrupt core needs from the machine beyond port I/O.
///
/// [`X86`] is the real processor. Tests substitute a recorder so remap
/// order, EOI traffic and table loads can be checked without hardware.
pub trait Platform: PortIo {
    /// Point IDTR at `pointer`.
    ///
    /// # Safety
    /// The table behind `pointer` must stay valid and unmoved for as long as
    /// interrupts can be delivered.
    unsafe fn load_interrupt_table(&self, pointer: &DescriptorTablePointer);

    /// Set the interrupt flag (`sti`).
    fn enable_interrupts(&self);

    /// Run `f` with maskable interrupts off, restoring the previous state.
    fn without_interrupts<R, F: FnOnce() -> R>(&self, f: F) -> R;

    /// The code selector live right now. Gates jump through it.
    fn code_selector(&self) -> u16;

    /// Linear address of the last page fault (CR2).
    fn fault_address(&self) -> u64;
}

/// The x86_64 processor this kernel runs on.
#[derive(Debug, Default, Clone, Copy)]
pub struct X86 {
    ports: Ports,
}

impl X86 {
    pub const fn new() -> Self {
        Self { ports: Ports }
    }
}

impl PortIo for X86 {
    unsafe fn read_u8(&self, port: u16) -> u8 {
        self.ports.read_u8(port)
    }

    unsafe fn write_u8(&self, port: u16, value: u8) {
        self.ports.write_u8(port, value)
    }

    unsafe fn read_u16(&self, port: u16) -> u16 {
        self.ports.read_u16(port)
    }

    unsafe fn write_u16(&self, port: u16, value: u16) {
        self.ports.write_u16(port, value)
    }

    unsafe fn read_u32(&self, port: u16) -> u32 {
        self.ports.read_u32(port)
    }

    unsafe fn write_u32(&self, port: u16, value: u32) {
        self.ports.write_u32(port, value)
    }
}

impl Platform for X86 {
    unsafe fn load_interrupt_table(&self, pointer: &DescriptorTablePointer) {
        tables::lidt(pointer);
    }

    fn enable_interrupts(&self) {
        interrupts::enable();
    }

    fn without_interrupts<R, F: FnOnce() -> R>(&self, f: F) -> R {
        interrupts::without_interrupts(f)
    }

    fn code_selector(&self) -> u16 {
        CS::get_reg().0
    }

    fn fault_address(&self) -> u64 {
        Cr2::read_raw()
    }
}

/// Stop this CPU for good: interrupts off, then `hlt` forever.
pub fn halt_forever() -> ! {
    interrupts::disable();
    loop {
        hlt();
    }
}
