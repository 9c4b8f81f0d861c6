//! Port-mapped I/O.
//!
//! [`PortIo`] is the only way this crate talks to devices, so the same
//! controller and dispatch code runs against real ports or a recorder.

use x86_64::instructions::port::Port;

/// 8/16/32-bit port reads and writes.
///
/// # Safety
///
/// Every method is unsafe for the same reason `in`/`out` are: the caller
/// must know what the device behind `port` does with the access.
pub trait PortIo {
    unsafe fn read_u8(&self, port: u16) -> u8;
    unsafe fn write_u8(&self, port: u16, value: u8);
    unsafe fn read_u16(&self, port: u16) -> u16;
    unsafe fn write_u16(&self, port: u16, value: u16);
    unsafe fn read_u32(&self, port: u16) -> u32;
    unsafe fn write_u32(&self, port: u16, value: u32);

    /// Waits roughly one microsecond by writing to the unused POST port.
    ///
    /// Old 8259 parts need this between initialization words.
    unsafe fn io_wait(&self) {
        self.write_u8(POST_PORT, 0);
    }
}

/// Diagnostic port, free to write on every PC.
pub const POST_PORT: u16 = 0x80;

/// The machine's real I/O ports.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ports;

impl PortIo for Ports {
    #[inline(always)]
    unsafe fn read_u8(&self, port: u16) -> u8 {
        Port::<u8>::new(port).read()
    }

    #[inline(always)]
    unsafe fn write_u8(&self, port: u16, value: u8) {
        Port::<u8>::new(port).write(value)
    }

    #[inline(always)]
    unsafe fn read_u16(&self, port: u16) -> u16 {
        Port::<u16>::new(port).read()
    }

    #[inline(always)]
    unsafe fn write_u16(&self, port: u16, value: u16) {
        Port::<u16>::new(port).write(value)
    }

    #[inline(always)]
    unsafe fn read_u32(&self, port: u16) -> u32 {
        Port::<u32>::new(port).read()
    }

    #[inline(always)]
    unsafe fn write_u32(&self, port: u16, value: u32) {
        Port::<u32>::new(port).write(value)
    }
}
