//! Serial port (COM1 @ 0x3F8) for debug output. Primary log channel.

use spin::Mutex;
use uart_16550::SerialPort;

const COM1: u16 = 0x3F8;

pub static SERIAL: Mutex<SerialPort> = Mutex::new(unsafe { SerialPort::new(COM1) });

/// Initialize COM1 (8n1, FIFO on, no interrupts). Safe to call once at boot.
pub fn init() {
    with_port(|port| port.init());
}

/// Run `f` with exclusive access to COM1.
///
/// Interrupts are masked while the lock is held so an interrupt handler that
/// logs can never spin on a lock its own CPU already owns.
pub fn with_port<R>(f: impl FnOnce(&mut SerialPort) -> R) -> R {
    x86_64::instructions::interrupts::without_interrupts(|| f(&mut SERIAL.lock()))
}
