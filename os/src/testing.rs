//! Recording platform for host tests.
//!
//! Emulates the parts of the two 8259 chips the core relies on (the ICW
//! sequence, mask registers that ICW1 clears) and logs every port access in
//! order, so tests can assert on exact hardware traffic.

use std::sync::Mutex;

use x86_64::structures::DescriptorTablePointer;

use crate::arch::x86::cpu::Platform;
use crate::arch::x86::port::{PortIo, POST_PORT};
use crate::interrupts::pic::{EOI, MASTER_CMD, MASTER_DATA, SLAVE_CMD, SLAVE_DATA};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortEvent {
    Read(u16),
    Write(u16, u8),
    WriteWide(u16, u32),
    /// Inserted by a test to order its own actions against port traffic.
    Mark(&'static str),
}

#[derive(Debug, Default, Clone, Copy)]
struct Chip {
    mask: u8,
    /// Next expected ICW (2-4), or 0 once initialized.
    expecting: u8,
    vector_base: u8,
}

impl Chip {
    fn command(&mut self, value: u8) {
        if value & 0x10 != 0 {
            // ICW1 clears the mask register.
            self.mask = 0;
            self.expecting = 2;
        }
    }

    fn data(&mut self, value: u8) {
        match self.expecting {
            2 => {
                self.vector_base = value;
                self.expecting = 3;
            }
            3 => self.expecting = 4,
            4 => self.expecting = 0,
            _ => self.mask = value,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    events: Vec<PortEvent>,
    master: Chip,
    slave: Chip,
    loaded_tables: Vec<(u16, u64)>,
    interrupts_enabled: bool,
    fault_address: u64,
}

#[derive(Debug)]
pub struct MockPlatform {
    state: Mutex<State>,
    code_selector: u16,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        Self { state: Mutex::new(State::default()), code_selector: 0x08 }
    }

    /// A machine whose firmware left these masks programmed.
    pub fn with_masks(master: u8, slave: u8) -> Self {
        let platform = Self::new();
        {
            let mut state = platform.state.lock().unwrap();
            state.master.mask = master;
            state.slave.mask = slave;
        }
        platform
    }

    pub fn with_fault_address(self, address: u64) -> Self {
        self.state.lock().unwrap().fault_address = address;
        self
    }

    pub fn with_code_selector(mut self, selector: u16) -> Self {
        self.code_selector = selector;
        self
    }

    pub fn mark(&self, label: &'static str) {
        self.state.lock().unwrap().events.push(PortEvent::Mark(label));
    }

    /// Every access except I/O delays.
    pub fn events(&self) -> Vec<PortEvent> {
        self.state
            .lock()
            .unwrap()
            .events
            .iter()
            .copied()
            .filter(|event| *event != PortEvent::Write(POST_PORT, 0))
            .collect()
    }

    /// Accesses to the four PIC ports only.
    pub fn pic_events(&self) -> Vec<PortEvent> {
        self.events()
            .into_iter()
            .filter(|event| match event {
                PortEvent::Read(port) | PortEvent::Write(port, _) => is_pic_port(*port),
                _ => false,
            })
            .collect()
    }

    /// Command ports that received an EOI, in order.
    pub fn eoi_writes(&self) -> Vec<u16> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PortEvent::Write(port @ (MASTER_CMD | SLAVE_CMD), EOI) => Some(port),
                _ => None,
            })
            .collect()
    }

    pub fn io_waits(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|event| **event == PortEvent::Write(POST_PORT, 0))
            .count()
    }

    /// Vector bases the chips were last initialized with.
    pub fn vector_bases(&self) -> (u8, u8) {
        let state = self.state.lock().unwrap();
        (state.master.vector_base, state.slave.vector_base)
    }

    /// `(limit, base)` of every IDTR load.
    pub fn loaded_tables(&self) -> Vec<(u16, u64)> {
        self.state.lock().unwrap().loaded_tables.clone()
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.state.lock().unwrap().interrupts_enabled
    }
}

fn is_pic_port(port: u16) -> bool {
    matches!(port, MASTER_CMD | MASTER_DATA | SLAVE_CMD | SLAVE_DATA)
}

impl PortIo for MockPlatform {
    unsafe fn read_u8(&self, port: u16) -> u8 {
        let mut state = self.state.lock().unwrap();
        state.events.push(PortEvent::Read(port));
        match port {
            MASTER_DATA => state.master.mask,
            SLAVE_DATA => state.slave.mask,
            _ => 0,
        }
    }

    unsafe fn write_u8(&self, port: u16, value: u8) {
        let mut state = self.state.lock().unwrap();
        state.events.push(PortEvent::Write(port, value));
        match port {
            MASTER_CMD => state.master.command(value),
            SLAVE_CMD => state.slave.command(value),
            MASTER_DATA => state.master.data(value),
            SLAVE_DATA => state.slave.data(value),
            _ => {}
        }
    }

    unsafe fn read_u16(&self, port: u16) -> u16 {
        self.state.lock().unwrap().events.push(PortEvent::Read(port));
        0
    }

    unsafe fn write_u16(&self, port: u16, value: u16) {
        self.state.lock().unwrap().events.push(PortEvent::WriteWide(port, value.into()));
    }

    unsafe fn read_u32(&self, port: u16) -> u32 {
        self.state.lock().unwrap().events.push(PortEvent::Read(port));
        0
    }

    unsafe fn write_u32(&self, port: u16, value: u32) {
        self.state.lock().unwrap().events.push(PortEvent::WriteWide(port, value));
    }
}

impl Platform for MockPlatform {
    unsafe fn load_interrupt_table(&self, pointer: &DescriptorTablePointer) {
        self.state.lock().unwrap().loaded_tables.push((pointer.limit, pointer.base.as_u64()));
    }

    fn enable_interrupts(&self) {
        self.state.lock().unwrap().interrupts_enabled = true;
    }

    fn without_interrupts<R, F: FnOnce() -> R>(&self, f: F) -> R {
        f()
    }

    fn code_selector(&self) -> u16 {
        self.code_selector
    }

    fn fault_address(&self) -> u64 {
        self.state.lock().unwrap().fault_address
    }
}
