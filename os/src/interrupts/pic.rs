//! 8259 PIC (Programmable Interrupt Controller) pair.
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐
//! │   PIC 1     │◀────│   PIC 2     │
//! │  (Master)   │ IR2 │  (Slave)    │
//! │ IRQ 0-7     │     │ IRQ 8-15    │
//! └─────────────┘     └─────────────┘
//!       │
//!       ▼
//!     CPU
//! ```
//!
//! At power-on the master delivers on vectors 8-15, on top of the CPU
//! exceptions. [`ChainedPics::remap`] moves the pair to 32-47.

use super::vector::{IrqLine, PIC_1_OFFSET, PIC_2_OFFSET};
use crate::arch::x86::port::PortIo;

pub const MASTER_CMD: u16 = 0x20;
pub const MASTER_DATA: u16 = 0x21;
pub const SLAVE_CMD: u16 = 0xA0;
pub const SLAVE_DATA: u16 = 0xA1;

/// ICW1: initialization, ICW4 follows.
pub const ICW1_INIT: u8 = 0x11;
/// ICW4: 8086/88 mode.
pub const ICW4_8086: u8 = 0x01;
/// ICW3 for the master: slave on IR2 (bit mask).
pub const MASTER_CASCADE: u8 = 1 << CASCADE_LINE;
/// ICW3 for the slave: its cascade identity (line number).
pub const SLAVE_CASCADE: u8 = CASCADE_LINE;
/// Non-specific End Of Interrupt.
pub const EOI: u8 = 0x20;

const CASCADE_LINE: u8 = 2;

/// Interrupt mask registers of both chips. A set bit disables the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PicMasks {
    pub master: u8,
    pub slave: u8,
}

impl PicMasks {
    /// Every line of both chips enabled.
    pub const NONE: PicMasks = PicMasks { master: 0, slave: 0 };

    pub fn is_masked(&self, line: IrqLine) -> bool {
        let (mask, bit) = self.select(line);
        mask & (1 << bit) != 0
    }

    fn select(&self, line: IrqLine) -> (u8, u8) {
        if line.is_slave() {
            (self.slave, line.number() - 8)
        } else {
            (self.master, line.number())
        }
    }
}

/// The cascaded master/slave pair.
#[derive(Debug, Clone, Copy)]
pub struct ChainedPics {
    master_offset: u8,
    slave_offset: u8,
}

impl Default for ChainedPics {
    fn default() -> Self {
        Self::new(PIC_1_OFFSET, PIC_2_OFFSET)
    }
}

impl ChainedPics {
    pub const fn new(master_offset: u8, slave_offset: u8) -> Self {
        Self { master_offset, slave_offset }
    }

    pub fn master_offset(&self) -> u8 {
        self.master_offset
    }

    pub fn slave_offset(&self) -> u8 {
        self.slave_offset
    }

    /// True if `vector` is delivered by either chip.
    pub fn handles_interrupt(&self, vector: u8) -> bool {
        self.is_master(vector) || self.is_slave(vector)
    }

    fn is_master(&self, vector: u8) -> bool {
        vector.wrapping_sub(self.master_offset) < 8
    }

    fn is_slave(&self, vector: u8) -> bool {
        vector.wrapping_sub(self.slave_offset) < 8
    }

    pub fn read_masks(&self, io: &impl PortIo) -> PicMasks {
        unsafe {
            PicMasks {
                master: io.read_u8(MASTER_DATA),
                slave: io.read_u8(SLAVE_DATA),
            }
        }
    }

    pub fn write_masks(&self, io: &impl PortIo, masks: PicMasks) {
        unsafe {
            io.write_u8(MASTER_DATA, masks.master);
            io.write_u8(SLAVE_DATA, masks.slave);
        }
    }

    /// Run the four-word initialization sequence on both chips.
    ///
    /// ICW1 resets each chip's mask register, so the masks are read first and
    /// written back last; a line masked before the remap stays masked.
    pub fn remap(&self, io: &impl PortIo) -> PicMasks {
        let saved = self.read_masks(io);

        unsafe {
            // Start initialization
            io.write_u8(MASTER_CMD, ICW1_INIT);
            io.io_wait();
            io.write_u8(SLAVE_CMD, ICW1_INIT);
            io.io_wait();

            // Remap vectors
            io.write_u8(MASTER_DATA, self.master_offset);
            io.io_wait();
            io.write_u8(SLAVE_DATA, self.slave_offset);
            io.io_wait();

            // Setup cascade
            io.write_u8(MASTER_DATA, MASTER_CASCADE);
            io.io_wait();
            io.write_u8(SLAVE_DATA, SLAVE_CASCADE);
            io.io_wait();

            // 8086 mode
            io.write_u8(MASTER_DATA, ICW4_8086);
            io.io_wait();
            io.write_u8(SLAVE_DATA, ICW4_8086);
            io.io_wait();
        }

        self.write_masks(io, saved);
        crate::klog_debug!(
            "PIC remapped to {}/{}, masks {:#04x}/{:#04x}",
            self.master_offset,
            self.slave_offset,
            saved.master,
            saved.slave
        );
        saved
    }

    /// Acknowledge `vector`: slave first if it came through the slave, then
    /// always the master, which saw the cascade line.
    ///
    /// Vectors outside both ranges are ignored.
    pub fn notify_end_of_interrupt(&self, io: &impl PortIo, vector: u8) {
        if !self.handles_interrupt(vector) {
            return;
        }
        unsafe {
            if self.is_slave(vector) {
                io.write_u8(SLAVE_CMD, EOI);
            }
            io.write_u8(MASTER_CMD, EOI);
        }
    }

    pub fn mask(&self, io: &impl PortIo, line: IrqLine) {
        self.update_mask(io, line, |mask, bit| mask | bit);
    }

    pub fn unmask(&self, io: &impl PortIo, line: IrqLine) {
        self.update_mask(io, line, |mask, bit| mask & !bit);
    }

    fn update_mask(&self, io: &impl PortIo, line: IrqLine, apply: impl Fn(u8, u8) -> u8) {
        let (port, bit) = if line.is_slave() {
            (SLAVE_DATA, 1 << (line.number() - 8))
        } else {
            (MASTER_DATA, 1 << line.number())
        };
        unsafe {
            let mask = io.read_u8(port);
            io.write_u8(port, apply(mask, bit));
        }
    }
}
