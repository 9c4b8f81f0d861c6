//! Vector space layout.
//!
//! | Vector  | Source                                   |
//! |---------|------------------------------------------|
//! | 0-31    | CPU exceptions                           |
//! | 32-39   | IRQ 0-7, master 8259                     |
//! | 40-47   | IRQ 8-15, slave 8259 (cascaded on IRQ 2) |
//! | 48-255  | Software / unassigned                    |

/// Number of entries in the vector table.
pub const VECTOR_COUNT: usize = 256;

/// Vectors reserved for CPU exceptions.
pub const EXCEPTION_COUNT: u8 = 32;

/// Master PIC handles IRQ 0-7.
pub const PIC_1_OFFSET: u8 = 32;
/// Slave PIC handles IRQ 8-15.
pub const PIC_2_OFFSET: u8 = PIC_1_OFFSET + 8;
/// One past the last remapped IRQ vector.
pub const IRQ_END: u8 = PIC_2_OFFSET + 8;

pub const DOUBLE_FAULT: u8 = 8;
pub const PAGE_FAULT: u8 = 14;

/// Vectors for which the CPU pushes an error code.
pub const fn has_error_code(vector: u8) -> bool {
    matches!(vector, 8 | 10..=14 | 17 | 21 | 29 | 30)
}

/// Which dispatcher owns a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorKind {
    /// CPU-raised fault or trap, 0-31.
    Exception(u8),
    /// Hardware IRQ line 0-15, remapped to 32-47.
    Irq(IrqLine),
    /// Anything above the PIC range; only reached through `int n`.
    Software(u8),
}

impl VectorKind {
    pub const fn of(vector: u8) -> Self {
        if vector < EXCEPTION_COUNT {
            VectorKind::Exception(vector)
        } else if vector < IRQ_END {
            VectorKind::Irq(IrqLine(vector - PIC_1_OFFSET))
        } else {
            VectorKind::Software(vector)
        }
    }
}

/// A PIC input line, 0-15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IrqLine(u8);

impl IrqLine {
    pub const fn new(line: u8) -> Option<Self> {
        if line < 16 {
            Some(IrqLine(line))
        } else {
            None
        }
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    pub const fn vector(self) -> u8 {
        PIC_1_OFFSET + self.0
    }

    /// Lines 8-15 are wired to the slave controller.
    pub const fn is_slave(self) -> bool {
        self.0 >= 8
    }
}

// Interrupt indices - these are the actual vector numbers the CPU sees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InterruptIndex {
    Timer = PIC_1_OFFSET,             // 32 - IRQ0
    Keyboard = PIC_1_OFFSET + 1,      // 33 - IRQ1
    RealTimeClock = PIC_2_OFFSET,     // 40 - IRQ8
}

impl InterruptIndex {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn line(self) -> IrqLine {
        IrqLine(self.as_u8() - PIC_1_OFFSET)
    }
}
