//! Gate encoder: one 16-byte long-mode interrupt descriptor per vector.

use bitflags::bitflags;

bitflags! {
    /// Attribute byte: P, DPL, 0, Type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GateFlags: u8 {
        const INTERRUPT_GATE = 0b1110;
        const TRAP_GATE = 0b1111;
        const DPL_3 = 3 << 5;
        const PRESENT = 1 << 7;
    }
}

const TYPE_MASK: u8 = 0b1111;
const DPL_SHIFT: u8 = 5;
const IST_MASK: u8 = 0b111;

/// One vector table entry.
///
/// Every gate this crate builds is present, DPL 0 and of interrupt type, so
/// the CPU clears IF on entry and handlers never nest by accident.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    offset_15_0: u16,
    segment_selector: u16,
    // Bits 0..2: IST, rest is 0
    ist: u8,
    attributes: u8,
    offset_31_16: u16,
    offset_63_32: u32,
    _reserved: u32,
}

const _: () = assert!(core::mem::size_of::<Gate>() == 16);

impl Gate {
    /// A zeroed, non-present gate. Never loaded: tables are built full.
    pub const MISSING: Gate = Gate {
        offset_15_0: 0,
        segment_selector: 0,
        ist: 0,
        attributes: 0,
        offset_31_16: 0,
        offset_63_32: 0,
        _reserved: 0,
    };

    pub const fn new(handler: u64, segment_selector: u16) -> Self {
        Self {
            offset_15_0: handler as u16,
            segment_selector,
            ist: 0,
            attributes: GateFlags::PRESENT.bits() | GateFlags::INTERRUPT_GATE.bits(),
            offset_31_16: (handler >> 16) as u16,
            offset_63_32: (handler >> 32) as u32,
            _reserved: 0,
        }
    }

    /// Switch to TSS interrupt stack `index` (1-7) on entry.
    pub const fn with_stack_index(mut self, index: u8) -> Self {
        self.ist = index & IST_MASK;
        self
    }

    pub const fn handler_address(&self) -> u64 {
        self.offset_15_0 as u64
            | (self.offset_31_16 as u64) << 16
            | (self.offset_63_32 as u64) << 32
    }

    pub const fn segment_selector(&self) -> u16 {
        self.segment_selector
    }

    pub const fn stack_index(&self) -> u8 {
        self.ist & IST_MASK
    }

    pub const fn flags(&self) -> GateFlags {
        GateFlags::from_bits_retain(self.attributes)
    }

    pub const fn is_present(&self) -> bool {
        self.attributes & GateFlags::PRESENT.bits() != 0
    }

    pub const fn privilege_level(&self) -> u8 {
        (self.attributes >> DPL_SHIFT) & 0b11
    }

    pub const fn gate_type(&self) -> u8 {
        self.attributes & TYPE_MASK
    }

    /// The raw little-endian descriptor as the CPU reads it.
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..2].copy_from_slice(&self.offset_15_0.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.segment_selector.to_le_bytes());
        bytes[4] = self.ist;
        bytes[5] = self.attributes;
        bytes[6..8].copy_from_slice(&self.offset_31_16.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.offset_63_32.to_le_bytes());
        bytes
    }
}
