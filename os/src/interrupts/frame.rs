//! Register frame shared between the trampolines and Rust handlers.

use core::fmt;
use core::mem::{offset_of, size_of};

/// CPU state captured for one interrupt, lowest address first.
///
/// The trampoline pushes, in order: an error code (zero when the CPU pushed
/// none), the vector, the general-purpose registers `rax` through `r15`,
/// and finally `ds`. The CPU pushed everything from `rip` up. Handlers may
/// change any field; the trampoline restores from this frame on the way out,
/// so edits to `rip`, `rflags` or the GPRs take effect on resume.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterFrame {
    pub ds: u64,
    pub r15: u64,
    pub r14: u64,
    pub r13: u64,
    pub r12: u64,
    pub r11: u64,
    pub r10: u64,
    pub r9: u64,
    pub r8: u64,
    pub rdi: u64,
    pub rsi: u64,
    pub rbp: u64,
    pub rbx: u64,
    pub rdx: u64,
    pub rcx: u64,
    pub rax: u64,
    pub vector: u64,
    pub error_code: u64,
    pub rip: u64,
    pub cs: u64,
    pub rflags: u64,
    pub rsp: u64,
    pub ss: u64,
}

/// Bytes pushed by a trampoline before it calls into Rust.
pub const FRAME_SIZE: usize = size_of::<RegisterFrame>();

// The assembly in `trampolines.s` hard-codes this layout.
const _: () = {
    assert!(FRAME_SIZE == 23 * 8);
    assert!(offset_of!(RegisterFrame, rax) == 15 * 8);
    assert!(offset_of!(RegisterFrame, vector) == 16 * 8);
    assert!(offset_of!(RegisterFrame, rip) == 18 * 8);
    assert!(offset_of!(RegisterFrame, ss) == 22 * 8);
};

impl RegisterFrame {
    /// A frame as a trampoline would build it for `vector`, all else zero.
    pub const fn for_vector(vector: u8) -> Self {
        let mut frame = Self::zeroed();
        frame.vector = vector as u64;
        frame
    }

    const fn zeroed() -> Self {
        Self {
            ds: 0,
            r15: 0,
            r14: 0,
            r13: 0,
            r12: 0,
            r11: 0,
            r10: 0,
            r9: 0,
            r8: 0,
            rdi: 0,
            rsi: 0,
            rbp: 0,
            rbx: 0,
            rdx: 0,
            rcx: 0,
            rax: 0,
            vector: 0,
            error_code: 0,
            rip: 0,
            cs: 0,
            rflags: 0,
            rsp: 0,
            ss: 0,
        }
    }

    pub const fn with_error_code(mut self, error_code: u64) -> Self {
        self.error_code = error_code;
        self
    }

    pub fn vector(&self) -> u8 {
        self.vector as u8
    }

    /// True if the interrupted code ran in ring 3.
    pub fn from_user_mode(&self) -> bool {
        self.cs & 0b11 == 3
    }
}

impl fmt::Debug for RegisterFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Hex(u64);
        impl fmt::Debug for Hex {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }

        f.debug_struct("RegisterFrame")
            .field("vector", &self.vector)
            .field("error_code", &Hex(self.error_code))
            .field("rip", &Hex(self.rip))
            .field("cs", &Hex(self.cs))
            .field("rflags", &Hex(self.rflags))
            .field("rsp", &Hex(self.rsp))
            .field("ss", &Hex(self.ss))
            .field("ds", &Hex(self.ds))
            .field("rax", &Hex(self.rax))
            .field("rbx", &Hex(self.rbx))
            .field("rcx", &Hex(self.rcx))
            .field("rdx", &Hex(self.rdx))
            .field("rsi", &Hex(self.rsi))
            .field("rdi", &Hex(self.rdi))
            .field("rbp", &Hex(self.rbp))
            .field("r8", &Hex(self.r8))
            .field("r9", &Hex(self.r9))
            .field("r10", &Hex(self.r10))
            .field("r11", &Hex(self.r11))
            .field("r12", &Hex(self.r12))
            .field("r13", &Hex(self.r13))
            .field("r14", &Hex(self.r14))
            .field("r15", &Hex(self.r15))
            .finish()
    }
}
