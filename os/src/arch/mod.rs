//! Architecture support. Only x86_64 in long mode is implemented.

pub mod x86;
