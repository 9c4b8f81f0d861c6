//! Paths of the disk images produced by the build script.
//!
//! Both are `None` when the kernel binary had not been built yet.

pub const BIOS_IMAGE: Option<&str> = option_env!("TRAPOS_BIOS_IMAGE");
pub const UEFI_IMAGE: Option<&str> = option_env!("TRAPOS_UEFI_IMAGE");
