use std::path::{Path, PathBuf};

use bootloader::{BiosBoot, UefiBoot};

const KERNEL_BIN: &str = "trapos-kernel";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=TRAPOS_PROFILE");
    println!("cargo:rerun-if-changed=../kernel");
    println!("cargo:rerun-if-changed=../os");

    let workspace_root = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap())
        .parent()
        .unwrap()
        .to_path_buf();

    let profile = std::env::var("TRAPOS_PROFILE").unwrap_or_else(|_| "debug".into());
    let kernel_path = workspace_root
        .join("target")
        .join("x86_64-unknown-none")
        .join(&profile)
        .join(KERNEL_BIN);

    if !kernel_path.exists() {
        println!(
            "cargo:warning=kernel binary not found at {}, skipping disk images \
             (build it with `cargo build -p trapos-kernel --target x86_64-unknown-none`)",
            kernel_path.display()
        );
        return;
    }

    let bios_img_path = workspace_root.join("trapos-bios.img");
    create_image("BIOS", &bios_img_path, |out| {
        BiosBoot::new(&kernel_path).create_disk_image(out)
    });
    println!("cargo:rustc-env=TRAPOS_BIOS_IMAGE={}", bios_img_path.display());

    let uefi_img_path = workspace_root.join("trapos-uefi.img");
    create_image("UEFI", &uefi_img_path, |out| {
        UefiBoot::new(&kernel_path).create_disk_image(out)
    });
    println!("cargo:rustc-env=TRAPOS_UEFI_IMAGE={}", uefi_img_path.display());
}

fn create_image<E: std::fmt::Debug>(
    kind: &str,
    path: &Path,
    build: impl FnOnce(&Path) -> Result<(), E>,
) {
    eprintln!("  [boot] Creating {kind} disk image ({})...", path.display());
    build(path).unwrap_or_else(|e| panic!("failed to create {kind} disk image: {e:?}"));
    eprintln!("  [boot] Done: {}", path.display());
}
