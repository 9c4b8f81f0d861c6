#![no_std]
#![no_main]

mod init;
mod timer;

use core::panic::PanicInfo;

use trapos::arch::x86::cpu::halt_forever;
use trapos::klog_error;

bootloader_api::entry_point!(kernel_main);

fn kernel_main(_boot_info: &'static mut bootloader_api::BootInfo) -> ! {
    match init::early_init() {
        Ok(state) => init::kernel_loop(state),
        Err(err) => {
            klog_error!("kernel init failed: {}", err);
            halt_forever()
        }
    }
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    klog_error!("{}", info);
    halt_forever()
}
