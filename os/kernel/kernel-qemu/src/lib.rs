//! # QEMU Debug Output
//!
//! Logging and tracing for kernels running on the QEMU `virt` RISC-V
//! machine. Output goes straight to the 16550 UART at
//! [`UART0`](kernel_info::devices::UART0) by polling its transmit-holding
//! register, so it works before interrupts, the console driver or any
//! allocator are set up, and from inside a panic handler.
//!
//! ## Components
//!
//! * [`QemuLogger`]: a `log::Log` backend with a level threshold. Every
//!   record is written as `[LEVEL] target: message`.
//! * [`qemu_trace!`]: direct `format!`-style output that bypasses `log`.
//!
//! ## Feature `enabled` (default)
//!
//! Without it, and on every target other than `riscv64`, the sink is a
//! no-op. Host tests therefore log freely without touching MMIO.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kernel_qemu::QemuLogger;
//! use log::{LevelFilter, info};
//!
//! static LOGGER: QemuLogger = QemuLogger::new(LevelFilter::Debug);
//!
//! LOGGER.init().expect("logger initialization");
//! info!("hart 0 starting");
//! ```
//!
//! Run QEMU with `-nographic` (or `-serial stdio`) to see the output on the
//! host terminal.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;

pub use logger::QemuLogger;

#[cfg(all(feature = "enabled", target_arch = "riscv64"))]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt::{self, Write};
    use kernel_info::devices::UART0;
    use kernel_sync::SpinLock;

    /// Transmit holding register.
    const THR: u64 = 0;
    /// Line status register.
    const LSR: u64 = 5;
    /// LSR bit: THR can accept another byte.
    const LSR_TX_IDLE: u8 = 1 << 5;

    /// Keeps lines from different harts from interleaving.
    static UART_TX: SpinLock<()> = SpinLock::new(());

    /// Write a single byte, spinning until the UART has room.
    #[allow(clippy::inline_always)]
    #[inline(always)]
    pub fn dbg_putc(c: u8) {
        unsafe {
            let lsr = (UART0 + LSR) as *const u8;
            while core::ptr::read_volatile(lsr) & LSR_TX_IDLE == 0 {
                core::hint::spin_loop();
            }
            core::ptr::write_volatile((UART0 + THR) as *mut u8, c);
        }
    }

    pub struct QemuSink;

    impl Write for QemuSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for b in s.bytes() {
                dbg_putc(b);
            }
            Ok(())
        }
    }

    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub fn qemu_write(args: fmt::Arguments) {
        let _tx = UART_TX.lock();
        // Ignore errors; this is best-effort debug output.
        let _ = fmt::write(&mut QemuSink, args);
    }
}

#[cfg(not(all(feature = "enabled", target_arch = "riscv64")))]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt;
    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub fn qemu_write(_: fmt::Arguments) {
        // no-op when feature disabled or off-target
    }
}

#[macro_export]
macro_rules! qemu_trace {
    ($($arg:tt)*) => {{
        // No allocation: `format_args!` builds a lightweight `Arguments`.
        $crate::qemu_fmt::qemu_write(core::format_args!($($arg)*));
    }};
}
