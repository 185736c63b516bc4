//! # Typed RISC-V Supervisor Registers
//!
//! Bitfield models of the supervisor CSRs used by the trap path and the
//! paging code. Reading and writing the live registers is only compiled for
//! `riscv64` with the `asm` feature; the bitfield types themselves are plain
//! values and usable everywhere, including host tests.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod csr;
pub mod satp;
pub mod scause;
pub mod sip;
pub mod sstatus;

pub use satp::{Satp, SatpMode};
pub use scause::Scause;
pub use sip::Sip;
pub use sstatus::Sstatus;

pub trait LoadRegisterUnsafe {
    /// # Safety
    /// The caller must uphold the implementation-specific safety requirements.
    /// Supervisor CSRs are only accessible from S-mode or above.
    unsafe fn load_unsafe() -> Self;
}

pub trait StoreRegisterUnsafe {
    /// # Safety
    /// The caller must uphold the implementation-specific safety requirements.
    /// Writing `satp` or `sstatus` changes translation and interrupt state
    /// for the current hart.
    unsafe fn store_unsafe(self);
}
