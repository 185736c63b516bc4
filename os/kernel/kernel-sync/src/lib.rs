//! # Kernel synchronization primitives
//!
//! [`SpinLock`] is the only lock the memory and trap code uses. Holding one
//! keeps supervisor interrupts disabled on the current hart (see
//! [`irq::IrqGuard`]), so a lock shared with an interrupt handler cannot
//! deadlock against itself. Masking nests per hart, so guards may be
//! dropped in any order.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod irq;
mod spin_lock;

pub use irq::IrqGuard;
pub use spin_lock::{SpinLock, SpinLockGuard};
