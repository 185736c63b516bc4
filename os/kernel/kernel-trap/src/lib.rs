//! # Traps and Interrupts
//!
//! The kernel-entry state machine: system calls, copy-on-write faults,
//! timer ticks and device interrupts from user space, device interrupts in
//! the kernel, and the way back to user space.
//!
//! ## Components
//!
//! * [`TrapDispatcher`]: decodes `scause` and routes the trap.
//! * [`Platform`] and friends: the hart registers, interrupt controller,
//!   device handlers, scheduler and trampoline the dispatcher relies on.
//! * [`Clock`]: the global tick counter and tick-based sleep.
//! * [`AlarmState`]: per-process periodic alarm.
//! * [`UserContext`]: the running process as seen by a user trap.
//!
//! ## Outcomes
//!
//! A user trap ends in [`TrapOutcome::Resume`] or
//! [`TrapOutcome::Terminate`]. Inconsistent kernel state (a kernel trap with
//! interrupts enabled, an unexpected exception in kernel mode, a "user"
//! trap from supervisor mode) panics and halts the hart.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod alarm;
mod cause;
mod clock;
mod context;
mod dispatcher;
mod platform;
#[cfg(all(target_arch = "riscv64", not(test)))]
pub mod riscv;

pub use crate::alarm::AlarmState;
pub use crate::cause::TrapCause;
pub use crate::clock::{Clock, SleepError};
pub use crate::context::UserContext;
pub use crate::dispatcher::{DeviceInterrupt, TrapDispatcher, TrapOutcome, TrapVectors};
pub use crate::platform::{
    DeviceHandlers, Hart, InterruptController, Platform, Scheduler, Trampoline, UserReturn,
};
