//! # System Calls
//!
//! The saved user register file ([`TrapFrame`]), the system call numbers
//! ([`Sysno`]) and the table that routes a call to its handler
//! ([`SyscallTable`]).
//!
//! ## Calling convention
//!
//! User code puts the call number in `a7` and up to six arguments in
//! `a0..a5`, then executes `ecall`. The trap path saves all registers into
//! the process's trap frame, and the handler's return value is written back
//! to `a0` before the process resumes:
//!
//! ```text
//!   li a7, SYS_write
//!   ecall            ──► TrapFrame { a7, a0..a5, epc, … }
//!                          │
//!                          ▼
//!                    SyscallTable::dispatch
//!                          │ tf.a0 = handler(tf)
//!   ◄── sret ──────────────┘
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod sysno;
mod table;
mod trap_frame;

pub use crate::sysno::Sysno;
pub use crate::table::{SyscallHandler, SyscallTable, UNKNOWN_SYSCALL};
pub use crate::trap_frame::TrapFrame;
