use core::fmt;

use kernel_registers::Scause;

/// Decoded `scause`, reduced to the cases the dispatcher distinguishes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrapCause {
    /// `ecall` from U-mode.
    UserEcall,
    InstructionPageFault,
    LoadPageFault,
    /// Store or AMO page fault; the copy-on-write trigger.
    StorePageFault,
    /// Supervisor software interrupt, raised by the machine-mode timer
    /// handler once per tick.
    Timer,
    /// Supervisor external interrupt from the PLIC.
    External,
    /// Any other exception code.
    Exception(u64),
    /// Any other interrupt code.
    Interrupt(u64),
}

impl From<Scause> for TrapCause {
    fn from(scause: Scause) -> Self {
        let code = scause.code();
        if scause.interrupt() {
            match code {
                Scause::SUPERVISOR_SOFTWARE => Self::Timer,
                Scause::SUPERVISOR_EXTERNAL => Self::External,
                other => Self::Interrupt(other),
            }
        } else {
            match code {
                Scause::USER_ECALL => Self::UserEcall,
                Scause::INSTRUCTION_PAGE_FAULT => Self::InstructionPageFault,
                Scause::LOAD_PAGE_FAULT => Self::LoadPageFault,
                Scause::STORE_PAGE_FAULT => Self::StorePageFault,
                other => Self::Exception(other),
            }
        }
    }
}

impl fmt::Display for TrapCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserEcall => f.write_str("environment call from U-mode"),
            Self::InstructionPageFault => f.write_str("instruction page fault"),
            Self::LoadPageFault => f.write_str("load page fault"),
            Self::StorePageFault => f.write_str("store/AMO page fault"),
            Self::Timer => f.write_str("timer interrupt"),
            Self::External => f.write_str("external interrupt"),
            Self::Exception(code) => write!(f, "exception {code}"),
            Self::Interrupt(code) => write!(f, "interrupt {code}"),
        }
    }
}
