use kernel_memory_addresses::VirtualAddress;

/// Why [`AddressSpace::walk`](crate::AddressSpace::walk) produced no entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalkError {
    #[error("virtual address {0} is at or above MAXVA")]
    OutOfRange(VirtualAddress),
    #[error("no page table covers {0}")]
    Missing(VirtualAddress),
    #[error("no frame left for a page table")]
    OutOfMemory,
}

/// Failures of the copy-on-write resolver.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CowError {
    #[error("{0} is not mapped")]
    Unmapped(VirtualAddress),
    #[error("{0} is not a copy-on-write page")]
    NotCow(VirtualAddress),
    #[error("no frame left to copy {0}")]
    OutOfMemory(VirtualAddress),
}

/// Recoverable address-space errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VmemError {
    #[error("out of physical memory")]
    OutOfMemory,
    #[error("virtual address {0} is at or above MAXVA")]
    OutOfRange(VirtualAddress),
    #[error("{0} is not mapped for user access")]
    Unmapped(VirtualAddress),
    #[error("{0} is not writable")]
    NotWritable(VirtualAddress),
    #[error("string does not fit the destination buffer")]
    StringTooLong,
    #[error(transparent)]
    Cow(#[from] CowError),
}

impl From<WalkError> for VmemError {
    fn from(value: WalkError) -> Self {
        match value {
            WalkError::OutOfRange(va) => Self::OutOfRange(va),
            WalkError::Missing(va) => Self::Unmapped(va),
            WalkError::OutOfMemory => Self::OutOfMemory,
        }
    }
}
