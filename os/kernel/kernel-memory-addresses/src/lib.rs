//! # Virtual and Physical Memory Address Types
//!
//! Strongly typed wrappers for raw memory addresses, frames and page bases
//! used by the frame allocator and the Sv39 page-table code.
//!
//! ## Overview
//!
//! The types prevent mixing virtual and physical addresses at compile time
//! while remaining zero-cost wrappers around `u64` values.
//!
//! | Concept | Generic | Description |
//! |----------|----------|-------------|
//! | [`MemoryAddress`] | – | A raw 64-bit address, either physical or virtual. |
//! | [`MemoryPage<S>`] | [`S: PageSize`](PageSize) | A page-aligned base address of a page of size `S`. |
//! | [`MemoryAddressOffset<S>`] | [`S: PageSize`](PageSize) | An offset within a page of size `S`. |
//!
//! These are then wrapped to distinguish between virtual and physical spaces:
//!
//! | Wrapper | Meaning |
//! |----------|----------|
//! | [`VirtualAddress`] / [`VirtualPage<S>`] | Refer to virtual (page-table translated) memory. |
//! | [`PhysicalAddress`] / [`PhysicalPage<S>`] | Refer to physical memory or MMIO regions. |
//!
//! ## Page Sizes
//!
//! Only the Sv39 base page, [`Size4K`], is provided. Page-table entries store
//! the physical page number (`PPN`) of a frame, see [`PhysicalPage::ppn`] and
//! [`PhysicalPage::from_ppn`].
//!
//! ## Typical Usage
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let va = VirtualAddress::new(0x0000_0000_0040_1234);
//!
//! // Split it into a page base and an in-page offset
//! let (page, off) = va.split::<Size4K>();
//! assert_eq!(page.base().as_u64(), 0x40_1000);
//! assert_eq!(off.as_u64(), 0x234);
//!
//! // Join them back to the same address
//! assert_eq!(page.join(off), va);
//!
//! // Round a size up to whole pages
//! let top = VirtualAddress::new(0x2001).checked_align_up::<Size4K>();
//! assert_eq!(top, Some(VirtualAddress::new(0x3000)));
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

mod memory_address;
mod memory_address_offset;
mod memory_page;
mod page_size;
mod physical_address;
mod physical_page;
mod virtual_address;
mod virtual_page;

pub use memory_address::MemoryAddress;
pub use memory_address_offset::MemoryAddressOffset;
pub use memory_page::MemoryPage;
pub use page_size::{PageSize, Size4K};
pub use physical_address::PhysicalAddress;
pub use physical_page::PhysicalPage;
pub use virtual_address::VirtualAddress;
pub use virtual_page::VirtualPage;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_join_4k() {
        let a = MemoryAddress::new(0x0000_0000_8765_4321);
        let (p, o) = a.split::<Size4K>();
        assert_eq!(p.base().as_u64() & 0xFFF, 0);
        assert_eq!(o.as_u64(), a.as_u64() & 0xFFF);
        assert_eq!(p.join(o).as_u64(), a.as_u64());
    }

    #[test]
    fn virtual_vs_physical_wrappers() {
        let va = VirtualAddress::new(0x3F_FFFF_F234);
        let (vp, vo) = va.split::<Size4K>();
        assert_eq!(vp.base().as_u64(), 0x3F_FFFF_F000);
        assert_eq!(vo.as_u64(), 0x234);
        assert_eq!(vp.join(vo), va);

        let pa = PhysicalAddress::new(0x8000_0042);
        let (pp, po) = pa.split::<Size4K>();
        assert_eq!(pp.base().as_u64(), 0x8000_0000);
        assert_eq!(po.as_u64(), 0x42);
        assert_eq!(pp.join(po), pa);
    }

    #[test]
    fn alignment_helpers() {
        let a = MemoryAddress::new(0x12345);
        assert_eq!(a.align_down::<Size4K>().as_u64(), 0x12000);
        assert_eq!(a.checked_align_up::<Size4K>().map(MemoryAddress::as_u64), Some(0x13000));
        assert_eq!(
            MemoryAddress::new(0x13000).checked_align_up::<Size4K>(),
            Some(MemoryAddress::new(0x13000))
        );
        assert!(!a.is_aligned::<Size4K>());
        assert!(a.align_down::<Size4K>().is_aligned::<Size4K>());
        assert_eq!(MemoryAddress::new(u64::MAX).checked_align_up::<Size4K>(), None);
    }

    #[test]
    fn ppn_roundtrip() {
        let frame = PhysicalAddress::new(0x8765_4000).page::<Size4K>();
        assert_eq!(frame.ppn(), 0x87654);
        assert_eq!(PhysicalPage::<Size4K>::from_ppn(frame.ppn()), frame);
    }

    #[test]
    fn page_stepping() {
        let vp = VirtualAddress::new(0x1000).page::<Size4K>();
        let next = vp.checked_add_pages(3).expect("no overflow");
        assert_eq!(next.base().as_u64(), 0x4000);
        assert_eq!(next.vpn(), 4);
        assert_eq!(
            VirtualAddress::new(u64::MAX)
                .page::<Size4K>()
                .checked_add_pages(1),
            None
        );
    }

    #[test]
    fn offsets_report_remaining_bytes() {
        let off = VirtualAddress::new(0x1FF0).offset::<Size4K>();
        assert_eq!(off.as_usize(), 0xFF0);
        assert_eq!(off.remaining(), 0x10);
    }

    #[test]
    fn unaligned_virtual_page_is_rejected() {
        assert!(VirtualPage::<Size4K>::try_from(VirtualAddress::new(0x1001)).is_err());
        assert!(VirtualPage::<Size4K>::try_from(VirtualAddress::new(0x1000)).is_ok());
    }

    #[test]
    fn address_distance() {
        let lo = PhysicalAddress::new(0x8000_0000);
        let hi = PhysicalAddress::new(0x8000_3000);
        assert_eq!(hi - lo, 0x3000);
    }
}
