//! Moving bytes between kernel buffers and user memory of a (possibly
//! inactive) address space, one page at a time.

use kernel_alloc::{Frame, FrameAlloc, PhysMapper};
use kernel_info::memory::{MAXVA, PAGE_SIZE};
use kernel_memory_addresses::{Size4K, VirtualAddress};

use crate::{AddressSpace, VmemError};

impl<'m, M: PhysMapper, A: FrameAlloc> AddressSpace<'m, M, A> {
    /// Copies `src` to user address `dst`.
    ///
    /// Copy-on-write pages in the destination are resolved first.
    ///
    /// # Errors
    /// - [`VmemError::Unmapped`] or [`VmemError::NotWritable`] for a
    ///   destination page the process may not write.
    /// - [`VmemError::Cow`] if a shared page cannot be copied.
    pub fn copy_out(&self, dst: VirtualAddress, mut src: &[u8]) -> Result<(), VmemError> {
        let mut dst = dst;
        while !src.is_empty() {
            let page = dst.align_down::<Size4K>();
            if page.as_u64() >= MAXVA {
                return Err(VmemError::OutOfRange(page));
            }
            if self.is_cow(page) {
                self.resolve_cow(page)?;
            }

            let entry = self.walk(page, false)?;
            if !entry.valid() || !entry.user() {
                return Err(VmemError::Unmapped(page));
            }
            if !entry.writable() {
                return Err(VmemError::NotWritable(page));
            }

            let n = chunk(dst, src.len());
            let offset = dst.offset::<Size4K>().as_usize();
            self.user_bytes(entry.frame())[offset..offset + n].copy_from_slice(&src[..n]);

            src = &src[n..];
            dst = page + PAGE_SIZE;
        }
        Ok(())
    }

    /// Fills `dst` from user address `src`.
    ///
    /// # Errors
    /// [`VmemError::Unmapped`] if a source page is not user-accessible.
    pub fn copy_in(&self, dst: &mut [u8], src: VirtualAddress) -> Result<(), VmemError> {
        let mut src = src;
        let mut done = 0;
        while done < dst.len() {
            let frame = self.user_frame(src)?;
            let n = chunk(src, dst.len() - done);
            let offset = src.offset::<Size4K>().as_usize();
            dst[done..done + n].copy_from_slice(&self.user_bytes(frame)[offset..offset + n]);

            done += n;
            src = src.align_down::<Size4K>() + PAGE_SIZE;
        }
        Ok(())
    }

    /// Copies a NUL-terminated string from user address `src` into `dst`,
    /// terminator included. Returns the string length without the NUL.
    ///
    /// # Errors
    /// - [`VmemError::Unmapped`] if the string runs into an unmapped page.
    /// - [`VmemError::StringTooLong`] if no NUL fits into `dst`.
    pub fn copy_in_str(&self, dst: &mut [u8], src: VirtualAddress) -> Result<usize, VmemError> {
        let mut src = src;
        let mut done = 0;
        while done < dst.len() {
            let frame = self.user_frame(src)?;
            let n = chunk(src, dst.len() - done);
            let offset = src.offset::<Size4K>().as_usize();
            let bytes = &self.user_bytes(frame)[offset..offset + n];

            if let Some(nul) = bytes.iter().position(|&b| b == 0) {
                dst[done..=done + nul].copy_from_slice(&bytes[..=nul]);
                return Ok(done + nul);
            }
            dst[done..done + n].copy_from_slice(bytes);

            done += n;
            src = src.align_down::<Size4K>() + PAGE_SIZE;
        }
        Err(VmemError::StringTooLong)
    }

    fn user_frame(&self, va: VirtualAddress) -> Result<Frame, VmemError> {
        self.translate(va)
            .map(|pa| pa.page::<Size4K>())
            .ok_or(VmemError::Unmapped(va.align_down::<Size4K>()))
    }

    fn user_bytes(&self, frame: Frame) -> &'m mut [u8] {
        // SAFETY: the frame is mapped into this space, which the caller holds
        // exclusively.
        unsafe { self.mapper().frame_bytes(frame) }
    }
}

/// Bytes that can be moved at `va` before the page ends, capped at `len`.
#[allow(clippy::cast_possible_truncation)]
fn chunk(va: VirtualAddress, len: usize) -> usize {
    let remaining = va.offset::<Size4K>().remaining() as usize;
    remaining.min(len)
}
