mod common;

use common::{BASE, arena, drain_to, frames};
use kernel_info::memory::{MAXVA, PAGE_SIZE, TRAMPOLINE, TRAPFRAME};
use kernel_memory_addresses::{PhysicalAddress, Size4K, VirtualAddress};
use kernel_vmem::{AddressSpace, CloneMode, PageTableEntry, VmemError, WalkError};

fn va(v: u64) -> VirtualAddress {
    VirtualAddress::new(v)
}

#[test]
fn translate_follows_every_mapped_page() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();

    let pa = PhysicalAddress::new(0x8010_0000);
    space
        .map(va(0x4000), 3 * PAGE_SIZE, pa, PageTableEntry::user_rw())
        .unwrap();

    for i in 0..3 {
        assert_eq!(space.translate(va(0x4000 + i * PAGE_SIZE)), Some(pa + i * PAGE_SIZE));
    }
    assert_eq!(space.translate(va(0x5123)), Some(pa + PAGE_SIZE + 0x123));
    assert_eq!(space.translate(va(0x3000)), None);
    assert_eq!(space.translate(va(0x7000)), None);
}

#[test]
fn kernel_only_pages_do_not_translate() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();

    space
        .map(va(0x1000), PAGE_SIZE, PhysicalAddress::new(BASE_DATA), PageTableEntry::kernel_rw())
        .unwrap();
    assert_eq!(space.translate(va(0x1000)), None);
}

const BASE_DATA: u64 = 0x8020_0000;

#[test]
#[should_panic(expected = "remap")]
fn mapping_twice_is_fatal() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();

    let pa = PhysicalAddress::new(BASE_DATA);
    space.map(va(0x1000), PAGE_SIZE, pa, PageTableEntry::user_rw()).unwrap();
    let _ = space.map(va(0x1000), PAGE_SIZE, pa, PageTableEntry::user_rx());
}

#[test]
#[should_panic(expected = "mappages: size")]
fn empty_mapping_is_fatal() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();
    let _ = space.map(va(0), 0, PhysicalAddress::new(BASE_DATA), PageTableEntry::user_rw());
}

#[test]
#[should_panic(expected = "without R/W/X")]
fn leaf_without_access_is_fatal() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();
    let _ = space.map(
        va(0),
        PAGE_SIZE,
        PhysicalAddress::new(BASE_DATA),
        PageTableEntry::new().with_user(true),
    );
}

#[test]
fn mapping_at_maxva_is_rejected() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();

    let err = space
        .map(va(MAXVA), PAGE_SIZE, PhysicalAddress::new(BASE_DATA), PageTableEntry::user_rw())
        .unwrap_err();
    assert_eq!(err, VmemError::OutOfRange(va(MAXVA)));
    assert_eq!(space.walk(va(MAXVA), true).unwrap_err(), WalkError::OutOfRange(va(MAXVA)));
}

#[test]
fn walk_without_alloc_reports_missing_tables() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();

    let free = frames.free_count();
    assert_eq!(space.walk(va(0x1000), false).unwrap_err(), WalkError::Missing(va(0x1000)));
    assert_eq!(frames.free_count(), free);

    let entry = space.walk(va(0x1000), true).unwrap();
    assert!(!entry.valid());
    assert_eq!(frames.free_count(), free - 2);
}

#[test]
#[should_panic(expected = "uvmunmap: walk")]
fn unmapping_without_tables_is_fatal() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();
    space.unmap(va(0x1000), 1, false);
}

#[test]
#[should_panic(expected = "uvmunmap: not mapped")]
fn unmapping_an_invalid_entry_is_fatal() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();
    space
        .map(va(0x1000), PAGE_SIZE, PhysicalAddress::new(BASE_DATA), PageTableEntry::user_rw())
        .unwrap();
    space.unmap(va(0x1000), 2, false);
}

#[test]
#[should_panic(expected = "uvmunmap: not aligned")]
fn unaligned_unmap_is_fatal() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();
    space.unmap(va(0x1001), 1, false);
}

#[test]
fn unmap_with_free_drops_one_reference() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();

    let frame = frames.allocate().unwrap();
    frames.add_reference(frame);
    space
        .map(va(0), PAGE_SIZE, frame.base(), PageTableEntry::user_rw())
        .unwrap();
    space.unmap(va(0), 1, true);

    assert_eq!(frames.ref_count(frame), 1);
    assert_eq!(space.translate(va(0)), None);
}

#[test]
fn destroy_returns_every_table_frame() {
    let arena = arena();
    let frames = frames(&arena);
    let free = frames.free_count();

    let space = AddressSpace::create(&arena, &frames).unwrap();
    let pa = PhysicalAddress::new(BASE_DATA);
    space.map(va(0), PAGE_SIZE, pa, PageTableEntry::user_rw()).unwrap();
    space.map(va(1 << 30), PAGE_SIZE, pa, PageTableEntry::user_rw()).unwrap();
    space.map(va(TRAPFRAME), PAGE_SIZE, pa, PageTableEntry::kernel_rw()).unwrap();
    assert_eq!(frames.free_count(), free - 7);

    space.unmap(va(0), 1, false);
    space.unmap(va(1 << 30), 1, false);
    space.unmap(va(TRAPFRAME), 1, false);
    space.destroy();
    assert_eq!(frames.free_count(), free);
}

#[test]
#[should_panic(expected = "freewalk: leaf")]
fn destroying_with_a_live_leaf_is_fatal() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();
    space
        .map(va(0), PAGE_SIZE, PhysicalAddress::new(BASE_DATA), PageTableEntry::user_rw())
        .unwrap();
    space.destroy();
}

#[test]
fn failed_map_removes_its_own_entries() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();
    let _held = drain_to(&frames, 2);

    // 513 pages cross into a second leaf table, which cannot be allocated.
    let err = space
        .map(va(0), 513 * PAGE_SIZE, PhysicalAddress::new(BASE), PageTableEntry::user_rw())
        .unwrap_err();
    assert_eq!(err, VmemError::OutOfMemory);
    assert_eq!(frames.free_count(), 0);

    for page in [0, 1, 511] {
        assert!(!space.walk(va(page * PAGE_SIZE), false).unwrap().valid());
    }

    // The range can be mapped again once the entries are gone.
    space
        .map(va(0), PAGE_SIZE, PhysicalAddress::new(BASE), PageTableEntry::user_rw())
        .unwrap();
}

#[test]
fn grow_maps_zeroed_user_pages_and_shrink_frees_them() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();

    let size = space
        .grow(0, 3 * PAGE_SIZE + 1, PageTableEntry::new().with_writable(true))
        .unwrap();
    assert_eq!(size, 3 * PAGE_SIZE + 1);

    let free = frames.free_count();
    for page in 0..4 {
        let pa = space.translate(va(page * PAGE_SIZE)).expect("mapped");
        let frame = pa.page::<Size4K>();
        assert!(arena.snapshot(frame).iter().all(|&b| b == 0));
        let entry = space.walk(va(page * PAGE_SIZE), false).unwrap();
        assert!(entry.readable() && entry.writable() && entry.user());
    }

    assert_eq!(space.shrink(size, PAGE_SIZE), PAGE_SIZE);
    assert_eq!(frames.free_count(), free + 3);
    assert!(space.translate(va(0)).is_some());
    assert_eq!(space.translate(va(PAGE_SIZE)), None);

    assert_eq!(space.shrink(PAGE_SIZE, 2 * PAGE_SIZE), PAGE_SIZE);
    assert_eq!(space.grow(PAGE_SIZE, 0, PageTableEntry::new()).unwrap(), PAGE_SIZE);
}

#[test]
fn failed_grow_unwinds_its_pages() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();
    let _held = drain_to(&frames, 4);

    // Two table frames plus two data frames fit; the third page does not.
    let err = space
        .grow(0, 5 * PAGE_SIZE, PageTableEntry::new().with_writable(true))
        .unwrap_err();
    assert_eq!(err, VmemError::OutOfMemory);
    assert_eq!(frames.free_count(), 2);
    assert_eq!(space.translate(va(0)), None);
    assert_eq!(space.translate(va(PAGE_SIZE)), None);
}

#[test]
fn clear_user_revokes_user_access() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();
    space.grow(0, 2 * PAGE_SIZE, PageTableEntry::user_rw()).unwrap();

    space.clear_user(va(0));
    assert_eq!(space.translate(va(0)), None);
    assert!(space.translate(va(PAGE_SIZE)).is_some());
}

#[test]
#[should_panic(expected = "uvmclear")]
fn clearing_an_unmapped_page_is_fatal() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();
    space.clear_user(va(0));
}

#[test]
fn user_space_has_kernel_only_trampoline_and_trap_frame() {
    let arena = arena();
    let frames = frames(&arena);
    let trampoline = frames.allocate().unwrap();
    let trap_frame = frames.allocate().unwrap();
    let free = frames.free_count();

    let space =
        AddressSpace::create_user(&arena, &frames, trampoline.base(), trap_frame.base()).unwrap();

    let entry = *space.walk(va(TRAMPOLINE), false).unwrap();
    assert!(entry.readable() && entry.executable() && !entry.writable() && !entry.user());
    assert_eq!(entry.frame(), trampoline);

    let entry = *space.walk(va(TRAPFRAME), false).unwrap();
    assert!(entry.readable() && entry.writable() && !entry.executable() && !entry.user());
    assert_eq!(entry.frame(), trap_frame);
    assert_eq!(space.translate(va(TRAMPOLINE)), None);

    let size = space.grow(0, 2 * PAGE_SIZE, PageTableEntry::user_rw()).unwrap();
    space.free_user(size);

    assert_eq!(frames.free_count(), free);
    assert_eq!(frames.ref_count(trampoline), 1);
    assert_eq!(frames.ref_count(trap_frame), 1);
}

#[test]
fn failed_user_space_creation_leaves_nothing_behind() {
    let arena = arena();
    let frames = frames(&arena);
    let pa = PhysicalAddress::new(BASE_DATA);
    // Root and the upper table fit, the leaf table for the trampoline does not.
    let _held = drain_to(&frames, 2);
    let err = AddressSpace::create_user(&arena, &frames, pa, pa).err();
    assert_eq!(err, Some(VmemError::OutOfMemory));
    assert_eq!(frames.free_count(), 2);
}

#[test]
fn copy_out_and_copy_in_cross_page_boundaries() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();
    space.grow(0, 2 * PAGE_SIZE, PageTableEntry::user_rw()).unwrap();

    let message = b"across the boundary";
    space.copy_out(va(PAGE_SIZE - 6), message).unwrap();

    let mut back = [0u8; 19];
    space.copy_in(&mut back, va(PAGE_SIZE - 6)).unwrap();
    assert_eq!(&back, message);

    let second = space.translate(va(PAGE_SIZE)).unwrap().page::<Size4K>();
    assert_eq!(&arena.snapshot(second)[..13], b" the boundary");
}

#[test]
fn copy_in_str_stops_at_nul() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();
    space.grow(0, 2 * PAGE_SIZE, PageTableEntry::user_rw()).unwrap();
    space.copy_out(va(PAGE_SIZE - 3), b"hello\0junk").unwrap();

    let mut buf = [0xFFu8; 16];
    let len = space.copy_in_str(&mut buf, va(PAGE_SIZE - 3)).unwrap();
    assert_eq!(len, 5);
    assert_eq!(&buf[..6], b"hello\0");

    let mut small = [0u8; 5];
    assert_eq!(
        space.copy_in_str(&mut small, va(PAGE_SIZE - 3)),
        Err(VmemError::StringTooLong)
    );
}

#[test]
fn copy_helpers_respect_permissions() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();
    let frame = frames.allocate().unwrap();
    space
        .map(va(0), PAGE_SIZE, frame.base(), PageTableEntry::user_rx())
        .unwrap();

    assert_eq!(space.copy_out(va(8), b"x"), Err(VmemError::NotWritable(va(0))));
    assert_eq!(
        space.copy_out(va(PAGE_SIZE), b"x"),
        Err(VmemError::Unmapped(va(PAGE_SIZE)))
    );

    let mut buf = [0u8; 4];
    space.copy_in(&mut buf, va(0)).unwrap();
    assert_eq!(buf, [0x05; 4]);
    assert_eq!(
        space.copy_in(&mut buf, va(PAGE_SIZE - 2)),
        Err(VmemError::Unmapped(va(PAGE_SIZE)))
    );
}

#[test]
fn clone_copy_duplicates_contents() {
    let arena = arena();
    let frames = frames(&arena);
    let parent = AddressSpace::create(&arena, &frames).unwrap();
    let child = AddressSpace::create(&arena, &frames).unwrap();
    let size = parent.grow(0, 2 * PAGE_SIZE, PageTableEntry::user_rw()).unwrap();
    parent.copy_out(va(100), b"parent data").unwrap();

    parent.clone_into(&child, size, CloneMode::Copy).unwrap();

    for page in 0..2 {
        let a = parent.translate(va(page * PAGE_SIZE)).unwrap();
        let b = child.translate(va(page * PAGE_SIZE)).unwrap();
        assert_ne!(a, b);
        assert_eq!(arena.snapshot(a.page()), arena.snapshot(b.page()));
        assert_eq!(frames.ref_count(b.page()), 1);
    }

    child.copy_out(va(100), b"child").unwrap();
    let mut buf = [0u8; 11];
    parent.copy_in(&mut buf, va(100)).unwrap();
    assert_eq!(&buf, b"parent data");
}

#[test]
fn clone_share_makes_writable_pages_copy_on_write() {
    let arena = arena();
    let frames = frames(&arena);
    let parent = AddressSpace::create(&arena, &frames).unwrap();
    let child = AddressSpace::create(&arena, &frames).unwrap();

    let text = frames.allocate().unwrap();
    parent
        .map(va(0), PAGE_SIZE, text.base(), PageTableEntry::user_rx())
        .unwrap();
    parent.grow(PAGE_SIZE, 2 * PAGE_SIZE, PageTableEntry::user_rw()).unwrap();

    parent.clone_into(&child, 2 * PAGE_SIZE, CloneMode::Share).unwrap();

    let code = (*parent.walk(va(0), false).unwrap(), *child.walk(va(0), false).unwrap());
    assert_eq!(code.0, code.1);
    assert!(!code.0.cow() && !code.0.writable() && code.0.executable());
    assert_eq!(frames.ref_count(text), 2);

    let data = (*parent.walk(va(PAGE_SIZE), false).unwrap(), *child.walk(va(PAGE_SIZE), false).unwrap());
    assert_eq!(data.0, data.1);
    assert!(data.0.cow() && !data.0.writable() && data.0.user());
    assert_eq!(frames.ref_count(data.0.frame()), 2);
}

#[test]
fn failed_clone_unmaps_the_child() {
    let arena = arena();
    let frames = frames(&arena);
    let parent = AddressSpace::create(&arena, &frames).unwrap();
    let size = parent.grow(0, 4 * PAGE_SIZE, PageTableEntry::user_rw()).unwrap();
    let _held = drain_to(&frames, 5);

    let child = AddressSpace::create(&arena, &frames).unwrap();
    // Two tables and two copies fit, the third copy does not.
    let err = parent.clone_into(&child, size, CloneMode::Copy).unwrap_err();
    assert_eq!(err, VmemError::OutOfMemory);

    for page in 0..4 {
        assert_eq!(child.translate(va(page * PAGE_SIZE)), None);
    }
    child.destroy();
    assert_eq!(frames.free_count(), 5);
}

#[test]
fn dump_lists_valid_entries_by_depth() {
    let arena = arena();
    let frames = frames(&arena);
    let space = AddressSpace::create(&arena, &frames).unwrap();
    let data = PhysicalAddress::new(BASE_DATA);
    space.map(va(0), PAGE_SIZE, data, PageTableEntry::user_rw()).unwrap();

    let mut out = String::new();
    space.dump(&mut out).unwrap();
    let lines: Vec<_> = out.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], format!("page table {}", space.root().base()));
    assert!(lines[1].starts_with(" ..0: pte "));
    assert!(lines[2].starts_with(" .. ..0: pte "));
    assert!(lines[3].starts_with(" .. .. ..0: pte "));
    assert!(lines[3].ends_with(&format!("pa {data}")));
}
