//! Page-fault handler and eviction (sections 4.3 and 4.4).

use log::{debug, warn};

use crate::error::PagingError;
use crate::external::{FrameAllocator, MmuFlags, PageTableEditor};
use crate::process::ProcessPagingState;

/// Service a page fault at `faulting_address`.
///
/// Invoked from the trap dispatcher on the page-fault vector with a valid current-process handle.
/// Evicts a victim first if the residency queue is full, strictly before the new frame is mapped
/// in.
pub fn service_fault<F: FrameAllocator, E: PageTableEditor>(
    proc: &mut ProcessPagingState,
    frames: &mut F,
    editor: &mut E,
    faulting_address: u64,
) -> Result<(), PagingError> {
    proc.page_faults_total += 1;

    let va = proc.page_down(faulting_address);
    let slot = proc.table.find_slot_by_vaddr(va).filter(|&s| proc.table.descriptor(s).allocated);
    let slot = match slot {
        Some(s) => s,
        None => return Err(PagingError::NotOurPage(faulting_address)),
    };

    if proc.table.resident_count() == proc.max_psyc_pages {
        evict(proc, frames, editor);
    }

    let frame = match frames.alloc_frame() {
        Some(f) => f,
        None => {
            warn!("pid {}: out of memory servicing fault at {:#x}", proc.pid, faulting_address);
            return Err(PagingError::OutOfMemory);
        }
    };

    let offset = proc.table.descriptor(slot).swap_offset.expect("paged-out descriptor missing swap offset");
    let mut page = vec![0u8; proc.page_size as usize];
    proc.read_swap(&mut page, offset);
    frames.write_frame(frame, &page);

    editor.map_resident(va, frame, MmuFlags { present: true, paged: false, accessed: false, writable: true, user: true });

    let d = proc.table.descriptor_mut(slot);
    d.resident = true;
    proc.offsets.free_offset(offset);
    proc.table.descriptor_mut(slot).swap_offset = None;

    proc.table.enqueue_resident(slot);
    proc.paged_out_now -= 1;

    debug!("pid {}: fault-in {:#x} (slot {})", proc.pid, va, slot);
    Ok(())
}

/// Evict a page to make room for a new resident page. Called when
/// `paged_out_now + resident_count == MAX_PSYC_PAGES` and a new page must become resident.
pub fn evict<F: FrameAllocator, E: PageTableEditor>(proc: &mut ProcessPagingState, frames: &mut F, editor: &mut E) {
    let victim = proc.policy.pick_victim(&mut proc.table, editor);
    let va = proc.table.descriptor(victim).virtual_address;

    let frame = editor.current_frame(va);
    let mut page = vec![0u8; proc.page_size as usize];
    frames.read_frame(frame, &mut page);

    let offset = proc.offsets.alloc_offset();
    proc.write_swap(&page, offset);

    editor.mark_paged_out(va);
    frames.free_frame(frame);

    let d = proc.table.descriptor_mut(victim);
    d.resident = false;
    d.swap_offset = Some(offset);

    proc.paged_out_now += 1;
    proc.paged_out_total += 1;

    debug!("pid {}: evicted {:#x} (slot {}) to offset {:#x}", proc.pid, va, victim, offset);
}
