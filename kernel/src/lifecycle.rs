//! Process lifecycle hooks: grow/shrink, fork, exec, exit.

use log::info;

use crate::descriptors::DescriptorTable;
use crate::error::PagingError;
use crate::external::{Frame, FrameAllocator, MmuFlags, PageTableEditor, SwapFile};
use crate::fault::evict;
use crate::offsets::OffsetAllocator;
use crate::policy::ReplacementPolicy;
use crate::process::ProcessPagingState;

/// Grows the process by one page at `va`. Evicts a resident page first
/// if the residency queue is already full, then zeroes and maps the new frame.
pub fn allocate<F: FrameAllocator, E: PageTableEditor>(
    proc: &mut ProcessPagingState,
    frames: &mut F,
    editor: &mut E,
    va: u64,
) -> Result<(), PagingError> {
    let va = proc.page_down(va);
    let initial_age = proc.policy.initial_age();
    let slot = proc.table.allocate_slot(va, initial_age)?;

    if proc.table.resident_count() == proc.max_psyc_pages {
        evict(proc, frames, editor);
    }

    let frame = match frames.alloc_frame() {
        Some(f) => f,
        None => {
            proc.table.free_slot(va).ok();
            return Err(PagingError::OutOfMemory);
        }
    };
    let zero = vec![0u8; proc.page_size as usize];
    frames.write_frame(frame, &zero);
    editor.map_resident(va, frame, MmuFlags { present: true, paged: false, accessed: false, writable: true, user: true });

    proc.table.descriptor_mut(slot).resident = true;
    proc.table.enqueue_resident(slot);
    proc.allocated_pages += 1;
    Ok(())
}

/// Shrinks the process by releasing the page at `va`.
pub fn deallocate<F: FrameAllocator, E: PageTableEditor>(
    proc: &mut ProcessPagingState,
    frames: &mut F,
    editor: &mut E,
    va: u64,
) -> Result<(), PagingError> {
    let va = proc.page_down(va);
    let slot = proc.table.find_slot_by_vaddr(va).ok_or(PagingError::NoSuchPage(va))?;

    if proc.table.descriptor(slot).resident {
        let frame = editor.current_frame(va);
        frames.free_frame(frame);
    }
    editor.unmap(va);

    if let Some(offset) = proc.table.free_slot(va)? {
        proc.offsets.free_offset(offset);
        proc.paged_out_now -= 1;
    }
    proc.allocated_pages -= 1;
    Ok(())
}

/// Copies `parent`'s paging state into a freshly created child process.
///
/// The descriptor table, residency queue, and free-offset set are duplicated verbatim. The
/// external page-table copy that backs this is out of scope here; a caller is expected to run its
/// own `copyMem`-style loop over the resident pages before this returns. Fault counters start at
/// zero for the child; the paged-out page count carries over since it reflects real state the
/// child now owns. Reserved PIDs at or below `DEFAULT_PROCESSES` never get a swap file.
pub fn fork(
    parent: &mut ProcessPagingState,
    child_pid: u32,
    child_name: impl Into<String>,
    child_policy: Box<dyn ReplacementPolicy>,
    child_swap: Option<Box<dyn SwapFile>>,
) -> ProcessPagingState {
    let mut child = ProcessPagingState::new(
        child_pid,
        child_name,
        parent.max_total_pages,
        parent.max_psyc_pages,
        parent.page_size,
        child_policy,
        None,
    );
    child.table = parent.table.clone();
    child.offsets = parent.offsets.clone();
    child.allocated_pages = parent.allocated_pages;
    child.paged_out_now = parent.paged_out_now;

    if !ProcessPagingState::is_reserved(child_pid) {
        let mut swap = child_swap.expect("non-reserved child must be given a swap file to fork into");
        swap.create().expect("SwapIoError: failed to create child swap file");
        for slot in 0..parent.table.capacity() {
            if let Some(offset) = parent.table.descriptor(slot).swap_offset {
                let mut page = vec![0u8; parent.page_size as usize];
                parent.read_swap(&mut page, offset);
                swap.write(&page, offset).expect("SwapIoError: failed to copy page into child swap file");
            }
        }
        child.set_swap(Some(swap));
    }

    info!("pid {}: forked from pid {}", child.pid, parent.pid);
    child
}

/// Replaces the running image. Clears the descriptor table, the residency queue, the free-offset
/// set, and all four page counters to their initial-process state before handing control to
/// `loader`, matching `initializePagesDataExec`'s backup-then-clean step. Transactional: on loader
/// failure every one of those is restored verbatim from the pre-exec backup and the existing swap
/// file is left untouched, so a failed exec leaves the old image intact.
///
/// The old image's resident frames are kept allocated while `loader` builds the new one, exactly
/// like `exec()` building a fresh `pgdir` while `oldpgdir` is still live; they are only released,
/// one `freevm(oldpgdir)`-style pass, once the load has actually succeeded.
pub fn exec<F: FrameAllocator, E: PageTableEditor>(
    proc: &mut ProcessPagingState,
    frames: &mut F,
    editor: &mut E,
    new_swap: Option<Box<dyn SwapFile>>,
    loader: impl FnOnce(&mut ProcessPagingState, &mut F, &mut E) -> Result<(), PagingError>,
) -> Result<(), PagingError> {
    let snapshot_table = proc.table.clone();
    let snapshot_offsets = proc.offsets.clone();
    let snapshot_allocated = proc.allocated_pages;
    let snapshot_paged_out_now = proc.paged_out_now;
    let snapshot_faults_total = proc.page_faults_total;
    let snapshot_paged_out_total = proc.paged_out_total;

    let old_resident: Vec<(u64, Frame)> = (0..snapshot_table.capacity())
        .filter_map(|slot| {
            let d = snapshot_table.descriptor(slot);
            (d.allocated && d.resident).then(|| (d.virtual_address, editor.current_frame(d.virtual_address)))
        })
        .collect();

    proc.table = DescriptorTable::new(proc.max_total_pages, proc.max_psyc_pages);
    proc.offsets = OffsetAllocator::new(proc.max_total_pages, proc.page_size);
    proc.allocated_pages = 0;
    proc.paged_out_now = 0;
    proc.page_faults_total = 0;
    proc.paged_out_total = 0;

    match loader(proc, frames, editor) {
        Ok(()) => {
            for (va, frame) in old_resident {
                let reused = proc.table.find_slot_by_vaddr(va).map(|s| proc.table.descriptor(s).resident).unwrap_or(false);
                frames.free_frame(frame);
                if !reused {
                    editor.unmap(va);
                }
            }
            if !ProcessPagingState::is_reserved(proc.pid) {
                proc.remove_swap();
                if let Some(mut swap) = new_swap {
                    swap.create().expect("SwapIoError: failed to create post-exec swap file");
                    proc.set_swap(Some(swap));
                }
            }
            info!("pid {}: exec succeeded", proc.pid);
            Ok(())
        }
        Err(e) => {
            proc.table = snapshot_table;
            proc.offsets = snapshot_offsets;
            proc.allocated_pages = snapshot_allocated;
            proc.paged_out_now = snapshot_paged_out_now;
            proc.page_faults_total = snapshot_faults_total;
            proc.paged_out_total = snapshot_paged_out_total;
            Err(e)
        }
    }
}

/// Tears down a process's paging state. Frame reclaim and page-table
/// teardown are the caller's responsibility; this just removes the swap file.
pub fn exit(proc: &mut ProcessPagingState) {
    proc.remove_swap();
}
