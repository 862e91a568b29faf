//! Page-descriptor table and residency queue.
//!
//! These two structures are modeled as one owner: the descriptor table is authoritative, and the
//! residency queue is just an integer-indexed view over it (a left-packed array of descriptor
//! slots currently resident, in the order the active replacement policy cares about).

use crate::error::PagingError;

/// A single page the process has ever allocated, resident or swapped out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDescriptor {
    pub virtual_address: u64,
    pub swap_offset: Option<u64>,
    pub resident: bool,
    pub allocated: bool,
    /// Policy-specific aging word. Meaningless to SCFIFO and AQ.
    pub age: u32,
}

impl PageDescriptor {
    const fn empty() -> Self {
        PageDescriptor { virtual_address: 0, swap_offset: None, resident: false, allocated: false, age: 0 }
    }
}

/// Fixed-capacity page-descriptor table plus its residency queue.
///
/// `descriptors` has a fixed capacity of `MAX_TOTAL_PAGES`, set at construction and never resized.
/// `residency_queue` likewise never exceeds `MAX_PSYC_PAGES` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorTable {
    descriptors: Vec<PageDescriptor>,
    residency_queue: Vec<usize>,
    max_psyc_pages: usize,
}

impl DescriptorTable {
    pub fn new(max_total_pages: usize, max_psyc_pages: usize) -> Self {
        DescriptorTable {
            descriptors: vec![PageDescriptor::empty(); max_total_pages],
            residency_queue: Vec::with_capacity(max_psyc_pages),
            max_psyc_pages,
        }
    }

    pub fn capacity(&self) -> usize {
        self.descriptors.len()
    }

    pub fn max_psyc_pages(&self) -> usize {
        self.max_psyc_pages
    }

    pub fn descriptor(&self, slot: usize) -> &PageDescriptor {
        &self.descriptors[slot]
    }

    pub fn descriptor_mut(&mut self, slot: usize) -> &mut PageDescriptor {
        &mut self.descriptors[slot]
    }

    pub fn find_slot_by_vaddr(&self, va: u64) -> Option<usize> {
        self.descriptors.iter().position(|d| d.allocated && d.virtual_address == va)
    }

    /// Picks the first unallocated slot. Fails with `TooManyPages` when every slot is in use.
    pub fn allocate_slot(&mut self, va: u64, initial_age: u32) -> Result<usize, PagingError> {
        let slot = self
            .descriptors
            .iter()
            .position(|d| !d.allocated)
            .ok_or(PagingError::TooManyPages)?;
        self.descriptors[slot] =
            PageDescriptor { virtual_address: va, swap_offset: None, resident: false, allocated: true, age: initial_age };
        Ok(slot)
    }

    /// Resets the slot whose `virtual_address == va`. Returns the swap offset it was holding, if
    /// it was paged out, so the caller can return it to the free set.
    pub fn free_slot(&mut self, va: u64) -> Result<Option<u64>, PagingError> {
        let slot = self.find_slot_by_vaddr(va).ok_or(PagingError::NoSuchPage(va))?;
        let was_resident = self.descriptors[slot].resident;
        let released_offset = self.descriptors[slot].swap_offset.take();
        self.descriptors[slot] = PageDescriptor::empty();
        if was_resident {
            self.remove_resident(slot);
        }
        Ok(released_offset)
    }

    pub fn resident_count(&self) -> usize {
        self.residency_queue.len()
    }

    pub fn allocated_count(&self) -> usize {
        self.descriptors.iter().filter(|d| d.allocated).count()
    }

    pub fn paged_out_count(&self) -> usize {
        self.descriptors.iter().filter(|d| d.allocated && !d.resident).count()
    }

    pub fn residency_queue(&self) -> &[usize] {
        &self.residency_queue
    }

    pub fn queue_front(&self) -> usize {
        self.residency_queue[0]
    }

    /// Appends `slot` at the tail of the residency queue. Panics with `QueueFull` on overflow,
    /// which can never happen when callers evict before inserting.
    pub fn enqueue_resident(&mut self, slot: usize) {
        assert!(self.residency_queue.len() < self.max_psyc_pages, "QueueFull: residency queue overflow");
        self.descriptors[slot].resident = true;
        self.residency_queue.push(slot);
    }

    /// Removes and returns the head of the residency queue (the oldest resident page).
    pub fn dequeue_resident(&mut self) -> usize {
        assert!(!self.residency_queue.is_empty(), "dequeue_resident called on an empty queue");
        self.residency_queue.remove(0)
    }

    /// Removes `slot` from wherever it sits in the residency queue, compacting left.
    pub fn remove_resident(&mut self, slot: usize) {
        if let Some(pos) = self.residency_queue.iter().position(|&s| s == slot) {
            self.residency_queue.remove(pos);
        }
        self.descriptors[slot].resident = false;
    }
}
