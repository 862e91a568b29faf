//! Per-process virtual-memory paging core.
//!
//! Tracks, for one process at a time, which pages are resident in physical memory and which are
//! swapped out, services page faults, and drives one of several pluggable victim-selection
//! policies when a resident page must be evicted. The frame allocator, the hardware page tables,
//! and the swap-file block I/O are all external collaborators, modeled here only as the traits in
//! [`external`] so the core can be driven by in-memory test doubles.

pub mod descriptors;
pub mod error;
pub mod external;
pub mod fault;
pub mod lifecycle;
pub mod offsets;
pub mod policy;
pub mod process;

pub use descriptors::{DescriptorTable, PageDescriptor};
pub use error::PagingError;
pub use external::{Frame, FrameAllocator, MmuFlags, PageTableEditor, SwapFile};
pub use offsets::OffsetAllocator;
pub use policy::{Aq, Lapa, Nfua, ReplacementPolicy, Scfifo};
pub use process::{system_free_fraction, ProcessPagingState, ProcessStatus, SystemSummary, DEFAULT_PROCESSES};

/// Builds the default policy selected by Cargo features, in the priority order scfifo > nfua >
/// lapa > aq when more than one feature is enabled, matching a build-time choice rather than a
/// runtime one.
pub fn default_policy() -> Box<dyn ReplacementPolicy> {
    #[cfg(feature = "scfifo")]
    return Box::new(Scfifo);
    #[cfg(all(not(feature = "scfifo"), feature = "nfua"))]
    return Box::new(Nfua);
    #[cfg(all(not(feature = "scfifo"), not(feature = "nfua"), feature = "lapa"))]
    return Box::new(Lapa);
    #[cfg(all(not(feature = "scfifo"), not(feature = "nfua"), not(feature = "lapa"), feature = "aq"))]
    return Box::new(Aq);
    #[cfg(not(any(feature = "scfifo", feature = "nfua", feature = "lapa", feature = "aq")))]
    compile_error!("at least one replacement-policy feature must be enabled");
}
