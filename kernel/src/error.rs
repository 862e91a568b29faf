//! Error kinds the paging core may raise.
//!
//! Only the recoverable kinds live here. `QueueFull`, `OffsetOverflow`, and `SwapIoError` indicate
//! a broken invariant or an unrecoverable I/O failure and are raised as `panic!` at the point of
//! failure instead, since there is nothing a caller could do with them.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PagingError {
    /// The faulting address is not backed by any allocated descriptor. The trap dispatcher treats
    /// this as a user-space fault and kills the process.
    #[error("virtual address {0:#x} is not a page belonging to this process")]
    NotOurPage(u64),

    /// The frame allocator was exhausted while servicing a fault. The fault is left unresolved.
    #[error("out of physical memory while servicing a page fault")]
    OutOfMemory,

    /// Growing the process would exceed `MAX_TOTAL_PAGES`.
    #[error("process would exceed the maximum number of pages it may allocate")]
    TooManyPages,

    /// No descriptor matches the given virtual address.
    #[error("virtual address {0:#x} has no page descriptor")]
    NoSuchPage(u64),

    /// The exec loader rejected the new image; the pre-exec snapshot has been restored.
    #[error("exec loader failed: {0}")]
    LoaderFailure(&'static str),
}
