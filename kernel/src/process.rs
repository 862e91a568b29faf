//! Per-process paging state and the status pretty-printer.

use core::fmt;

use crate::descriptors::DescriptorTable;
use crate::offsets::OffsetAllocator;
use crate::policy::ReplacementPolicy;

/// Processes at or below this PID are exempt from swap-file creation and exec-time swap
/// replacement.
pub const DEFAULT_PROCESSES: u32 = 2;

/// Everything the paging core tracks for one process.
pub struct ProcessPagingState {
    pub pid: u32,
    pub name: String,
    pub max_total_pages: usize,
    pub max_psyc_pages: usize,
    pub page_size: u64,

    pub(crate) table: DescriptorTable,
    pub(crate) offsets: OffsetAllocator,
    pub(crate) policy: Box<dyn ReplacementPolicy>,
    swap: Option<Box<dyn crate::external::SwapFile>>,

    pub allocated_pages: usize,
    pub paged_out_now: usize,
    pub page_faults_total: u64,
    pub paged_out_total: u64,
}

impl ProcessPagingState {
    /// Creates a fresh process. `swap` is `None` for reserved PIDs; otherwise it must
    /// already have been `create()`d by the caller, mirroring `createSwapFile` being called from
    /// `fork`/exec before the paging state is touched.
    pub fn new(
        pid: u32,
        name: impl Into<String>,
        max_total_pages: usize,
        max_psyc_pages: usize,
        page_size: u64,
        policy: Box<dyn ReplacementPolicy>,
        swap: Option<Box<dyn crate::external::SwapFile>>,
    ) -> Self {
        ProcessPagingState {
            pid,
            name: name.into(),
            max_total_pages,
            max_psyc_pages,
            page_size,
            table: DescriptorTable::new(max_total_pages, max_psyc_pages),
            offsets: OffsetAllocator::new(max_total_pages, page_size),
            policy,
            swap,
            allocated_pages: 0,
            paged_out_now: 0,
            page_faults_total: 0,
            paged_out_total: 0,
        }
    }

    pub fn is_reserved(pid: u32) -> bool {
        pid <= DEFAULT_PROCESSES
    }

    pub fn page_down(&self, addr: u64) -> u64 {
        addr & !(self.page_size - 1)
    }

    pub fn table(&self) -> &DescriptorTable {
        &self.table
    }

    pub fn offsets(&self) -> &OffsetAllocator {
        &self.offsets
    }

    pub fn has_swap_file(&self) -> bool {
        self.swap.is_some()
    }

    pub(crate) fn read_swap(&mut self, buf: &mut [u8], offset: u64) {
        self.swap
            .as_mut()
            .expect("read_swap called on a process with no swap file")
            .read(buf, offset)
            .expect("SwapIoError: swap read failed");
    }

    pub(crate) fn write_swap(&mut self, buf: &[u8], offset: u64) {
        self.swap
            .as_mut()
            .expect("write_swap called on a process with no swap file")
            .write(buf, offset)
            .expect("SwapIoError: swap write failed");
    }

    pub(crate) fn remove_swap(&mut self) {
        if let Some(swap) = self.swap.as_mut() {
            swap.remove();
        }
        self.swap = None;
    }

    pub(crate) fn set_swap(&mut self, swap: Option<Box<dyn crate::external::SwapFile>>) {
        self.swap = swap;
    }

    /// Runs the aging/queue-advance routine for one clock tick that returns the process to the
    /// scheduler. NFUA/LAPA age every allocated page; AQ advances the
    /// residency queue; SCFIFO does nothing.
    pub fn tick(&mut self, editor: &mut dyn crate::external::PageTableEditor) {
        self.policy.on_tick(&mut self.table, editor);
    }
}

/// `<pid> state=<s> alloc=<a> paged-out=<p> faults=<f> paged-out-total=<t> <name>`.
pub struct ProcessStatus<'a> {
    pub proc: &'a ProcessPagingState,
    pub state: &'a str,
}

impl<'a> fmt::Display for ProcessStatus<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} state={} alloc={} paged-out={} faults={} paged-out-total={} {}",
            self.proc.pid,
            self.state,
            self.proc.allocated_pages,
            self.proc.paged_out_now,
            self.proc.page_faults_total,
            self.proc.paged_out_total,
            self.proc.name,
        )
    }
}

/// The percentage of system RAM still free, as `procdump`'s trailing summary line reports it.
pub fn system_free_fraction(frames: &dyn crate::external::FrameAllocator) -> f32 {
    frames.free_fraction() * 100.0
}

/// `procdump`'s trailing `% free pages in the system` line, printed once after every process's
/// `ProcessStatus` line.
pub struct SystemSummary<'a> {
    pub frames: &'a dyn crate::external::FrameAllocator,
}

impl<'a> fmt::Display for SystemSummary<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}% free pages in the system", system_free_fraction(self.frames))
    }
}
