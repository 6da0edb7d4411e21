//! Observer callbacks and their fan-out.

use std::cell::RefCell;
use std::io::{self, Read};
use std::path::Path;
use std::rc::Rc;

use output::WriteListener;

use crate::error::ZsyncError;

/// Receives lifecycle and progress notifications from a zsync run.
///
/// Observers are write-only sinks: every method returns nothing, so they
/// cannot steer the engine or promote errors. All hooks default to no-ops;
/// implement the ones of interest.
pub trait ZsyncObserver {
    /// The run has started for the given control-file URI.
    fn zsync_started(&mut self, _uri: &str) {}
    /// Bytes of the control file were read (possibly over HTTP).
    fn control_file_read(&mut self, _bytes: u64) {}
    /// A seed file is about to be scanned.
    fn seed_started(&mut self, _path: &Path) {}
    /// Bytes of the current seed were read during scanning.
    fn seed_bytes_scanned(&mut self, _bytes: u64) {}
    /// A target block was committed to the output file.
    fn block_written(&mut self, _index: usize, _bytes: usize) {}
    /// A slice of a fetched range landed in the output file.
    fn range_received(&mut self, _offset: u64, _bytes: usize) {}
    /// Bytes arrived from the remote server.
    fn bytes_downloaded(&mut self, _bytes: u64) {}
    /// The run failed; the same error is returned to the caller.
    fn zsync_failed(&mut self, _error: &ZsyncError) {}
    /// The run completed and the output file is in place.
    fn zsync_completed(&mut self, _path: &Path) {}
}

/// Synchronously fans notifications out to every registered observer.
///
/// The engine is single-threaded, so a shared `Rc<RefCell<…>>` lets the
/// dispatcher be handed to the output writer and wrapped readers while the
/// orchestrator keeps using it.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    observers: Rc<RefCell<Vec<Box<dyn ZsyncObserver>>>>,
}

macro_rules! dispatch {
    ($self:ident . $hook:ident ( $($arg:expr),* )) => {
        for observer in $self.observers.borrow_mut().iter_mut() {
            observer.$hook($($arg),*);
        }
    };
}

impl EventDispatcher {
    /// Creates a dispatcher over the given observers.
    #[must_use]
    pub fn new(observers: Vec<Box<dyn ZsyncObserver>>) -> Self {
        Self {
            observers: Rc::new(RefCell::new(observers)),
        }
    }

    pub(crate) fn zsync_started(&self, uri: &str) {
        dispatch!(self.zsync_started(uri));
    }

    pub(crate) fn control_file_read(&self, bytes: u64) {
        dispatch!(self.control_file_read(bytes));
    }

    pub(crate) fn seed_started(&self, path: &Path) {
        dispatch!(self.seed_started(path));
    }

    pub(crate) fn seed_bytes_scanned(&self, bytes: u64) {
        dispatch!(self.seed_bytes_scanned(bytes));
    }

    pub(crate) fn block_written(&self, index: usize, bytes: usize) {
        dispatch!(self.block_written(index, bytes));
    }

    pub(crate) fn range_received(&self, offset: u64, bytes: usize) {
        dispatch!(self.range_received(offset, bytes));
    }

    pub(crate) fn bytes_downloaded(&self, bytes: u64) {
        dispatch!(self.bytes_downloaded(bytes));
    }

    pub(crate) fn zsync_failed(&self, error: &ZsyncError) {
        dispatch!(self.zsync_failed(error));
    }

    pub(crate) fn zsync_completed(&self, path: &Path) {
        dispatch!(self.zsync_completed(path));
    }
}

/// Adapter handing the output writer's block notifications to the observers.
pub(crate) struct DispatchWriteListener {
    events: EventDispatcher,
}

impl DispatchWriteListener {
    pub(crate) fn new(events: EventDispatcher) -> Self {
        Self { events }
    }
}

impl WriteListener for DispatchWriteListener {
    fn block_written(&mut self, index: usize, bytes: usize) {
        self.events.block_written(index, bytes);
    }
}

/// Reader adapter reporting how many bytes pass through it.
pub(crate) struct CountingReader<R, F> {
    inner: R,
    report: F,
}

impl<R, F> CountingReader<R, F> {
    pub(crate) fn new(inner: R, report: F) -> Self {
        Self { inner, report }
    }
}

impl<R: Read, F: FnMut(u64)> Read for CountingReader<R, F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        if read > 0 {
            (self.report)(read as u64);
        }
        Ok(read)
    }
}
