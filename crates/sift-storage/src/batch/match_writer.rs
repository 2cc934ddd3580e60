//! MatchWriter: bounded channel + dedicated thread that batches match rows
//! into the store, so the extraction path never waits on SQLite.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, warn};

use sift_core::errors::{SiftError, SiftResult, StorageError};
use sift_core::models::MatchRecord;
use sift_core::traits::IPatternStorage;

/// Queue depth before `record` starts dropping.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Most rows written per transaction.
const MAX_BATCH: usize = 256;

enum WriterCommand {
    Record(MatchRecord),
    Flush(Sender<()>),
}

/// Final counters returned by [`MatchWriter::shutdown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchWriterStats {
    pub written: u64,
    pub batches: u64,
    pub failed_batches: u64,
    /// Records refused because the queue was full or closed.
    pub dropped: u64,
}

pub struct MatchWriter {
    sender: Option<Sender<WriterCommand>>,
    handle: Option<JoinHandle<MatchWriterStats>>,
    dropped: Arc<AtomicU64>,
}

impl MatchWriter {
    pub fn new(store: Arc<dyn IPatternStorage>) -> Self {
        Self::with_capacity(store, DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(store: Arc<dyn IPatternStorage>, capacity: usize) -> Self {
        let (sender, receiver) = bounded::<WriterCommand>(capacity.max(1));
        let handle = thread::Builder::new()
            .name("sift-match-writer".to_string())
            .spawn(move || writer_loop(store, receiver))
            .ok();
        if handle.is_none() {
            warn!("failed to spawn match writer thread; match history disabled");
        }
        Self {
            sender: handle.as_ref().map(|_| sender),
            handle,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Queue a match row without blocking. Returns false when the row was
    /// dropped (queue full or writer gone).
    pub fn record(&self, record: MatchRecord) -> bool {
        let Some(sender) = &self.sender else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };
        match sender.try_send(WriterCommand::Record(record)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("match writer queue full; dropping match record");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("match writer stopped; dropping match record");
                false
            }
        }
    }

    /// Block until everything queued before this call is written.
    pub fn flush(&self) -> SiftResult<()> {
        let sender = self.sender.as_ref().ok_or_else(closed)?;
        let (ack_tx, ack_rx) = bounded(1);
        sender
            .send(WriterCommand::Flush(ack_tx))
            .map_err(|_| closed())?;
        ack_rx.recv().map_err(|_| closed())
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Close the queue, drain it, and join the thread.
    pub fn shutdown(mut self) -> SiftResult<MatchWriterStats> {
        self.stop()
    }

    fn stop(&mut self) -> SiftResult<MatchWriterStats> {
        drop(self.sender.take());
        let mut stats = match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| {
                SiftError::StorageError(StorageError::WriterClosed {
                    reason: "match writer thread panicked".to_string(),
                })
            })?,
            None => MatchWriterStats::default(),
        };
        stats.dropped = self.dropped();
        Ok(stats)
    }
}

impl Drop for MatchWriter {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.stop();
        }
    }
}

fn closed() -> SiftError {
    SiftError::StorageError(StorageError::WriterClosed {
        reason: "match writer is not running".to_string(),
    })
}

fn writer_loop(
    store: Arc<dyn IPatternStorage>,
    receiver: Receiver<WriterCommand>,
) -> MatchWriterStats {
    let mut stats = MatchWriterStats::default();
    let mut buffer: Vec<MatchRecord> = Vec::with_capacity(MAX_BATCH);

    while let Ok(first) = receiver.recv() {
        let mut acks = Vec::new();
        let mut pending = Some(first);
        while let Some(cmd) = pending.take() {
            match cmd {
                WriterCommand::Record(r) => buffer.push(r),
                WriterCommand::Flush(ack) => acks.push(ack),
            }
            if buffer.len() >= MAX_BATCH {
                write_batch(store.as_ref(), &mut buffer, &mut stats);
            }
            pending = receiver.try_recv().ok();
        }
        write_batch(store.as_ref(), &mut buffer, &mut stats);
        for ack in acks {
            let _ = ack.send(());
        }
    }

    debug!(written = stats.written, batches = stats.batches, "match writer drained");
    stats
}

fn write_batch(
    store: &dyn IPatternStorage,
    buffer: &mut Vec<MatchRecord>,
    stats: &mut MatchWriterStats,
) {
    if buffer.is_empty() {
        return;
    }
    match store.record_matches(buffer) {
        Ok(n) => {
            stats.written += n as u64;
            stats.batches += 1;
        }
        Err(e) => {
            stats.failed_batches += 1;
            warn!(rows = buffer.len(), error = %e, "match history write failed; rows discarded");
        }
    }
    buffer.clear();
}
