//! The two-phase external merge sorter.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use tracing::debug;

use super::error::SortError;
use super::loser_tree::LoserTree;

/// Temp-file name prefix for run files.
const RUN_FILE_PREFIX: &str = "auxiliary_sort_file";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Accepting records.
    Write,
    /// Write phase closed, merge not yet initialized.
    Sealed,
    /// Merging.
    Read,
}

/// One sorted run: its temp file, and during the read phase a buffered
/// reader plus the run's current front record.
///
/// `file` is taken and closed (deleting the temp file) as soon as the
/// run's last record is consumed; whatever is left is deleted when the
/// sorter drops.
struct Run {
    file: Option<NamedTempFile>,
    reader: Option<BufReader<File>>,
    front: Vec<u8>,
}

/// Sorts an arbitrarily large stream of fixed-width records using
/// bounded memory.
///
/// Records are opaque byte blocks of exactly `record_size` bytes,
/// ordered by a caller-supplied total-order comparator. At most
/// `records_per_file` records are held in memory at a time: each full
/// batch is sorted and spilled to its own run file, and `read` merges
/// the runs through a loser tree with one comparison per tree level.
///
/// The three phases are strictly ordered: `write*`, `end_write`,
/// `begin_read`, `read*`.
///
/// # Example
///
/// ```
/// use grist::sort::ExternalMergeSorter;
///
/// # let dir = tempfile::tempdir().unwrap();
/// let mut sorter = ExternalMergeSorter::new_in(dir.path(), 64, 1024, 4, |a, b| a.cmp(b));
/// for key in [3u32, 1, 2] {
///     sorter.write(&key.to_be_bytes())?;
/// }
/// sorter.end_write()?;
/// sorter.begin_read()?;
///
/// let mut record = [0u8; 4];
/// sorter.read(&mut record)?;
/// assert_eq!(record, 1u32.to_be_bytes());
/// # Ok::<(), grist::sort::SortError>(())
/// ```
pub struct ExternalMergeSorter<C> {
    records_per_page: usize,
    records_per_file: usize,
    record_size: usize,
    cmp: C,
    dir: PathBuf,
    /// Current run's record buffer; holds at most
    /// `records_per_file * record_size` bytes.
    buf: Vec<u8>,
    runs: Vec<Run>,
    len: usize,
    phase: Phase,
    tree: LoserTree,
}

impl<C> ExternalMergeSorter<C>
where
    C: Fn(&[u8], &[u8]) -> Ordering,
{
    /// Creates a sorter that keeps its run files in the working
    /// directory.
    ///
    /// `records_per_page` sizes each run's read buffer,
    /// `records_per_file` bounds how many records a run holds, and
    /// `cmp` must be a total order over `record_size`-byte blocks.
    ///
    /// # Panics
    ///
    /// Panics if any size parameter is zero.
    pub fn new(
        records_per_page: usize,
        records_per_file: usize,
        record_size: usize,
        cmp: C,
    ) -> Self {
        Self::new_in(".", records_per_page, records_per_file, record_size, cmp)
    }

    /// Creates a sorter that keeps its run files in `dir`.
    pub fn new_in(
        dir: impl AsRef<Path>,
        records_per_page: usize,
        records_per_file: usize,
        record_size: usize,
        cmp: C,
    ) -> Self {
        assert!(records_per_page > 0, "records_per_page must be positive");
        assert!(records_per_file > 0, "records_per_file must be positive");
        assert!(record_size > 0, "record_size must be positive");
        ExternalMergeSorter {
            records_per_page,
            records_per_file,
            record_size,
            cmp,
            dir: dir.as_ref().to_path_buf(),
            buf: Vec::with_capacity(records_per_file * record_size),
            runs: Vec::new(),
            len: 0,
            phase: Phase::Write,
            tree: LoserTree::default(),
        }
    }

    /// Total records written so far. The caller tracks consumption
    /// against this count during the read phase.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no records were written.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of run files generated so far.
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Appends one record.
    ///
    /// When the in-memory batch reaches `records_per_file` records it
    /// is sorted and spilled to a run file before this call returns.
    ///
    /// # Panics
    ///
    /// Panics if `record` is not exactly `record_size` bytes.
    pub fn write(&mut self, record: &[u8]) -> Result<(), SortError> {
        if self.phase != Phase::Write {
            return Err(SortError::WriteAfterEnd);
        }
        assert_eq!(record.len(), self.record_size, "record size mismatch");
        self.buf.extend_from_slice(record);
        self.len += 1;
        if self.buf.len() == self.records_per_file * self.record_size {
            self.spill_run()?;
        }
        Ok(())
    }

    /// Closes the write phase, spilling the partially filled final run
    /// (sorted, file sized to exactly the records it holds). Writing
    /// no records at all leaves an empty but valid sorter.
    pub fn end_write(&mut self) -> Result<(), SortError> {
        if self.phase != Phase::Write {
            return Err(SortError::WriteAfterEnd);
        }
        self.spill_run()?;
        self.phase = Phase::Sealed;
        Ok(())
    }

    /// Opens every run with a `records_per_page`-record read buffer,
    /// loads each run's front record, and builds the loser tree.
    pub fn begin_read(&mut self) -> Result<(), SortError> {
        if self.phase != Phase::Sealed {
            return Err(SortError::OutOfPhase);
        }
        for run in &mut self.runs {
            if let Some(file) = &run.file {
                let mut reader = BufReader::with_capacity(
                    self.records_per_page * self.record_size,
                    file.reopen()?,
                );
                // Every run holds at least one record
                reader.read_exact(&mut run.front)?;
                run.reader = Some(reader);
            }
        }
        let Self { runs, cmp, .. } = &*self;
        let tree = LoserTree::build(runs.len(), |a, b| cmp(&runs[a].front, &runs[b].front));
        self.tree = tree;
        self.phase = Phase::Read;
        debug!(fan_in = self.runs.len(), records = self.len, "merge initialized");
        Ok(())
    }

    /// Copies the next record in sorted order into `out` and advances
    /// the merge.
    ///
    /// The sequence of `read` results is non-decreasing under the
    /// comparator; equal keys from different runs come out leftmost
    /// run first. A run's file is closed and deleted as soon as its
    /// last record is consumed.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than `record_size`.
    pub fn read(&mut self, out: &mut [u8]) -> Result<(), SortError> {
        if self.phase != Phase::Read {
            return Err(SortError::OutOfPhase);
        }
        let winner = self.tree.winner().ok_or(SortError::Exhausted)?;
        out[..self.record_size].copy_from_slice(&self.runs[winner].front);

        let alive = self.refill(winner)?;
        let Self { tree, runs, cmp, .. } = self;
        tree.adjust(winner, alive, |a, b| cmp(&runs[a].front, &runs[b].front));
        Ok(())
    }

    /// Sorts the buffered batch and writes it out as one run file.
    fn spill_run(&mut self) -> Result<(), SortError> {
        let record_size = self.record_size;
        let n = self.buf.len() / record_size;
        if n == 0 {
            return Ok(());
        }

        // Stable sort of record positions; the records move once, into
        // the output file.
        let buf = &self.buf;
        let cmp = &self.cmp;
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            cmp(
                &buf[a * record_size..(a + 1) * record_size],
                &buf[b * record_size..(b + 1) * record_size],
            )
        });

        let file = Builder::new()
            .prefix(RUN_FILE_PREFIX)
            .tempfile_in(&self.dir)?;
        let mut writer = BufWriter::new(file.as_file());
        for &i in &order {
            writer.write_all(&buf[i * record_size..(i + 1) * record_size])?;
        }
        writer.flush()?;
        drop(writer);

        debug!(run = self.runs.len(), records = n, "spilled sorted run");
        self.runs.push(Run {
            file: Some(file),
            reader: None,
            front: vec![0; record_size],
        });
        self.buf.clear();
        Ok(())
    }

    /// Loads the next front record of run `i`. On end of file the run
    /// is closed and its temp file deleted; returns whether the run is
    /// still alive.
    fn refill(&mut self, i: usize) -> Result<bool, SortError> {
        let run = &mut self.runs[i];
        let Some(reader) = run.reader.as_mut() else {
            return Ok(false);
        };
        match reader.read_exact(&mut run.front) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                run.reader = None;
                if let Some(file) = run.file.take() {
                    file.close()?;
                }
                Ok(false)
            }
            Err(e) => Err(SortError::Io(e)),
        }
    }
}
