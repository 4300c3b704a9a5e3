//! The write-until-full loop.

use crate::config::{MAX_CONSECUTIVE_SKIPS, MAX_TRANSIENT_RETRIES};
use crate::error::{Error, Result};
use crate::pattern::{ChunkGenerator, Pattern};
use rand::RngCore;
use serde::Serialize;
use std::io::{self, Write};

/// Why a fill loop stopped.
///
/// None of these are failures: running out of room is how every fill ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Exhaustion {
    /// The filesystem reported no space (or quota, or file size limit).
    DiskFull,
    /// A write accepted zero bytes.
    ZeroWrite,
    /// A write kept getting interrupted past the retry limit.
    RetriesExhausted,
    /// Any other write error, treated as the end of usable space.
    WriteError(String),
    /// The configured chunk cap was reached.
    ChunkLimit,
    /// Too many chunks in a row could not be generated.
    CipherFailure,
}

/// What one fill loop achieved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillOutcome {
    pub bytes_written: u64,
    pub chunks_written: u64,
    pub skipped_chunks: u64,
    pub retries: u64,
    pub exhaustion: Exhaustion,
}

/// Fill and scratch buffers for one iteration.
///
/// The scratch buffer is only allocated for [`Pattern::Encrypted`].
pub struct FillBuffers {
    buf: Vec<u8>,
    scratch: Vec<u8>,
}

impl FillBuffers {
    /// Allocate buffers for `pattern` without aborting on allocation failure.
    pub fn allocate(pattern: Pattern, chunk_size: usize) -> Result<Self> {
        let buf = try_alloc(chunk_size)?;
        let scratch = try_alloc(pattern.scratch_len(chunk_size))?;
        Ok(Self { buf, scratch })
    }

    /// Regenerate the fill buffer and return it.
    pub fn generate<R: RngCore>(
        &mut self,
        generator: &mut ChunkGenerator<R>,
        pattern: Pattern,
    ) -> Result<&[u8]> {
        generator.fill(pattern, &mut self.buf, &mut self.scratch)?;
        Ok(&self.buf)
    }
}

fn try_alloc(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::Alloc { bytes: len })?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Write `pattern` chunks to `writer` until it stops accepting data.
///
/// Each chunk is regenerated and handed to a single `write` call. The loop
/// ends on a zero-length write, on a write error, or once `max_chunks`
/// chunks have been written. `Interrupted` errors are retried up to
/// [`MAX_TRANSIENT_RETRIES`] times in a row. A chunk that fails to generate
/// is skipped rather than written.
pub fn fill_until_exhausted<W: Write, R: RngCore>(
    writer: &mut W,
    generator: &mut ChunkGenerator<R>,
    pattern: Pattern,
    buffers: &mut FillBuffers,
    max_chunks: Option<u64>,
) -> FillOutcome {
    let mut bytes_written = 0u64;
    let mut chunks_written = 0u64;
    let mut skipped_chunks = 0u64;
    let mut retries = 0u64;
    let mut consecutive_skips = 0u32;

    let exhaustion = loop {
        if max_chunks.is_some_and(|max| chunks_written >= max) {
            break Exhaustion::ChunkLimit;
        }

        let chunk = match buffers.generate(generator, pattern) {
            Ok(chunk) => chunk,
            Err(e) => {
                skipped_chunks += 1;
                consecutive_skips += 1;
                log::warn!("Skipping {} chunk: {}", pattern, e);
                if consecutive_skips >= MAX_CONSECUTIVE_SKIPS {
                    break Exhaustion::CipherFailure;
                }
                continue;
            }
        };
        consecutive_skips = 0;

        match write_with_retry(writer, chunk, &mut retries) {
            Ok(0) => break Exhaustion::ZeroWrite,
            Ok(n) => {
                bytes_written += n as u64;
                chunks_written += 1;
            }
            Err(e) => break classify(&e),
        }
    };

    log::debug!(
        "Fill stopped after {} chunks ({} bytes): {:?}",
        chunks_written,
        bytes_written,
        exhaustion
    );

    FillOutcome {
        bytes_written,
        chunks_written,
        skipped_chunks,
        retries,
        exhaustion,
    }
}

fn write_with_retry<W: Write>(writer: &mut W, buf: &[u8], retries: &mut u64) -> io::Result<usize> {
    let mut attempts = 0;
    loop {
        match writer.write(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted && attempts < MAX_TRANSIENT_RETRIES => {
                attempts += 1;
                *retries += 1;
                log::debug!("Write interrupted, retrying ({}/{})", attempts, MAX_TRANSIENT_RETRIES);
            }
            result => return result,
        }
    }
}

fn classify(e: &io::Error) -> Exhaustion {
    if e.kind() == io::ErrorKind::Interrupted {
        return Exhaustion::RetriesExhausted;
    }
    if is_out_of_space(e) {
        return Exhaustion::DiskFull;
    }
    Exhaustion::WriteError(e.to_string())
}

#[cfg(unix)]
fn is_out_of_space(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(libc::ENOSPC) | Some(libc::EDQUOT) | Some(libc::EFBIG)
    )
}

#[cfg(not(unix))]
fn is_out_of_space(_e: &io::Error) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHUNK: usize = 1024;

    /// Accepts `limit` full writes, then fails the way `failure` says.
    struct FailingWriter {
        calls: usize,
        limit: usize,
        failure: fn() -> io::Result<usize>,
        received: Vec<u8>,
    }

    impl FailingWriter {
        fn new(limit: usize, failure: fn() -> io::Result<usize>) -> Self {
            Self {
                calls: 0,
                limit,
                failure,
                received: Vec::new(),
            }
        }
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.calls > self.limit {
                return (self.failure)();
            }
            self.received.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn disk_full() -> io::Result<usize> {
        Err(io::Error::from_raw_os_error(libc::ENOSPC))
    }

    fn zero_write() -> io::Result<usize> {
        Ok(0)
    }

    fn interrupted() -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::Interrupted))
    }

    fn permission_denied() -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::PermissionDenied))
    }

    fn run(writer: &mut FailingWriter, pattern: Pattern, max_chunks: Option<u64>) -> FillOutcome {
        let mut generator = ChunkGenerator::seeded(11);
        let mut buffers = FillBuffers::allocate(pattern, CHUNK).unwrap();
        fill_until_exhausted(writer, &mut generator, pattern, &mut buffers, max_chunks)
    }

    #[test]
    fn test_stops_after_k_successful_writes() {
        for pattern in Pattern::ALL {
            let mut writer = FailingWriter::new(5, disk_full);
            let outcome = run(&mut writer, pattern, None);

            assert_eq!(outcome.bytes_written, 5 * CHUNK as u64);
            assert_eq!(outcome.chunks_written, 5);
            assert_eq!(outcome.exhaustion, Exhaustion::DiskFull);
        }
    }

    #[test]
    fn test_zero_length_write_ends_loop() {
        let mut writer = FailingWriter::new(3, zero_write);
        let outcome = run(&mut writer, Pattern::Ones, None);

        assert_eq!(outcome.bytes_written, 3 * CHUNK as u64);
        assert_eq!(outcome.exhaustion, Exhaustion::ZeroWrite);
    }

    #[test]
    fn test_fails_immediately() {
        let mut writer = FailingWriter::new(0, disk_full);
        let outcome = run(&mut writer, Pattern::Random, None);

        assert_eq!(outcome.bytes_written, 0);
        assert_eq!(outcome.exhaustion, Exhaustion::DiskFull);
    }

    #[test]
    fn test_other_errors_end_loop() {
        let mut writer = FailingWriter::new(2, permission_denied);
        let outcome = run(&mut writer, Pattern::Zeros, None);

        assert_eq!(outcome.bytes_written, 2 * CHUNK as u64);
        assert!(matches!(outcome.exhaustion, Exhaustion::WriteError(_)));
    }

    #[test]
    fn test_persistent_interrupts_exhaust_retries() {
        let mut writer = FailingWriter::new(1, interrupted);
        let outcome = run(&mut writer, Pattern::Zeros, None);

        assert_eq!(outcome.bytes_written, CHUNK as u64);
        assert_eq!(outcome.retries, MAX_TRANSIENT_RETRIES as u64);
        assert_eq!(outcome.exhaustion, Exhaustion::RetriesExhausted);
    }

    #[test]
    fn test_transient_interrupt_is_retried() {
        struct FlakyWriter {
            calls: usize,
        }

        impl Write for FlakyWriter {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.calls += 1;
                match self.calls {
                    2 => Err(io::Error::from(io::ErrorKind::Interrupted)),
                    c if c > 4 => disk_full(),
                    _ => Ok(buf.len()),
                }
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut generator = ChunkGenerator::seeded(5);
        let mut buffers = FillBuffers::allocate(Pattern::Ones, CHUNK).unwrap();
        let mut writer = FlakyWriter { calls: 0 };
        let outcome =
            fill_until_exhausted(&mut writer, &mut generator, Pattern::Ones, &mut buffers, None);

        assert_eq!(outcome.chunks_written, 3);
        assert_eq!(outcome.retries, 1);
        assert_eq!(outcome.exhaustion, Exhaustion::DiskFull);
    }

    #[test]
    fn test_chunk_limit() {
        let mut writer = FailingWriter::new(100, disk_full);
        let outcome = run(&mut writer, Pattern::Encrypted, Some(4));

        assert_eq!(outcome.bytes_written, 4 * CHUNK as u64);
        assert_eq!(outcome.exhaustion, Exhaustion::ChunkLimit);
        assert_eq!(writer.calls, 4);
    }

    #[test]
    fn test_written_bytes_match_pattern() {
        let mut writer = FailingWriter::new(3, disk_full);
        run(&mut writer, Pattern::Zeros, None);
        assert_eq!(writer.received.len(), 3 * CHUNK);
        assert!(writer.received.iter().all(|&b| b == 0x00));

        let mut writer = FailingWriter::new(3, disk_full);
        run(&mut writer, Pattern::Ones, None);
        assert!(writer.received.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_random_chunks_are_not_repeated() {
        for pattern in [Pattern::Random, Pattern::Encrypted] {
            let mut writer = FailingWriter::new(2, disk_full);
            run(&mut writer, pattern, None);
            let (first, second) = writer.received.split_at(CHUNK);
            assert_ne!(first, second);
        }
    }

    #[test]
    fn test_cipher_failure_skips_chunks() {
        let mut generator = ChunkGenerator::seeded(1);
        // No scratch space: every encrypted chunk fails to generate
        let mut buffers = FillBuffers {
            buf: vec![0u8; CHUNK],
            scratch: Vec::new(),
        };
        let mut writer = FailingWriter::new(100, disk_full);

        let outcome = fill_until_exhausted(
            &mut writer,
            &mut generator,
            Pattern::Encrypted,
            &mut buffers,
            None,
        );

        assert_eq!(writer.calls, 0);
        assert_eq!(outcome.bytes_written, 0);
        assert_eq!(outcome.skipped_chunks, MAX_CONSECUTIVE_SKIPS as u64);
        assert_eq!(outcome.exhaustion, Exhaustion::CipherFailure);
    }

    #[test]
    fn test_allocation_failure() {
        let result = FillBuffers::allocate(Pattern::Zeros, usize::MAX);
        assert!(matches!(result, Err(Error::Alloc { .. })));

        let buffers = FillBuffers::allocate(Pattern::Encrypted, CHUNK).unwrap();
        assert_eq!(buffers.buf.len(), CHUNK);
        assert_eq!(buffers.scratch.len(), CHUNK + 16);
    }
}
