//! Micro-benchmark probe.
//!
//! Writes and reads back a scratch file on the system drive for sequential
//! throughput, hashes a buffer for a rough CPU figure, and times a large
//! memory copy. Numbers are best-effort: the page cache flatters the read
//! figure on machines with plenty of free RAM, which is fine for telling an
//! HDD from an NVMe drive but not for publishing drive reviews.

use rigcheck_core::snapshot::BenchmarkReport;
use rigcheck_core::{CancelToken, Collector, CollectorContext, DiagError, SectionData, SectionKind};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::debug;

const CHUNK_BYTES: usize = 4 * 1024 * 1024;
const FULL_PAYLOAD_MB: u64 = 256;
const QUICK_PAYLOAD_MB: u64 = 32;
const HASH_BYTES_FULL: usize = 64 * 1024 * 1024;
const HASH_BYTES_QUICK: usize = 16 * 1024 * 1024;
const COPY_BYTES_FULL: usize = 128 * 1024 * 1024;
const COPY_BYTES_QUICK: usize = 32 * 1024 * 1024;
const COPY_PASSES: usize = 4;

pub struct BenchmarkCollector;

impl Collector for BenchmarkCollector {
    fn name(&self) -> &'static str {
        "benchmark"
    }

    fn kind(&self) -> SectionKind {
        SectionKind::Benchmark
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(60)
    }

    fn collect(&self, ctx: &CollectorContext) -> Result<SectionData, DiagError> {
        let start = Instant::now();
        let payload_mb = if ctx.quick {
            QUICK_PAYLOAD_MB
        } else {
            FULL_PAYLOAD_MB
        };

        let disk = bench_disk(self.name(), payload_mb, &ctx.cancel)?;
        let cpu_hash_score = bench_hash(if ctx.quick {
            HASH_BYTES_QUICK
        } else {
            HASH_BYTES_FULL
        });

        if ctx.cancel.is_cancelled() {
            return Err(DiagError::collector(self.name(), "cancelled"));
        }
        let memory_copy_mbps = bench_memory_copy(if ctx.quick {
            COPY_BYTES_QUICK
        } else {
            COPY_BYTES_FULL
        });

        Ok(SectionData::Benchmark(BenchmarkReport {
            sequential_read_mbps: disk.read_mbps,
            sequential_write_mbps: disk.write_mbps,
            cpu_hash_score,
            memory_copy_mbps,
            payload_mb,
            duration_ms: start.elapsed().as_millis() as u64,
        }))
    }
}

struct DiskFigures {
    write_mbps: Option<f64>,
    read_mbps: Option<f64>,
}

#[derive(Debug)]
enum BenchAbort {
    Cancelled,
    Io(std::io::Error),
}

impl From<std::io::Error> for BenchAbort {
    fn from(e: std::io::Error) -> Self {
        BenchAbort::Io(e)
    }
}

/// Cancellation aborts the collector; an unwritable temp directory only
/// costs the disk figures.
fn bench_disk(
    name: &'static str,
    payload_mb: u64,
    cancel: &CancelToken,
) -> Result<DiskFigures, DiagError> {
    match try_bench_disk(payload_mb, cancel) {
        Ok(figures) => Ok(figures),
        Err(BenchAbort::Cancelled) => Err(DiagError::collector(name, "cancelled")),
        Err(BenchAbort::Io(e)) => {
            debug!("disk benchmark unavailable: {}", e);
            Ok(DiskFigures {
                write_mbps: None,
                read_mbps: None,
            })
        }
    }
}

fn try_bench_disk(payload_mb: u64, cancel: &CancelToken) -> Result<DiskFigures, BenchAbort> {
    let chunk = make_chunk(CHUNK_BYTES);
    let chunks = ((payload_mb * 1024 * 1024) as usize / CHUNK_BYTES).max(1);
    let total_bytes = chunks * CHUNK_BYTES;

    let mut file = NamedTempFile::new()?;
    let write_start = Instant::now();
    for _ in 0..chunks {
        if cancel.is_cancelled() {
            return Err(BenchAbort::Cancelled);
        }
        file.write_all(&chunk)?;
    }
    file.as_file().sync_all()?;
    let write_secs = write_start.elapsed().as_secs_f64();

    let mut reader = File::open(file.path())?;
    let mut buf = vec![0u8; CHUNK_BYTES];
    let read_start = Instant::now();
    let mut remaining = total_bytes;
    while remaining > 0 {
        if cancel.is_cancelled() {
            return Err(BenchAbort::Cancelled);
        }
        let take = remaining.min(CHUNK_BYTES);
        reader.read_exact(&mut buf[..take])?;
        remaining -= take;
    }
    let read_secs = read_start.elapsed().as_secs_f64();

    Ok(DiskFigures {
        write_mbps: throughput_mbps(total_bytes, write_secs),
        read_mbps: throughput_mbps(total_bytes, read_secs),
    })
}

fn bench_hash(len: usize) -> Option<f64> {
    let data = make_chunk(CHUNK_BYTES);
    let rounds = (len / CHUNK_BYTES).max(1);

    let start = Instant::now();
    let mut hasher = Sha256::new();
    for _ in 0..rounds {
        hasher.update(&data);
    }
    std::hint::black_box(hasher.finalize());
    throughput_mbps(rounds * CHUNK_BYTES, start.elapsed().as_secs_f64())
}

fn bench_memory_copy(len: usize) -> Option<f64> {
    let src = make_chunk(len);
    let mut dst = vec![0u8; len];

    let start = Instant::now();
    for _ in 0..COPY_PASSES {
        dst.copy_from_slice(&src);
        std::hint::black_box(&dst);
    }
    throughput_mbps(len * COPY_PASSES, start.elapsed().as_secs_f64())
}

/// Xorshift fill. Compressing filesystems would flatter an all-zero payload.
fn make_chunk(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    for chunk in data.chunks_mut(8) {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let bytes = state.to_le_bytes();
        let n = chunk.len();
        chunk.copy_from_slice(&bytes[..n]);
    }
    data
}

/// Decimal megabytes per second, the unit drive vendors quote.
fn throughput_mbps(bytes: usize, secs: f64) -> Option<f64> {
    if secs < 1e-6 {
        return None;
    }
    Some(((bytes as f64 / 1_000_000.0 / secs) * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_chunk_is_incompressible_noise() {
        let chunk = make_chunk(1024);
        assert_eq!(chunk.len(), 1024);
        assert!(chunk.iter().any(|b| *b != 0));
        // Deterministic across calls.
        assert_eq!(chunk, make_chunk(1024));
        // Lengths that are not a multiple of 8 still fill completely.
        let odd = make_chunk(13);
        assert_eq!(odd.len(), 13);
    }

    #[test]
    fn test_throughput_math() {
        // 500 MB in 2 seconds.
        assert_eq!(throughput_mbps(500_000_000, 2.0), Some(250.0));
        assert_eq!(throughput_mbps(1_000_000, 0.0), None);
        assert_eq!(throughput_mbps(0, 1.0), Some(0.0));
    }

    #[test]
    fn test_disk_roundtrip_smallest_payload() {
        let figures = try_bench_disk(1, &CancelToken::new()).unwrap();
        assert!(figures.write_mbps.is_some());
        assert!(figures.read_mbps.is_some());
        assert!(figures.write_mbps.unwrap() > 0.0);
    }

    #[test]
    fn test_disk_bench_respects_cancellation() {
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            try_bench_disk(1, &cancel),
            Err(BenchAbort::Cancelled)
        ));
    }

    #[test]
    fn test_hash_and_copy_produce_figures() {
        assert!(bench_hash(CHUNK_BYTES).unwrap() > 0.0);
        assert!(bench_memory_copy(1024 * 1024).unwrap() > 0.0);
    }
}
