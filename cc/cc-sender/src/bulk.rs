// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The bulk data mover that runs alongside the control driver: a real but
//! minimal peer, grounded on `server_sender.cc`'s `send_data_thread` and
//! `new_client_receiver.cc`/`new_client_receiver_nocomm.cc`'s read loop.
//! Both sides coordinate with the control driver on a single `send_traffic`
//! flag and stop as soon as it flips false or the requested byte count is
//! reached — neither one invents a framing or handshake of its own, since
//! the actual bulk-transfer wire protocol is out of scope here; this is
//! filler bytes over whatever `AsyncWrite`/`AsyncRead` sink the caller
//! hands in.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of each write/read chunk.
const CHUNK_LEN: usize = 64 * 1024;

/// Writes `total_bytes` of filler data to `sink` in [`CHUNK_LEN`] chunks,
/// stopping early if `send_traffic` flips false. Returns the number of
/// bytes actually written.
pub async fn send_all<W: AsyncWrite + Unpin>(
    sink: &mut W,
    total_bytes: u64,
    send_traffic: Arc<AtomicBool>,
) -> std::io::Result<u64> {
    let chunk = vec![0u8; CHUNK_LEN];
    let mut written = 0u64;
    while written < total_bytes && send_traffic.load(Ordering::Relaxed) {
        let remaining = (total_bytes - written) as usize;
        let n = remaining.min(CHUNK_LEN);
        sink.write_all(&chunk[..n]).await?;
        written += n as u64;
    }
    sink.flush().await?;
    send_traffic.store(false, Ordering::Relaxed);
    Ok(written)
}

/// Drains up to `total_bytes` from `source` in [`CHUNK_LEN]` chunks,
/// stopping early on EOF or once `send_traffic` flips false. `progress` is
/// bumped by each chunk's length as it's read, so a concurrent perf-log
/// task can read a live cumulative byte count without waiting for this
/// function to return. Returns the number of bytes actually read.
pub async fn recv_all<R: AsyncRead + Unpin>(
    source: &mut R,
    total_bytes: u64,
    send_traffic: Arc<AtomicBool>,
    progress: Arc<AtomicU64>,
) -> std::io::Result<u64> {
    let mut chunk = vec![0u8; CHUNK_LEN];
    let mut read = 0u64;
    while read < total_bytes && send_traffic.load(Ordering::Relaxed) {
        let remaining = (total_bytes - read) as usize;
        let want = remaining.min(CHUNK_LEN);
        let n = source.read(&mut chunk[..want]).await?;
        if n == 0 {
            break;
        }
        read += n as u64;
        progress.fetch_add(n as u64, Ordering::Relaxed);
    }
    send_traffic.store(false, Ordering::Relaxed);
    Ok(read)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_all_writes_exactly_the_requested_byte_count() {
        let mut buf = Vec::new();
        let flag = Arc::new(AtomicBool::new(true));
        let written = send_all(&mut buf, 200_000, flag.clone()).await.unwrap();
        assert_eq!(written, 200_000);
        assert_eq!(buf.len(), 200_000);
        assert!(!flag.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn send_all_stops_early_when_send_traffic_flips_false() {
        let mut buf = Vec::new();
        let flag = Arc::new(AtomicBool::new(false));
        let written = send_all(&mut buf, 200_000, flag).await.unwrap();
        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn recv_all_reads_what_was_sent() {
        let (mut client, mut server) = tokio::io::duplex(8 * 1024);
        let flag = Arc::new(AtomicBool::new(true));
        let progress = Arc::new(AtomicU64::new(0));
        let writer = tokio::spawn(async move { send_all(&mut client, 100_000, Arc::new(AtomicBool::new(true))).await });
        let read = recv_all(&mut server, 100_000, flag, progress.clone()).await.unwrap();
        writer.await.unwrap().unwrap();
        assert_eq!(read, 100_000);
        assert_eq!(progress.load(Ordering::Relaxed), 100_000);
    }
}
