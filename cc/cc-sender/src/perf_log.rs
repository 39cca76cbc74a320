// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Appends one tab-separated row per control tick to a performance-log
//! file, using the exact RL-mode schema the original tooling parses.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Column order and names match the original tooling verbatim: `min_rtt, avg_urtt,
/// cnt, srtt_us, avg_thr, thr_cnt, pacing_rate, loss_bytes, packets_out,
/// retrans_out, max_packets_out, cwnd_kernel, cwnd_assigned`.
const HEADER: &str = "min_rtt\tavg_urtt\tcnt\tsrtt_us\tavg_thr\tthr_cnt\tpacing_rate\tloss_bytes\tpackets_out\tretrans_out\tmax_packets_out\tcwnd_kernel\tcwnd_assigned";

/// One row of the performance log. `cnt`/`thr_cnt` are both populated from
/// the same cumulative byte counter — the original logs the same value
/// into both columns (`server_sender.cc`'s `do_congestion_control`), kept
/// here for schema parity rather than believed non-redundant.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PerfLogRow {
    pub min_rtt: u32,
    pub avg_urtt: u32,
    pub cnt: u64,
    pub srtt_us: u32,
    pub avg_thr: u32,
    pub thr_cnt: u64,
    pub pacing_rate: u32,
    pub loss_bytes: u64,
    pub packets_out: u32,
    pub retrans_out: u32,
    pub cwnd_kernel: u32,
    pub cwnd_assigned: u32,
}

/// Appends [`PerfLogRow`]s to a file, tracking the running
/// `max_packets_out` high-water mark the schema's eleventh column expects.
pub struct PerfLogWriter {
    file: BufWriter<File>,
    max_packets_out: u32,
}

impl PerfLogWriter {
    /// Opens (truncating) `path` and writes the header row immediately, so
    /// a log file that is opened but never ticked still documents its own
    /// schema.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        let mut file = BufWriter::new(file);
        writeln!(file, "{HEADER}")?;
        Ok(Self {
            file,
            max_packets_out: 0,
        })
    }

    pub fn write_row(&mut self, row: &PerfLogRow) -> io::Result<()> {
        self.max_packets_out = self.max_packets_out.max(row.packets_out);
        writeln!(
            self.file,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.min_rtt,
            row.avg_urtt,
            row.cnt,
            row.srtt_us,
            row.avg_thr,
            row.thr_cnt,
            row.pacing_rate,
            row.loss_bytes,
            row.packets_out,
            row.retrans_out,
            self.max_packets_out,
            row.cwnd_kernel,
            row.cwnd_assigned,
        )?;
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_rows_are_tab_separated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perf.log");
        {
            let mut writer = PerfLogWriter::create(&path).unwrap();
            writer
                .write_row(&PerfLogRow {
                    min_rtt: 1,
                    avg_urtt: 2,
                    cnt: 3,
                    srtt_us: 4,
                    avg_thr: 5,
                    thr_cnt: 3,
                    pacing_rate: 6,
                    loss_bytes: 7,
                    packets_out: 8,
                    retrans_out: 9,
                    cwnd_kernel: 10,
                    cwnd_assigned: 11,
                })
                .unwrap();
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), HEADER);
        assert_eq!(lines.next().unwrap(), "1\t2\t3\t4\t5\t3\t6\t7\t8\t9\t8\t10\t11");
    }

    #[test]
    fn max_packets_out_tracks_the_running_high_water_mark() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perf2.log");
        let mut writer = PerfLogWriter::create(&path).unwrap();
        writer
            .write_row(&PerfLogRow { packets_out: 5, ..Default::default() })
            .unwrap();
        writer
            .write_row(&PerfLogRow { packets_out: 2, ..Default::default() })
            .unwrap();
        writer
            .write_row(&PerfLogRow { packets_out: 9, ..Default::default() })
            .unwrap();
        drop(writer);
        let contents = std::fs::read_to_string(&path).unwrap();
        let cols: Vec<&str> = contents.lines().nth(2).unwrap().split('\t').collect();
        assert_eq!(cols[10], "9");
        let cols: Vec<&str> = contents.lines().nth(1).unwrap().split('\t').collect();
        assert_eq!(cols[10], "5");
    }
}
