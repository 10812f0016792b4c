//! Aggregate disk byte counters from `/proc/diskstats`.
//!
//! `sysinfo` exposes no system-wide disk throughput, so the counters are read
//! straight from the kernel, the same way battery state would be read from
//! sysfs on a laptop.

use std::fs;

const SECTOR_SIZE: u64 = 512;

/// Cumulative bytes read/written across all physical block devices since boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DiskCounters {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

pub(crate) fn read_counters() -> std::io::Result<DiskCounters> {
    let raw = fs::read_to_string("/proc/diskstats")?;
    Ok(parse_counters(&raw))
}

/// Sum sector counters over whole devices only.
///
/// Virtual devices (loop, ram, zram, device-mapper) are skipped, and so is
/// any name extending a device already counted — those are its partitions,
/// which would double-count every byte.
fn parse_counters(raw: &str) -> DiskCounters {
    let mut read_sectors: u64 = 0;
    let mut write_sectors: u64 = 0;
    let mut counted: Vec<&str> = Vec::new();

    for line in raw.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 {
            continue;
        }

        let name = fields[2];
        if ["loop", "ram", "zram", "dm-"].iter().any(|p| name.starts_with(p)) {
            continue;
        }
        if counted.iter().any(|dev| name.starts_with(dev)) {
            continue;
        }

        // Field layout: ... [5] sectors read ... [9] sectors written.
        read_sectors += fields[5].parse::<u64>().unwrap_or(0);
        write_sectors += fields[9].parse::<u64>().unwrap_or(0);
        counted.push(name);
    }

    DiskCounters {
        read_bytes: read_sectors * SECTOR_SIZE,
        write_bytes: write_sectors * SECTOR_SIZE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
   7       0 loop0 100 0 8000 0 0 0 0 0 0 0 0 0 0 0 0 0 0
   8       0 sda 5000 120 400000 900 3000 450 200000 1200 0 700 2100 0 0 0 0 0 0
   8       1 sda1 4900 120 398000 890 2990 450 199000 1190 0 690 2080 0 0 0 0 0 0
 259       0 nvme0n1 9000 10 600000 400 7000 20 100000 300 0 500 700 0 0 0 0 0 0
 259       1 nvme0n1p1 8900 10 598000 390 6990 20 99000 290 0 490 690 0 0 0 0 0 0";

    #[test]
    fn sums_whole_devices_only() {
        let counters = parse_counters(SAMPLE);
        // sda + nvme0n1; partitions and loop0 skipped.
        assert_eq!(counters.read_bytes, (400_000 + 600_000) * SECTOR_SIZE);
        assert_eq!(counters.write_bytes, (200_000 + 100_000) * SECTOR_SIZE);
    }

    #[test]
    fn malformed_lines_are_ignored() {
        let counters = parse_counters("8 0 sda garbage\nnot a line\n");
        assert_eq!(counters.read_bytes, 0);
        assert_eq!(counters.write_bytes, 0);
    }
}
