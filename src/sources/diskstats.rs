// Disk table: `#timestamp, DEV, bread/s, bwrtn/s` (512-byte blocks per second).

use super::table::RawTable;
use super::{SourceKind, SourceTable, collect_rows};
use crate::models::DiskSample;

pub fn parse(table: &RawTable) -> SourceTable<DiskSample> {
    collect_rows(SourceKind::Disk, table, |row| {
        Ok(DiskSample {
            device: row.text("DEV"),
            read_blocks_per_sec: row.number("bread/s")?,
            write_blocks_per_sec: row.number("bwrtn/s")?,
        })
    })
}
