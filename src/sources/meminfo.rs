// Memory table: `#timestamp, kbmemfree, kbmemused, kbcached, kbbuffers`.

use super::table::RawTable;
use super::{SourceKind, SourceTable, collect_rows};
use crate::models::MemorySample;

pub fn parse(table: &RawTable) -> SourceTable<MemorySample> {
    collect_rows(SourceKind::Memory, table, |row| {
        Ok(MemorySample {
            free_kb: row.number("kbmemfree")?,
            used_kb: row.number("kbmemused")?,
            cached_kb: row.number("kbcached")?,
            buffers_kb: row.number("kbbuffers")?,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_memory_columns() {
        let t = RawTable::parse(
            "#timestamp,kbmemfree,kbavail,kbmemused,kbbuffers,kbcached\n\
             100,1000,1500,3000,200,800\n",
        );
        let out = parse(&t);
        let m = &out[&100][0];
        assert_eq!(m.free_kb, 1000.0);
        assert_eq!(m.used_kb, 3000.0);
        assert_eq!(m.buffers_kb, 200.0);
        assert_eq!(m.cached_kb, 800.0);
        assert_eq!(m.total_kb(), 5000.0);
    }

    #[test]
    fn absent_columns_default_to_zero() {
        let t = RawTable::parse("#timestamp,kbmemfree\n100,42\n");
        let m = &parse(&t)[&100][0];
        assert_eq!(m.free_kb, 42.0);
        assert_eq!(m.used_kb, 0.0);
        assert_eq!(m.cached_kb, 0.0);
    }
}
