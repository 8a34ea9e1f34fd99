// CPU table: `#timestamp, CPU, %usr, %system, %idle, %iowait, %steal`.

use super::table::RawTable;
use super::{SourceKind, SourceTable, collect_rows};
use crate::models::CpuSample;

/// Id assumed for every row when the table has no `CPU` column.
const IMPLICIT_AGGREGATE_ID: &str = "-1";

/// Keeps every core's row; picking the aggregate row is the selector's job.
pub fn parse(table: &RawTable) -> SourceTable<CpuSample> {
    let has_cpu_column = table.has_column("CPU");
    collect_rows(SourceKind::Cpu, table, |row| {
        let cpu = if has_cpu_column {
            row.text("CPU")
        } else {
            IMPLICIT_AGGREGATE_ID.to_string()
        };
        Ok(CpuSample {
            cpu,
            user: row.number("%usr")?,
            system: row.number("%system")?,
            idle: row.number("%idle")?,
            iowait: row.number("%iowait")?,
            steal: row.number("%steal")?,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_all_cores_per_timestamp() {
        let t = RawTable::parse(
            "#timestamp,CPU,%usr,%system,%idle,%iowait,%steal\n\
             100,-1,20,5,70,4,1\n\
             100,0,30,5,60,4,1\n\
             105,-1,22,6,68,3,1\n",
        );
        let out = parse(&t);
        assert_eq!(out.len(), 2);
        assert_eq!(out[&100].len(), 2);
        assert_eq!(out[&100][0].cpu, "-1");
        assert_eq!(out[&100][0].user, 20.0);
        assert_eq!(out[&105][0].idle, 68.0);
        assert_eq!(out[&105][0].steal, 1.0);
    }

    #[test]
    fn missing_cpu_column_means_aggregate_rows() {
        let t = RawTable::parse("#timestamp,%usr\n100,12.5\n");
        let out = parse(&t);
        assert_eq!(out[&100][0].cpu, "-1");
        assert_eq!(out[&100][0].user, 12.5);
        assert_eq!(out[&100][0].iowait, 0.0);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let t = RawTable::parse(
            "#timestamp,CPU,%usr\n\
             abc,-1,20\n\
             100,-1,oops\n\
             105,-1,22\n",
        );
        let out = parse(&t);
        assert_eq!(out.keys().copied().collect::<Vec<_>>(), vec![105]);
    }
}
