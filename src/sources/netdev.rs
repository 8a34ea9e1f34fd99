// Network table: `#timestamp, IFACE, rxkB/s, txkB/s`.

use super::table::RawTable;
use super::{SourceKind, SourceTable, collect_rows};
use crate::models::NetworkSample;

pub fn parse(table: &RawTable) -> SourceTable<NetworkSample> {
    collect_rows(SourceKind::Network, table, |row| {
        Ok(NetworkSample {
            interface: row.text("IFACE"),
            rx_kb_per_sec: row.number("rxkB/s")?,
            tx_kb_per_sec: row.number("txkB/s")?,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_interface_rates() {
        let t = RawTable::parse(
            "#timestamp,IFACE,rxpck/s,txpck/s,rxkB/s,txkB/s\n\
             100,lo,1,1,0.5,0.5\n\
             100,eth0,10,8,2.5,1\n",
        );
        let out = parse(&t);
        assert_eq!(out[&100].len(), 2);
        assert_eq!(out[&100][1].interface, "eth0");
        assert_eq!(out[&100][1].rx_kb_per_sec, 2.5);
        assert_eq!(out[&100][1].tx_kb_per_sec, 1.0);
    }
}
