// Shared test helpers: fixture collector directories

#![allow(dead_code)]

use std::path::Path;

pub const STAT: &str = "#timestamp,CPU,%usr,%system,%idle,%iowait,%steal
100,-1,12.5,3.25,80,4,0.25
100,0,30,5,60,5,0
105,-1,20,5,70,4,1
110,-1,8,2,88,1.5,0.5
";

pub const MEMINFO: &str = "#timestamp,kbmemfree,kbmemused,kbbuffers,kbcached
100,1000,2000,100,500
110,1100,1900,100,500
";

pub const DISKSTATS: &str = "#timestamp,DEV,bread/s,bwrtn/s
100,loop0,7,7
100,sda,100,50
105,vda,1,1
110,sda,10,20
";

pub const NETDEV: &str = "#timestamp,IFACE,rxkB/s,txkB/s
100,lo,9,9
100,eth0,2,1
110,eth0,4,0.5
";

/// Writes the four proc tables under `dir`; `None` leaves that file out.
pub fn write_host_dir(
    dir: &Path,
    stat: Option<&str>,
    meminfo: Option<&str>,
    diskstats: Option<&str>,
    netdev: Option<&str>,
) {
    std::fs::create_dir_all(dir.join("proc/net")).unwrap();
    for (rel, content) in [
        ("proc/stat", stat),
        ("proc/meminfo", meminfo),
        ("proc/diskstats", diskstats),
        ("proc/net/dev", netdev),
    ] {
        if let Some(c) = content {
            std::fs::write(dir.join(rel), c).unwrap();
        }
    }
}

pub fn write_full_host_dir(dir: &Path) {
    write_host_dir(dir, Some(STAT), Some(MEMINFO), Some(DISKSTATS), Some(NETDEV));
}

/// Data rows of a CSV file, header dropped, each split on commas.
pub fn read_rows(path: &Path) -> Vec<Vec<String>> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(|l| l.split(',').map(String::from).collect())
        .collect()
}

pub fn container_line(ts: i64, id: &str, usage_usec: u64) -> String {
    let measurement = format!(
        r#"{{"container_id":"{id}","cpu_usage_usec":{usage_usec},"cpu_user_usec":{user},"cpu_system_usec":{system},"memory_current":1024,"memory_max":4096,"io_read_bytes":10,"io_write_bytes":20,"io_read_ops":1,"io_write_ops":2,"pids_current":4}}"#,
        user = usage_usec / 2,
        system = usage_usec / 4,
    );
    serde_json::json!({
        "timestamp": ts,
        "subsystem": format!("container/docker/{}", &id[..id.len().min(12)]),
        "measurement": measurement,
    })
    .to_string()
}
