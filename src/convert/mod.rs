// End-to-end conversions: read sources, select, merge or derive, emit.

pub mod container;
pub mod host;
pub mod proc_export;

pub use container::{ContainerSummary, convert_containers};
pub use host::{HostSelectors, HostSummary, merge_host, transform_host};
pub use proc_export::{ProcExportSummary, export_proc};
