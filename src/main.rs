use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use perfpipe::*;
use tikv_jemallocator::Jemalloc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Reconciles per-subsystem performance tables into one time series.
#[derive(Parser)]
#[command(name = "perfpipe", version = version::VERSION, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Union of all timestamps; only the named disk and interface are used.
    Transform {
        /// Directory holding proc/stat, proc/meminfo, proc/diskstats, proc/net/dev
        csv_dir: PathBuf,
        output_csv: PathBuf,
        disk_device: Option<String>,
        net_interface: Option<String>,
    },
    /// Timestamps CPU and memory share; the named disk and interface are preferred.
    Merge {
        input_dir: PathBuf,
        output_csv: PathBuf,
        disk_device: Option<String>,
        net_interface: Option<String>,
    },
    /// Container counter stream (NDJSON) to per-container CSV.
    Container {
        input_json: PathBuf,
        output_csv: PathBuf,
        /// JSON object mapping container id to name
        names_json: Option<PathBuf>,
        /// Look up names from the local Docker daemon
        #[arg(long)]
        resolve_names: bool,
    },
    /// Unified CSV back to proc-format tables.
    ProcExport {
        unified_csv: PathBuf,
        output_dir: PathBuf,
        disk_device: Option<String>,
        net_interface: Option<String>,
    },
    /// Drive concurrent simulated users against an HTTP endpoint.
    LoadTest {
        #[arg(long, value_enum, default_value_t = load_test::Scenario::Light)]
        scenario: load_test::Scenario,
        /// Overrides load_test.url from the config
        #[arg(long)]
        url: Option<String>,
        /// Also write the report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app_config = config::AppConfig::load()?;

    match cli.command {
        Command::Transform {
            csv_dir,
            output_csv,
            disk_device,
            net_interface,
        } => {
            let summary = convert::transform_host(
                &csv_dir,
                &output_csv,
                disk_device.as_deref(),
                net_interface.as_deref(),
                &app_config.selection,
            )
            .with_context(|| format!("transform {}", csv_dir.display()))?;
            println!("{summary}");
        }
        Command::Merge {
            input_dir,
            output_csv,
            disk_device,
            net_interface,
        } => {
            let summary = convert::merge_host(
                &input_dir,
                &output_csv,
                disk_device.as_deref(),
                net_interface.as_deref(),
                &app_config.selection,
            )
            .with_context(|| format!("merge {}", input_dir.display()))?;
            println!("{summary}");
        }
        Command::Container {
            input_json,
            output_csv,
            names_json,
            resolve_names,
        } => {
            let from_file = match &names_json {
                Some(path) => convert::container::load_names(path)?,
                None => HashMap::new(),
            };
            let names = if resolve_names {
                docker_names::merged_names(from_file).await
            } else {
                from_file
            };
            let summary = convert::convert_containers(
                &input_json,
                &output_csv,
                &names,
                app_config.rates.cpu_percent_cap,
            )
            .with_context(|| format!("container {}", input_json.display()))?;
            println!("{summary}");
        }
        Command::ProcExport {
            unified_csv,
            output_dir,
            disk_device,
            net_interface,
        } => {
            let summary = convert::export_proc(
                &unified_csv,
                &output_dir,
                disk_device
                    .as_deref()
                    .unwrap_or(&app_config.selection.disk_device),
                net_interface
                    .as_deref()
                    .unwrap_or(&app_config.selection.net_interface),
            )
            .with_context(|| format!("proc-export {}", unified_csv.display()))?;
            println!("{summary}");
        }
        Command::LoadTest {
            scenario,
            url,
            report,
        } => {
            let mut settings = load_test::RunSettings::from(&app_config.load_test);
            if let Some(url) = url {
                settings.url = url;
            }
            let probe = load_test::HttpProbe::new(&settings.url)?;
            let result = load_test::run(&probe, &scenario.profile(), &settings).await?;
            println!("{result}");
            if let Some(path) = report {
                result.write_json(&path)?;
                tracing::info!(path = %path.display(), "report written");
            }
        }
    }

    Ok(())
}
