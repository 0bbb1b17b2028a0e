use anyhow::Result;
use clap::{Parser, ValueEnum};
use openstack_lb_info::config::CloudConfig;
use openstack_lb_info::openstack::client::OsClient;
use openstack_lb_info::openstack::http::format_os_error;
use openstack_lb_info::output::OutputFormat;
use openstack_lb_info::resource::{
    query_load_balancers, LbFilters, ReportBuilder, ReportOptions,
};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::Level;
use uuid::Uuid;

/// Version injected at compile time via LB_INFO_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("LB_INFO_VERSION") {
    Some(v) => v,
    None => "dev",
};

/// Upper bound for --max-workers
const MAX_WORKERS_LIMIT: u8 = 32;

/// Show OpenStack load balancers information
#[derive(Parser, Debug)]
#[command(name = "openstack-lb-info", version = VERSION, about, long_about = None)]
struct Args {
    /// Name of the cloud to load from clouds.yaml ('envvars' uses OS_* env vars)
    #[arg(long, default_value = "envvars")]
    os_cloud: String,

    /// Show information about load balancers or amphorae
    #[arg(short = 't', long = "type", value_enum)]
    query_type: QueryType,

    /// Output format
    #[arg(short, long, value_enum, default_value = "rich")]
    output_format: OutputFormat,

    /// Filter load balancers name (partial match)
    #[arg(long)]
    name: Option<String>,

    /// Filter load balancers id (UUID)
    #[arg(long)]
    id: Option<Uuid>,

    /// Filter load balancers tags
    #[arg(long)]
    tags: Option<String>,

    /// Filter load balancers flavor id (UUID)
    #[arg(long)]
    flavor_id: Option<Uuid>,

    /// Filter load balancers VIP address
    #[arg(long)]
    vip_address: Option<IpAddr>,

    /// Filter load balancers availability zone
    #[arg(long)]
    availability_zone: Option<String>,

    /// Filter load balancers network id (UUID)
    #[arg(long)]
    vip_network_id: Option<Uuid>,

    /// Filter load balancers subnet id (UUID)
    #[arg(long)]
    vip_subnet_id: Option<Uuid>,

    /// Show all load balancer/amphora attributes
    #[arg(long)]
    details: bool,

    /// Do not show pool member information
    #[arg(long)]
    no_members: bool,

    /// Max number of concurrent member detail fetches (1-32)
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=MAX_WORKERS_LIMIT as i64))]
    max_workers: u8,

    /// Log level for debugging (logs go to a file under the user config dir)
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QueryType {
    Lb,
    Amphora,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// Logging goes to a file so stdout stays clean for the report (JSON output
/// in particular is routinely piped into other tools).
fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .expect("Failed to open log file");

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("openstack-lb-info started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir
            .join("openstack-lb-info")
            .join("openstack-lb-info.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".openstack-lb-info").join("openstack-lb-info.log");
    }
    PathBuf::from("openstack-lb-info.log")
}

fn filters_from_args(args: &Args) -> LbFilters {
    LbFilters {
        name: args.name.clone(),
        id: args.id.map(|u| u.to_string()),
        tags: args.tags.clone(),
        flavor_id: args.flavor_id.map(|u| u.to_string()),
        vip_address: args.vip_address.map(|a| a.to_string()),
        availability_zone: args.availability_zone.clone(),
        vip_network_id: args.vip_network_id.map(|u| u.to_string()),
        vip_subnet_id: args.vip_subnet_id.map(|u| u.to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);
    tracing::debug!("CMD line args: {:?}", args);

    let output = args.output_format;

    let config = match CloudConfig::load(&args.os_cloud) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    };

    let client = match OsClient::connect(config).await {
        Ok(client) => client,
        Err(err) => {
            tracing::debug!("OpenStack connection failed: {:?}", err);
            eprintln!("Error: {}", format_os_error(&err));
            std::process::exit(1);
        }
    };

    let filters = filters_from_args(&args);
    let lbs = match query_load_balancers(&client, &filters).await {
        Ok(lbs) => lbs,
        Err(err) => {
            tracing::debug!("Load balancer query failed: {:?}", err);
            eprintln!("Error: {}", format_os_error(&err));
            std::process::exit(1);
        }
    };

    tracing::info!("Found {} load balancer(s) to process.", lbs.len());

    if lbs.is_empty() {
        println!("{}", output.render_message("No load balancer(s) found."));
        std::process::exit(1);
    }

    let options = ReportOptions {
        details: args.details,
        no_members: args.no_members,
        max_workers: args.max_workers as usize,
    };
    tracing::debug!("Report options: {:?}", options);

    let details = options.details;
    let mut builder = ReportBuilder::new(client, options);

    for lb in lbs {
        let rendered = match args.query_type {
            QueryType::Amphora => {
                let report = builder.amphora_report(lb).await.map_err(|err| {
                    tracing::debug!("Amphora report failed: {:?}", err);
                    anyhow::anyhow!("{}", format_os_error(&err))
                })?;
                output.render_amphorae(&report, details)
            }
            QueryType::Lb => {
                let report = builder.lb_report(lb).await.map_err(|err| {
                    tracing::debug!("LB report failed: {:?}", err);
                    anyhow::anyhow!("{}", format_os_error(&err))
                })?;
                output.render_lb(&report, details)
            }
        };
        println!("{rendered}");
    }

    Ok(())
}
