use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tegra_ext::{platform, ExtConfig, HdmiState, NvParameters, PropertyStore, Region};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "tegra-ext")]
#[command(about = "Vendor camera tuning parameters and stereo separation control")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tegra-ext.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the default configuration in TOML format
    PrintConfig,

    /// Load and validate the configuration file
    ValidateConfig,

    /// Encode regions given as l,t,r,b,w into the parameter wire form
    EncodeRegions {
        #[arg(value_name = "L,T,R,B,W", num_args = 0..)]
        regions: Vec<String>,
    },

    /// Decode a region list and print it as JSON
    DecodeRegions {
        #[arg(value_name = "REGIONS")]
        input: String,
    },

    /// Load a tuning profile and print the flattened parameter string
    Flatten {
        #[arg(value_name = "PROFILE")]
        profile: PathBuf,
    },

    /// Parse a flattened parameter string and print it as JSON
    Unflatten {
        #[arg(value_name = "FLAT")]
        flat: String,
    },

    /// Report whether the stereo separation slider should be shown
    StereoStatus,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if matches!(args.command, Command::PrintConfig) {
        return print_default_config();
    }

    init_logging(&args)?;

    match &args.command {
        Command::PrintConfig => print_default_config(),
        Command::ValidateConfig => validate_config(&args.config),
        Command::EncodeRegions { regions } => encode_regions(regions),
        Command::DecodeRegions { input } => decode_regions(input),
        Command::Flatten { profile } => flatten(profile),
        Command::Unflatten { flat } => unflatten(flat),
        Command::StereoStatus => stereo_status(&args.config),
    }
}

fn load_config(path: &str) -> Result<ExtConfig> {
    let config = ExtConfig::load_from_file(path)
        .map_err(|e| {
            error!("Failed to load configuration: {}", e);
            e
        })
        .with_context(|| format!("loading configuration from {}", path))?;
    info!("Configuration loaded successfully from: {}", path);
    Ok(config)
}

fn validate_config(path: &str) -> Result<()> {
    let config = load_config(path)?;
    match config.validate() {
        Ok(()) => {
            info!("Configuration validation successful");
            println!("✓ Configuration is valid");
            Ok(())
        }
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            eprintln!("✗ Configuration validation failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn encode_regions(regions: &[String]) -> Result<()> {
    let regions = regions
        .iter()
        .map(|r| {
            let text = if r.starts_with('(') {
                r.clone()
            } else {
                format!("({})", r)
            };
            text.parse::<Region>()
                .with_context(|| format!("invalid region '{}'", r))
        })
        .collect::<Result<Vec<_>>>()?;

    println!("{}", tegra_ext::encode_regions(&regions).unwrap_or_default());
    Ok(())
}

fn decode_regions(input: &str) -> Result<()> {
    let regions = tegra_ext::decode_regions(Some(input))?;
    println!("{}", serde_json::to_string_pretty(&regions)?);
    Ok(())
}

fn flatten(profile: &Path) -> Result<()> {
    let params = NvParameters::load_profile(profile)
        .with_context(|| format!("loading tuning profile {}", profile.display()))?;
    println!("{}", params.flatten());
    Ok(())
}

fn unflatten(flat: &str) -> Result<()> {
    let params = NvParameters::unflatten(flat)?;
    let base: BTreeMap<&str, &str> = params.base().iter().collect();
    let output = serde_json::json!({
        "vendor": &params,
        "base": base,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn stereo_status(path: &str) -> Result<()> {
    let config = load_config(path)?;
    let platform = platform::init(config)?;
    let stereo = &platform.config().stereo;
    let store = platform.property_store();

    let hdmi = HdmiState::probe(&stereo.hdmi_state_path);
    let enabled = store.get_flag(&stereo.persisted(&stereo.control_property));
    let app_running = store.get_flag(&stereo.persisted(&stereo.app_property));
    let separation = store.get_property(&stereo.persisted(&stereo.separation_property));

    println!("HDMI:          {}", hdmi);
    println!("Stereo:        {}", if enabled { "enabled" } else { "disabled" });
    println!("Stereo app:    {}", if app_running { "running" } else { "not running" });
    println!(
        "Separation:    {}",
        if separation.is_empty() { "unset" } else { separation.as_str() }
    );
    println!(
        "Slider:        {}",
        if hdmi.is_connected() && enabled && app_running {
            "visible"
        } else {
            "hidden"
        }
    );
    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tegra_ext={}", log_level)));

    // Logs go to stderr so command output stays clean
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
        Some("pretty") => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        None => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# tegra-ext configuration file");
    println!("# This is the default configuration with all available options");
    println!();
    println!("{}", toml::to_string_pretty(&ExtConfig::default())?);
    Ok(())
}
