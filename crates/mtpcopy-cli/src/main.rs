//! mtpcopy - copy files off a phone or camera exactly once
//!
//! Every transferred file is flagged in the destination, so repeated runs
//! only pick up what is new. JPEG files can be renamed after their capture
//! time on the way.

mod display;
mod json_output;
mod progress;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use console::style;
use display::{print_devices, print_entries, print_transfer_stats};
use json_output::TransferResultJson;
use mtpcopy_config::{Config, ConfigLoader, LoggingConfig};
use mtpcopy_device::{MountCatalog, MountedDevice};
use mtpcopy_engine::{CompletionTracker, TransferEngine, TransferRequest};
use mtpcopy_types::{
    CollisionPolicy, DeviceCatalog, DeviceDescriptor, DeviceProvider, Error, NamingPattern,
};
use progress::ProgressObserver;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

/// mtpcopy - copy files off a device exactly once
#[derive(Parser)]
#[command(
    name = "mtpcopy",
    version = env!("CARGO_PKG_VERSION"),
    about = "Copy files off a phone or camera exactly once",
    long_about = "mtpcopy copies the files of one device directory into a local folder.\n\
                  Each transferred file is flagged, so running it again only copies new files,\n\
                  even after the copies were moved or deleted. JPEG files can be renamed\n\
                  after their capture time."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode - detailed output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use this mount point as the device instead of looking the device up
    #[arg(short, long, global = true)]
    mount: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List devices under the mount root
    Devices,
    /// List a directory on a device
    Ls {
        /// Device name
        device: String,
        /// Virtual path, starting with '/'
        #[arg(default_value = "/")]
        path: String,
    },
    /// Copy new files from a device directory
    Copy(CopyArgs),
    /// List the file names flagged as transferred in a destination
    Flags {
        /// Destination root
        destination: PathBuf,
    },
    /// Forget a transferred file so the next copy transfers it again
    Forget {
        /// Destination root
        destination: PathBuf,
        /// Source file name
        name: String,
    },
    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[derive(Args)]
struct CopyArgs {
    /// Device name
    device: String,
    /// Virtual path of the source directory, starting with '/'
    path: String,
    /// Destination root; must exist
    destination: PathBuf,
    /// Naming pattern for files with a capture time
    #[arg(short, long)]
    pattern: Option<String>,
    /// What to do when the target file already exists
    #[arg(long, value_enum)]
    on_conflict: Option<ConflictArg>,
    /// Keep device file names
    #[arg(long)]
    no_rename: bool,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum ConflictArg {
    Rename,
    Overwrite,
    Fail,
}

impl From<ConflictArg> for CollisionPolicy {
    fn from(arg: ConflictArg) -> Self {
        match arg {
            ConflictArg::Rename => CollisionPolicy::Rename,
            ConflictArg::Overwrite => CollisionPolicy::Overwrite,
            ConflictArg::Fail => CollisionPolicy::Fail,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {:#}", style("✗").red().bold(), error);
            ExitCode::from(exit_code(&error))
        }
    }
}

/// Exit code for an error: the kind's code for engine errors, 1 otherwise
fn exit_code(error: &anyhow::Error) -> u8 {
    error
        .downcast_ref::<Error>()
        .map_or(1, |e| u8::try_from(e.kind().exit_code()).unwrap_or(1))
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    init_logging(cli.debug, cli.quiet, cli.verbose, &config.logging)?;

    info!("mtpcopy v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Devices => devices_command(&config, cli.mount.as_deref()).await,
        Commands::Ls { device, path } => {
            ls_command(&config, cli.mount.as_deref(), &device, &path).await
        }
        Commands::Copy(args) => copy_command(&config, cli.mount.as_deref(), &args, cli.quiet).await,
        Commands::Flags { destination } => flags_command(&destination).await,
        Commands::Forget { destination, name } => forget_command(&destination, &name).await,
        Commands::Config { default } => config_command(&config, cli.config.as_deref(), default),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let loaded = match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load_default(),
    };
    Ok(loaded.map_err(Error::from)?)
}

fn init_logging(debug: bool, quiet: bool, verbose: bool, logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        logging.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(logging.colored_output)
        .with_writer(std::io::stderr);

    let initialized = if logging.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    initialized.map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}

/// Open a device by name, or wrap the mount point given on the command line
async fn open_device(
    config: &Config,
    mount: Option<&Path>,
    name: &str,
) -> mtpcopy_types::Result<Box<dyn DeviceProvider>> {
    if let Some(mount_point) = mount {
        return Ok(Box::new(MountedDevice::with_name(name, mount_point)));
    }

    let root = config
        .device
        .effective_mount_root()
        .ok_or_else(|| Error::device_not_found(name))?;
    MountCatalog::new(root).open(name).await
}

async fn devices_command(config: &Config, mount: Option<&Path>) -> Result<()> {
    let devices = if let Some(mount_point) = mount {
        vec![DeviceDescriptor {
            name: MountedDevice::new(mount_point).name().to_string(),
            description: None,
            location: Some(mount_point.to_path_buf()),
        }]
    } else if let Some(root) = config.device.effective_mount_root() {
        info!("Looking for devices under {}", root.display());
        MountCatalog::new(root).list_devices().await?
    } else {
        Vec::new()
    };

    print_devices(&devices);
    Ok(())
}

async fn ls_command(config: &Config, mount: Option<&Path>, device: &str, path: &str) -> Result<()> {
    let provider = open_device(config, mount, device).await?;
    let entries = TransferEngine::new().list(provider.as_ref(), path).await?;
    print_entries(path, &entries);
    Ok(())
}

async fn copy_command(
    config: &Config,
    mount: Option<&Path>,
    args: &CopyArgs,
    quiet: bool,
) -> Result<()> {
    let mut request = TransferRequest::from_config(&args.path, &args.destination, &config.transfer);
    if let Some(pattern) = &args.pattern {
        request = request.with_naming_pattern(NamingPattern::parse(pattern)?);
    }
    if let Some(policy) = args.on_conflict {
        request = request.with_collision_policy(policy.into());
    }
    if args.no_rename {
        request = request.rename_by_capture_time(false);
    }

    info!("Source: {} {}", args.device, args.path);
    info!("Destination: {}", args.destination.display());
    info!("Collision policy: {}", request.collision_policy);

    let show_progress = !quiet && !args.json;
    if show_progress {
        println!(
            "{} Copying {}{} to {}",
            style("→").green().bold(),
            style(&args.device).cyan(),
            style(&args.path).cyan(),
            style(args.destination.display()).cyan()
        );
    }

    let observer = show_progress.then(|| Arc::new(ProgressObserver::new()));
    let outcome = async {
        let provider = open_device(config, mount, &args.device).await?;
        let mut engine = TransferEngine::new();
        if let Some(observer) = &observer {
            engine = engine.with_observer(observer.clone());
        }
        engine.run(provider.as_ref(), &request).await
    }
    .await;

    if let Some(observer) = &observer {
        match &outcome {
            Ok(_) => observer.finish("Transfer completed"),
            Err(_) => observer.abandon(),
        }
    }

    match outcome {
        Ok(report) => {
            if args.json {
                let json = TransferResultJson::from_report(&args.device, &report);
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else if !quiet {
                print_transfer_stats(&report);
            }
            Ok(())
        }
        Err(error) => {
            if args.json {
                let json = TransferResultJson::from_error(
                    &args.device,
                    &args.path,
                    &args.destination.to_string_lossy(),
                    &error,
                );
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            Err(error.into())
        }
    }
}

async fn flags_command(destination: &Path) -> Result<()> {
    let names = CompletionTracker::new(destination).list().await?;
    if names.is_empty() {
        println!("{} No transferred files recorded", style("ℹ").yellow());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

async fn forget_command(destination: &Path, name: &str) -> Result<()> {
    if CompletionTracker::new(destination).forget(name).await? {
        println!(
            "{} {} will be transferred again",
            style("✓").green(),
            style(name).cyan()
        );
    } else {
        println!("{} {} was not flagged", style("ℹ").yellow(), style(name).cyan());
    }
    Ok(())
}

fn config_command(config: &Config, path: Option<&Path>, default: bool) -> Result<()> {
    if default {
        println!("{} Default configuration:", style("⚙").blue().bold());
        print!("{}", ConfigLoader::default_config_yaml().map_err(Error::from)?);
        return Ok(());
    }

    let source = path
        .map(Path::to_path_buf)
        .or_else(ConfigLoader::config_exists);
    match source {
        Some(source) => println!(
            "{} Current configuration ({}):",
            style("⚙").blue().bold(),
            source.display()
        ),
        None => println!(
            "{} Current configuration (built-in defaults):",
            style("⚙").blue().bold()
        ),
    }
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_copy() {
        let cli = Cli::parse_from([
            "mtpcopy",
            "copy",
            "Pixel",
            "/DCIM/Camera",
            "/photos",
            "--on-conflict",
            "fail",
            "--no-rename",
            "--mount",
            "/run/user/1000/gvfs/mtp",
        ]);
        assert_eq!(cli.mount, Some(PathBuf::from("/run/user/1000/gvfs/mtp")));
        let Commands::Copy(args) = cli.command else {
            panic!("expected copy command");
        };
        assert_eq!(args.path, "/DCIM/Camera");
        assert!(args.no_rename);
        assert!(matches!(args.on_conflict, Some(ConflictArg::Fail)));
    }

    #[test]
    fn test_exit_codes() {
        let preflight = anyhow::Error::from(Error::directory_not_found("/X"));
        assert_eq!(exit_code(&preflight), 3);

        let other = anyhow::anyhow!("something else");
        assert_eq!(exit_code(&other), 1);
    }
}
