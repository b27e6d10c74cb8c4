use anyhow::Result;
use camgallery::capture::{CaptureService, FilePicker, PathListPicker};
use camgallery::keyboard_input::{KeyCommand, KeyboardInputHandler};
use camgallery::media::MediaDevices;
use camgallery::{CamGalleryConfig, CaptureController, SyntheticDevices};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "camgallery")]
#[command(about = "Capture photos from a camera or import them into an in-memory gallery")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "camgallery.toml", help = "Path to TOML configuration file")]
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

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Files offered when importing from the gallery
    #[arg(long, value_name = "PATH", num_args = 1.., help = "Image files returned by the gallery picker")]
    import: Vec<PathBuf>,

    /// Use the synthetic test-pattern cameras even when hardware support is built in
    #[arg(long, help = "Use synthetic cameras instead of real devices")]
    synthetic: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Print the defaults before logging so stdout stays clean TOML
    if args.print_config {
        print!("{}", CamGalleryConfig::default().to_toml()?);
        return Ok(());
    }

    // Initialize logging
    init_logging(&args)?;

    info!("Starting camgallery v{}", env!("CARGO_PKG_VERSION"));

    // Load and validate configuration
    let config = match CamGalleryConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    // Validate configuration if requested
    if args.validate_config {
        println!("✓ Configuration is valid");
        return Ok(());
    }

    // Wire the camera backend and file picker into the service
    let devices = media_devices(&args, &config)?;
    let picker = file_picker(&args);
    let service = CaptureService::new(devices, picker, &config);

    // Probe for cameras without opening one
    let mut controller = CaptureController::new(service, &config);
    controller.init().await;

    run_shell(&mut controller).await?;

    // Release the camera before exit
    controller.dispose();
    info!("camgallery exited");
    Ok(())
}

fn media_devices(args: &Args, config: &CamGalleryConfig) -> Result<Arc<dyn MediaDevices>> {
    #[cfg(all(target_os = "linux", feature = "camera"))]
    {
        if !args.synthetic {
            let devices = camgallery::media::GstMediaDevices::new(&config.camera)
                .map_err(|e| anyhow::anyhow!("Failed to initialize camera backend: {}", e))?;
            return Ok(Arc::new(devices));
        }
    }

    #[cfg(not(all(target_os = "linux", feature = "camera")))]
    {
        let _ = config;
        if !args.synthetic {
            warn!("Built without camera support, using synthetic cameras");
        }
    }

    Ok(Arc::new(SyntheticDevices::new()))
}

fn file_picker(args: &Args) -> Arc<dyn FilePicker> {
    // Files from the command line win over the native dialog
    if !args.import.is_empty() {
        return Arc::new(PathListPicker::new(args.import.clone()));
    }

    default_picker()
}

#[cfg(feature = "dialog")]
fn default_picker() -> Arc<dyn FilePicker> {
    Arc::new(camgallery::capture::DialogPicker)
}

#[cfg(not(feature = "dialog"))]
fn default_picker() -> Arc<dyn FilePicker> {
    warn!("No --import files given and no file dialog available; imports will be empty");
    Arc::new(PathListPicker::cancelled())
}

async fn run_shell(controller: &mut CaptureController) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let keyboard = KeyboardInputHandler::new();
    keyboard.start(tx).await?;

    print_line("s start | x stop | w switch | space capture | g import | n next | d delete | c clear | i status | q quit");

    loop {
        // Ctrl-C reaches us as a signal when raw mode is not active
        let command = tokio::select! {
            command = rx.recv() => command,
            _ = tokio::signal::ctrl_c() => Some(KeyCommand::Quit),
        };

        let Some(command) = command else {
            break;
        };

        match command {
            KeyCommand::StartCamera => controller.start_camera().await,
            KeyCommand::StopCamera => controller.stop_camera(),
            KeyCommand::SwitchCamera => controller.switch_camera().await,
            KeyCommand::CapturePhoto => controller.capture_photo(),
            KeyCommand::ImportFromGallery => controller.load_from_gallery().await,
            KeyCommand::ClearGallery => controller.clear_gallery(),
            KeyCommand::DeleteSelected => delete_selected(controller),
            KeyCommand::SelectNext => select_next(controller),
            // Status prints the full snapshot instead of the summary line
            KeyCommand::Status => {
                print_line(&serde_json::to_string(&controller.snapshot())?);
                continue;
            }
            KeyCommand::Quit => break,
        }

        print_status(controller);
    }

    keyboard.stop().await?;
    Ok(())
}

fn selected_index(controller: &CaptureController) -> Option<usize> {
    let selected = controller.selected_image()?;
    controller.gallery().iter().position(|i| i == selected)
}

fn delete_selected(controller: &mut CaptureController) {
    let Some(index) = selected_index(controller) else {
        print_line("No gallery image selected");
        return;
    };
    if let Err(e) = controller.delete_image(index) {
        warn!("Could not delete image: {}", e);
    }
}

fn select_next(controller: &mut CaptureController) {
    let len = controller.gallery().len();
    if len == 0 {
        print_line("Gallery is empty");
        return;
    }

    let next = selected_index(controller).map_or(0, |i| (i + 1) % len);
    if let Err(e) = controller.select_index(next) {
        warn!("Could not select image: {}", e);
    }
}

fn print_status(controller: &CaptureController) {
    let state = controller.state();
    let selected = match (selected_index(controller), controller.selected_image()) {
        (Some(index), Some(image)) => format!(
            "#{} ({}, {} bytes)",
            index,
            image.mime_type(),
            image.len()
        ),
        (None, Some(image)) => format!("outside gallery ({} bytes)", image.len()),
        _ => "none".to_string(),
    };

    print_line(&format!(
        "camera: {:?} ({}) | gallery: {} | selected: {}",
        controller.camera_state(),
        controller.facing(),
        controller.gallery().len(),
        selected
    ));

    if state.has_error() {
        print_line(&format!("error: {}", state.error_message));
    }
}

/// Raw mode needs an explicit carriage return
fn print_line(line: &str) {
    print!("{}\r\n", line);
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    // RUST_LOG overrides the flags
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("camgallery={}", log_level)));

    // Logs go to stderr so the shell output stays readable
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
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .boxed()
        }
    };

    // Initialize subscriber
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}
