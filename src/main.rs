use clap::{Parser, Subcommand};
use imaging_setup::handlers::{ImageHandlerService, SystemHost, is_driver_enabled_in_configuration};
use imaging_setup::health::{
    Healthcheck, HealthcheckEnvironment, ImageHandlerHealthcheck, Status, overall_status,
    run_healthchecks,
};
use imaging_setup::imaging::SystemDrivers;
use imaging_setup::output::DriverSelection;
use imaging_setup::settings::{self, SettingsStore};
use imaging_setup::{config, output};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once, at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "imaging-setup")]
#[command(about = "Detect usable image drivers and configure the image handler")]
#[command(long_about = "\
Detect usable image drivers and configure the image handler

Every candidate driver is checked, from worst to best:

  1. its required tool is on PATH
  2. the image library can find the driver
  3. required environment settings have the expected values
  4. it decodes the sample JPEG, GIF and PNG images

The last driver that passes everything is the preferred one.

Built-in drivers (worst to best):
  Rust      pure Rust decoders, always available
  Gmagick   GraphicsMagick (gm)
  Imagick   ImageMagick (magick)
  Vips      libvips tools (vips, vipsheader)
  Vips      libvips with VIPS_BLOCK_UNTRUSTED=true

Run 'imaging-setup gen-config' to generate a documented setup.toml.")]
#[command(version = version_string())]
struct Cli {
    #[command(flatten)]
    setup: SetupArgs,

    #[command(subcommand)]
    command: Command,
}

/// Where to find the setup configuration, and overrides for it.
#[derive(clap::Args)]
struct SetupArgs {
    /// Setup configuration file
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Root of the YAML settings tree (overrides setup.toml)
    #[arg(long, global = true)]
    settings_dir: Option<PathBuf>,

    /// Settings context, e.g. Development or Production (overrides setup.toml)
    #[arg(long, global = true)]
    context: Option<String>,

    /// Directory with Test.jpg, Test.gif and Test.png (overrides setup.toml)
    #[arg(long, global = true)]
    samples: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Show which image drivers are usable and why the others are not
    Diagnose {
        /// Print the diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Choose the image driver and write it to the settings
    ImageHandler {
        /// Driver to use; prompts (or picks the preferred one) when omitted
        #[arg(long)]
        driver: Option<String>,
    },
    /// Check the image handling setup
    Health,
    /// Print a stock setup.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Diagnose { json } => {
            let (_, service) = prepare(cli.setup)?;
            let diagnostics = service.determine_availability()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&diagnostics)?);
            } else {
                output::print_diagnostics(&diagnostics);
            }
            if diagnostics.ready_count() == 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::ImageHandler { driver } => {
            let (setup, service) = prepare(cli.setup)?;
            let diagnostics = service.determine_availability()?;
            let choices = output::handler_choices(diagnostics.ready_descriptors());
            let Some(preferred) = diagnostics.preferred_driver_name() else {
                println!("{}", output::no_handler_message(cfg!(windows)));
                return Ok(ExitCode::FAILURE);
            };

            let driver = match output::resolve_driver(&choices, driver.as_deref()) {
                DriverSelection::Ready(name) => name,
                DriverSelection::NotReady(requested) => {
                    eprintln!(
                        "Image driver \"{requested}\" is not ready on this host. Run 'imaging-setup diagnose' for details."
                    );
                    return Ok(ExitCode::FAILURE);
                }
                DriverSelection::Ask => select_driver(&choices, preferred)?,
            };

            let store = SettingsStore::load(&setup.settings_dir, &setup.context)?;
            let enable = !is_driver_enabled_in_configuration(&store, &driver);
            let file = settings::image_handler_settings_file(&setup.settings_dir, &setup.context);
            let fragment = settings::write_settings(
                &file,
                settings::IMAGE_HANDLER_PATH,
                settings::image_handler_settings(&driver, enable),
            )?;
            output::print_settings_written(&fragment, &file, enable);
        }
        Command::Health => {
            let (setup, service) = prepare(cli.setup)?;
            let store = SettingsStore::load(&setup.settings_dir, &setup.context)?;
            let probed = service.determine_availability();
            let image_check = ImageHandlerHealthcheck::new(&store, probed.as_ref());
            let checks: [&dyn Healthcheck; 1] = [&image_check];
            // Run from a local shell, so details are shown.
            let environment = HealthcheckEnvironment {
                safe_to_leak_technical_details: true,
            };
            let results = run_healthchecks(&checks, &environment);
            output::print_health_results(&results);
            if overall_status(&results) == Status::Error {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

type Service = ImageHandlerService<SystemHost, SystemDrivers>;

/// Load `setup.toml`, apply command-line overrides and build the probe.
fn prepare(args: SetupArgs) -> Result<(config::SetupConfig, Service), Box<dyn std::error::Error>> {
    let mut setup = config::load_config(&args.config)?;
    if let Some(context) = args.context {
        setup.context = context;
    }
    if let Some(dir) = args.settings_dir {
        setup.settings_dir = dir;
    }
    if let Some(dir) = args.samples {
        setup.samples.dir = Some(dir);
        setup.samples.images.clear();
    }
    setup.validate()?;
    log::debug!(
        "context {}, settings in {}",
        setup.context,
        setup.settings_dir.display()
    );

    let service = ImageHandlerService::new(
        setup.descriptors(),
        setup.sample_images(),
        SystemHost::new(),
        SystemDrivers::new(),
    );
    Ok((setup, service))
}

/// Ask for a driver on a terminal; otherwise take the preferred one.
fn select_driver(
    choices: &[(String, String)],
    preferred: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    if !std::io::stdin().is_terminal() {
        return Ok(preferred.to_string());
    }
    let items: Vec<String> = choices
        .iter()
        .map(|(name, description)| output::format_choice(name, description))
        .collect();
    let selection = dialoguer::Select::new()
        .with_prompt(format!("Select Image Handler ({preferred})"))
        .items(&items)
        .default(output::preferred_choice_index(choices, preferred))
        .interact()?;
    Ok(choices[selection].0.clone())
}
