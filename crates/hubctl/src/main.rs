use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use hubctl::commands::BrightnessLevel;
use hubctl::commands::LightOptions;
use hubctl::hub::filter;
use hubctl::hub::HubClient;
use hubctl::output;
use hubctl::resolve::Target;
use hubctl::CommandResult;
use hubctl::Controller;
use hubctl_config::format_load_error;
use hubctl_config::Config;
use hubctl_config::LogLevel;
use tracing::debug;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "hubctl", version, about = "Control your Home Assistant hub from the command line")]
struct Cli {
    /// Config file to use instead of the default locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Switch on, optionally with brightness and color
    On {
        entity: String,
        /// Entity name when <ENTITY> is a domain
        name: Option<String>,
        #[arg(short, long)]
        brightness: Option<BrightnessLevel>,
        /// Color as R,G,B
        #[arg(short, long, value_parser = hubctl::convert::parse_rgb)]
        color: Option<[u8; 3]>,
        /// Color temperature in Kelvin
        #[arg(short = 'k', long)]
        kelvin: Option<u32>,
    },
    /// Switch off
    Off { entity: String, name: Option<String> },
    /// Toggle on and off
    Toggle { entity: String, name: Option<String> },
    /// Change brightness (+, -, min, mid, max or 1-99)
    #[command(visible_alias = "br")]
    Brightness {
        entity: String,
        #[arg(allow_hyphen_values = true)]
        level: BrightnessLevel,
    },
    /// Set volume in percent
    #[command(visible_alias = "vol")]
    Volume {
        entity: String,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        volume: u8,
    },
    /// Set target temperature
    #[command(visible_alias = "temp")]
    Temperature {
        entity: String,
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Play a URL, local file or media_map alias
    Play { entity: String, media: String },
    /// List entities or services
    #[command(visible_alias = "ls")]
    List {
        #[arg(value_enum, default_value_t = ListKind::Entities)]
        kind: ListKind,
        /// Only these domains
        #[arg(short, long = "domain")]
        domains: Vec<String>,
        /// Only these services
        #[arg(short, long = "service")]
        services: Vec<String>,
    },
    /// Read and change the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Create a config file
    Init {
        #[arg(long)]
        url: String,
        #[arg(long)]
        token: String,
        /// Where to write it, defaults to ~/.config/hubctl/hubctl.toml
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Print the version
    Version,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    Get { path: String },
    Set { path: String, value: String },
    #[command(alias = "remove")]
    Rem { path: String },
    List,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ListKind {
    Entities,
    Services,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = Config::locate(cli.config.as_deref());
    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprint!("{}", format_load_error(&err));
            return ExitCode::FAILURE;
        }
    };

    let level = cli.log_level.unwrap_or(config.logging.level);
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(level))
        .with_writer(std::io::stderr)
        .init();
    debug!("Config: {:?}", config_path);

    match run(cli.command, config, config_path.as_deref()).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config, config_path: Option<&Path>) -> anyhow::Result<ExitCode> {
    let mut out = std::io::stdout().lock();

    match command {
        Command::On {
            entity,
            name,
            brightness,
            color,
            kelvin,
        } => {
            let controller = Controller::from_config(&config)?;
            let target = Target::from_args(&entity, name.as_deref());
            let result = if brightness.is_none() && color.is_none() && kelvin.is_none() {
                controller.turn_on(&target).await
            } else {
                let options = LightOptions {
                    brightness,
                    color,
                    color_temp: kelvin,
                };
                controller.turn_on_custom(&target, &options).await
            };
            return report(&mut out, result);
        }
        Command::Off { entity, name } => {
            let controller = Controller::from_config(&config)?;
            let result = controller
                .turn_off(&Target::from_args(&entity, name.as_deref()))
                .await;
            return report(&mut out, result);
        }
        Command::Toggle { entity, name } => {
            let controller = Controller::from_config(&config)?;
            let result = controller
                .toggle(&Target::from_args(&entity, name.as_deref()))
                .await;
            return report(&mut out, result);
        }
        Command::Brightness { entity, level } => {
            let controller = Controller::from_config(&config)?;
            let result = controller
                .set_brightness(&Target::Token(entity), level)
                .await;
            return report(&mut out, result);
        }
        Command::Volume { entity, volume } => {
            let controller = Controller::from_config(&config)?;
            let result = controller.set_volume(&Target::Token(entity), volume).await;
            return report(&mut out, result);
        }
        Command::Temperature { entity, value } => {
            let controller = Controller::from_config(&config)?;
            let result = controller
                .set_temperature(&Target::Token(entity), value)
                .await;
            return report(&mut out, result);
        }
        Command::Play { entity, media } => {
            let controller = Controller::from_config(&config)?;
            let source = config.media_map.get(&media).cloned().unwrap_or(media);
            let result = controller.play_media(&Target::Token(entity), &source).await;
            return report(&mut out, result);
        }
        Command::List {
            kind,
            domains,
            services,
        } => {
            let hub = HubClient::from_config(&config.hub)?;
            match kind {
                ListKind::Entities => {
                    let states = hub.states().await?;
                    let tree = filter::states_tree(
                        filter::filter_states_by_domains(states, &domains),
                        config.completion.short_names,
                    );
                    output::tree(&mut out, "Entities", &tree)?;
                }
                ListKind::Services => {
                    let listing = filter::filter_services(hub.services().await?, &domains, &services);
                    output::tree(&mut out, "Services", &filter::services_tree(&listing))?;
                }
            }
        }
        Command::Config { command } => config_command(&mut out, command, config, config_path)?,
        Command::Init { url, token, path } => {
            let path = path
                .or_else(Config::default_path)
                .context("cannot determine config path, use --path")?;
            Config::init(&path, &url, &token).map_err(|err| anyhow::anyhow!(format_load_error(&err)))?;
            output::success(&mut out, &format!("config written to {}", path.display()))?;
        }
        Command::Version => {
            writeln!(out, "hubctl {}", env!("CARGO_PKG_VERSION"))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Print the outcome of a command.
fn report(out: &mut impl Write, result: hubctl::Result<CommandResult>) -> anyhow::Result<ExitCode> {
    match result {
        Ok(result) => {
            debug!("Result: {}({}) to {}", result.entity, result.domain, result.state);
            output::success_action(out, &result.entity, &result.state)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            debug!("Command failed ({:?}): {}", err.kind(), err);
            output::error(out, &err)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn config_command(
    out: &mut impl Write,
    command: ConfigCommand,
    config: Config,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Get { path } => {
            writeln!(out, "{}", config.get(&path)?)?;
        }
        ConfigCommand::List => {
            for path in config.paths() {
                writeln!(out, "{} = {}", path, config.get(&path)?)?;
            }
        }
        ConfigCommand::Set { path, value } => {
            let (file, mut stored) = stored_config(config_path)?;
            stored.set(&path, &value)?;
            stored.save(&file).map_err(|err| anyhow::anyhow!(format_load_error(&err)))?;
            output::success(out, &format!("{path} set to {value}"))?;
        }
        ConfigCommand::Rem { path } => {
            let (file, mut stored) = stored_config(config_path)?;
            stored.remove(&path)?;
            stored.save(&file).map_err(|err| anyhow::anyhow!(format_load_error(&err)))?;
            output::success(out, &format!("{path} removed"))?;
        }
    }
    Ok(())
}

/// The config as written in the file, without environment overrides.
fn stored_config(config_path: Option<&Path>) -> anyhow::Result<(PathBuf, Config)> {
    match config_path {
        Some(path) if path.exists() => {
            let config = Config::from_file(path).map_err(|err| anyhow::anyhow!(format_load_error(&err)))?;
            Ok((path.to_path_buf(), config))
        }
        Some(path) => Ok((path.to_path_buf(), Config::default())),
        None => {
            let path = Config::default_path().context("cannot determine config path, use --config")?;
            Ok((path, Config::default()))
        }
    }
}
