use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, CliSubcommand, CommandFetchArgs, CommandGenerateArgs, CommandShowArgs};
use log::{Log, info};
use ordermap::OrderMap;
use phase_parsing::Flags;
use phase_pipeline::{Driver, DriverConfig};

mod cli;
mod error;
mod logging;
use error::*;
use logging::{LOGGER, init_log_impl};

pub fn main() -> ExitCode {
    match run_app() {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            LOGGER.flush();
            handle_error(err);
            ExitCode::FAILURE
        }
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    init_log_impl(cli.verbosity);

    match cli.subcommand {
        CliSubcommand::Fetch(args) => fetch(args)?,
        CliSubcommand::Generate(args) => generate(args)?,
        CliSubcommand::Show(args) => show(args)?,
    }
    Ok(())
}

fn fetch(args: CommandFetchArgs) -> Result<()> {
    let token = resolve_token(args.token)?;
    let config = DriverConfig::new(&token, &args.project);
    let (mut driver, _events) = Driver::new(config);
    driver.update()?;
    driver.store(&args.output)?;
    info!(target: "Stored", "{}", args.output.display());
    Ok(())
}

fn generate(args: CommandGenerateArgs) -> Result<()> {
    let flags = collect_flags(&args);
    let (mut driver, _events) = match &args.snapshot {
        Some(snapshot) => {
            let (mut driver, events) =
                Driver::new(driver_config("", "", &args, flags));
            driver.restore(snapshot)?;
            // command-line flags win over the frozen ones
            driver.set_flags(flags);
            (driver, events)
        }
        None => {
            let token = resolve_token(args.token.clone())?;
            let project = args.project.clone().ok_or(Error::MissingProject)?;
            let (mut driver, events) =
                Driver::new(driver_config(&token, &project, &args, flags));
            driver.update()?;
            (driver, events)
        }
    };
    driver.save_all_qml(&args.out)?;
    info!(target: "Finished", "QML tree in {}", args.out.display());
    Ok(())
}

fn show(args: CommandShowArgs) -> Result<()> {
    let (mut driver, _events) = Driver::new(DriverConfig::new("", ""));
    driver.restore(&args.snapshot)?;
    info!(target: "Document", "{}", driver.document_name());
    for canvas in 0..driver.canvas_count() {
        driver.set_current_canvas(canvas);
        info!(target: "Canvas", "{}", driver.canvas_name());
        for element in 0..driver.element_count() {
            driver.set_current_element(element);
            info!(target: "Element", "{}", driver.element_name());
            for component in driver.components() {
                info!(target: "Component", "{component}");
            }
        }
    }
    Ok(())
}

fn driver_config(
    token: &str,
    project: &str,
    args: &CommandGenerateArgs,
    flags: Flags,
) -> DriverConfig {
    let mut config = DriverConfig::new(token, project);
    config.flags = flags;
    config.image_dimension_max = args.image_dimension_max;
    config.qml_dir = Some(args.out.clone());
    if let Some(imports) = &args.imports {
        config.imports = parse_imports(imports);
    }
    config
}

fn collect_flags(args: &CommandGenerateArgs) -> Flags {
    let mut flags = Flags::empty();
    let options = [
        (args.prerender_shapes, Flags::PRERENDER_SHAPES),
        (args.prerender_groups, Flags::PRERENDER_GROUPS),
        (args.prerender_components, Flags::PRERENDER_COMPONENTS),
        (args.prerender_frames, Flags::PRERENDER_FRAMES),
        (args.prerender_instances, Flags::PRERENDER_INSTANCES),
        (args.break_booleans, Flags::BREAK_BOOLEANS),
        (args.antialize_shapes, Flags::ANTIALIZE_SHAPES),
        (args.embed_images, Flags::EMBED_IMAGES),
        (args.qul, Flags::QUL_MODE),
    ];
    for (enabled, flag) in options {
        if enabled {
            flags = flags | flag;
        }
    }
    flags
}

fn parse_imports(value: &str) -> OrderMap<String, String> {
    let mut imports = OrderMap::new();
    for entry in value.split(';') {
        if let Some((module, version)) = entry.trim().split_once(' ') {
            imports.insert(module.to_owned(), version.to_owned());
        }
    }
    imports
}

fn resolve_token(cli_token: Option<String>) -> Result<String> {
    match cli_token.or_else(|| std::env::var("FIGMA_TOKEN").ok()) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(Error::MissingToken),
    }
}
