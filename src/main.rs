use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use tracing_subscriber::EnvFilter;

use ccprov::{
    alias,
    cli::{Cli, Command},
    commands,
    paths::Paths,
    ui::{ColorMode, Ui},
};

/// Environment variable holding the log filter, falling back to `RUST_LOG`
const LOG_ENV: &str = "CCPROV_LOG";

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("ccprov=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let mut args = std::env::args_os();
    let argv0 = args.next().unwrap_or_default();

    // Invoked through a shortcut link: everything after argv[0] belongs to Claude
    if let Some(profile) = alias::resolve(&argv0) {
        init_logging(false);
        let forwarded: Vec<OsString> = args.collect();
        let paths = Paths::new()?;
        let ui = Ui::new(ColorMode::Auto, false);
        return match commands::launch_alias(&paths, profile, &forwarded, &ui) {
            Ok(never) => match never {},
            Err(e) => Err(e),
        };
    }

    let cli = Cli::parse();
    init_logging(cli.verbose);
    let paths = Paths::new()?;
    let ui = Ui::new(cli.color, cli.no_color);

    match cli.command {
        Command::Init { no_link } => commands::init(&paths, &ui, !no_link),
        Command::List => commands::list(&paths, &ui),
        Command::Current => commands::current(&paths, &ui),
        Command::Show { name } => commands::show(&paths, name.as_deref(), &ui),
        Command::Use { name } => commands::use_profile(&paths, &name, &ui),
        Command::Add(args) => commands::add(&paths, &args, &ui),
        Command::Remove { name, force } => commands::remove(&paths, &name, &ui, force),
        Command::Edit => commands::edit(&paths, &ui),
        Command::Link { dir } => commands::link(&paths, dir, &ui),
        Command::Unlink { dir } => commands::unlink(&paths, dir, &ui),
        Command::Doctor => commands::doctor(&paths, &ui),
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "ccprov", &mut std::io::stdout());
            Ok(())
        }
    }
}
