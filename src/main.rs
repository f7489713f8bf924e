use anyhow::{Context, Result};
use clap::Parser;

use nodelaunch::args::LaunchContext;
use nodelaunch::cli::{Cli, Command};
use nodelaunch::config::Config;
use nodelaunch::logging::init_tracing;
use nodelaunch::output;
use nodelaunch::peer::{QueryPolicy, RuntimePeerResolver};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Usage { role } => {
            let launcher = role.launcher()?;
            print!("{}", launcher.usage());
        }
        Command::Stages { role } => {
            let launcher = role.launcher()?;
            for (position, name) in launcher.stage_names().iter().enumerate() {
                println!("{}. {}", position + 1, name);
            }
        }
        Command::Launch { role, tokens } => {
            let config = Config::load_or_default_path(cli.config.as_deref())
                .context("loading configuration")?;

            let launcher = role.launcher()?;
            let peers = RuntimePeerResolver::new(
                config.runtime.program.clone(),
                QueryPolicy::from(&config.peer),
            )
            .context("starting peer query runtime")?;
            let ctx = LaunchContext {
                program: &config.runtime.program,
                default_image: config.images.for_role(role.as_str()),
                peers: &peers,
            };

            let invocations = launcher.run(&tokens, &ctx)?;
            println!("{}", output::render(&invocations, cli.format)?);
        }
    }
    Ok(())
}
