mod cli;

use cli::{Cli, Commands, Parser};
use mc_server_runner::config::{ServerConfig, validate_config};
use mc_server_runner::launch::{CommandBuilder, JvmArgs};
use mc_server_runner::pump::OperatorInput;
use mc_server_runner::runtime::{JavaProbe, RuntimeProbe, Version, VersionGate};
use mc_server_runner::server::{Interrupts, RunningState, Supervisor, SupervisorOptions};
use mc_server_runner::{Result, eula};
use owo_colors::OwoColorize;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            1
        }
    };

    // The operator input reader may still be blocked on the terminal.
    std::process::exit(code);
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config_path = if cli.config.is_absolute() {
        cli.config
    } else {
        cli.dir.join(cli.config)
    };

    match cli.command {
        Commands::Run { times, grace } => {
            let config = ServerConfig::load_or_default(&config_path)?;
            if !eula::eula_accepted(&cli.dir) {
                eprintln!(
                    "{} the EULA has not been accepted; run `mc-server-runner eula` first",
                    "warning:".yellow().bold()
                );
            }

            let options = SupervisorOptions {
                grace_period: Duration::from_secs(grace),
                ..SupervisorOptions::default()
            };
            let mut supervisor = Supervisor::new(config, RunningState::new(times)?)
                .with_server_dir(&cli.dir)
                .with_options(options);

            supervisor
                .run(OperatorInput::stdin(), Interrupts::ctrl_c())
                .await?;
            Ok(())
        }
        Commands::Command => {
            let config = ServerConfig::load_or_default(&config_path)?;
            validate_config(&config)?;
            let command = CommandBuilder::new(&config).server_dir(&cli.dir).build()?;
            println!("{}", command);
            Ok(())
        }
        Commands::Env => show_env(&config_path).await,
        Commands::Eula => {
            let path = eula::accept_eula(&cli.dir)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        Commands::Tune { write } => tune(&config_path, write),
    }
}

async fn show_env(config_path: &Path) -> Result<()> {
    let config = ServerConfig::load_or_default(config_path)?;

    if let Some(home) = std::env::var_os("JAVA_HOME") {
        println!("{} {}", "JAVA_HOME:".bold(), Path::new(&home).display());
    }
    match &config.jdk_path {
        Some(path) => println!("{} {}", "JDK path:".bold(), path.display()),
        None => println!("{} java on PATH", "JDK path:".bold()),
    }

    let game: Version = config.version.parse()?;
    println!(
        "{} {} (needs Java {})",
        "Minecraft:".bold(),
        game,
        VersionGate::required_java_major(game)
    );

    match JavaProbe.probe(config.jdk_path.clone()).await {
        Ok(runtime) => {
            println!("{} {}", "Java:".bold(), runtime);
            let outcome = VersionGate::new(config.force_run).check(game, runtime);
            if outcome.passed() {
                println!("{}", outcome.to_string().green());
            } else {
                println!("{}", outcome.to_string().red());
            }
        }
        Err(e) => println!("{} {}", "Java:".bold(), e.to_string().red()),
    }
    Ok(())
}

fn tune(config_path: &Path, write: bool) -> Result<()> {
    let mut config = ServerConfig::load_or_default(config_path)?;
    let recommended = JvmArgs::recommended(config.min_memory, config.max_memory);

    println!("{}", recommended.flatten().join(" "));
    if write {
        config.jvm_args = recommended;
        validate_config(&config)?;
        config.save(config_path)?;
        println!("Saved to {}", config_path.display());
    }
    Ok(())
}
