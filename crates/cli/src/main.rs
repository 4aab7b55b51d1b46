use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rounds_core::driver::remote::RemoteDriver;
use rounds_core::fixture::{DocStore, FixtureSet};
use rounds_core::scenario::{self, SuiteReport};
use rounds_core::{visits, HarnessConfig, HarnessError, HarnessResult, Locator, Runner, WardApp};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rounds", about = "Acceptance scenarios for the hospital visit workflow")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List scenario names and tags
    List,
    /// Run scenarios against the reference app or a rounds server
    Run {
        /// Run only the named scenario (repeatable)
        #[arg(long = "scenario", value_name = "NAME")]
        scenarios: Vec<String>,

        /// Run only scenarios carrying this tag
        #[arg(long)]
        tag: Option<String>,

        /// Base URL of a rounds server to drive instead of the in-process app
        #[arg(long, value_name = "URL")]
        remote: Option<String>,

        /// Print the suite report as JSON
        #[arg(long)]
        json: bool,

        /// TOML configuration file
        #[arg(long, value_name = "FILE", env = "ROUNDS_CONFIG")]
        config: Option<PathBuf>,

        /// Upper bound for every wait, in milliseconds
        #[arg(long, value_name = "N")]
        timeout_ms: Option<u64>,
    },
    /// Print the nodes of an HTML file matching a selector
    Query {
        /// The HTML file to query (use - for stdin)
        file: String,

        /// CSS selector, with :contains(), :first, :last and :eq(n)
        selector: String,

        /// Keep only nodes whose text contains this
        #[arg(long)]
        contains: Option<String>,

        /// Only match inside elements matching this selector
        #[arg(long, value_name = "SEL")]
        within: Option<String>,
    },
    /// Dump a fixture as JSON, or print the fingerprint of its loaded state
    Fixture {
        name: String,

        #[arg(long)]
        fingerprint: bool,

        /// Directory of extra *.json fixtures
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
    /// Serve the reference app over the driver protocol
    Serve {
        #[arg(long, default_value_t = 3848, env = "ROUNDS_PORT")]
        port: u16,

        /// Directory of extra *.json fixtures
        #[arg(long, value_name = "DIR")]
        fixtures_dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match execute(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands) -> HarnessResult<ExitCode> {
    match command {
        Commands::List => {
            for s in visits::catalog() {
                println!("{}  [{}]", s.name, s.tags.join(", "));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run {
            scenarios,
            tag,
            remote,
            json,
            config,
            timeout_ms,
        } => {
            let mut config = match config {
                Some(path) => HarnessConfig::from_file(&path)?,
                None => HarnessConfig::default(),
            };
            config.apply_env()?;
            if let Some(ms) = timeout_ms {
                config.wait_timeout_ms = ms;
            }
            if let Some(url) = &remote {
                config.use_remote(url);
            }
            debug!(?config, "resolved configuration");

            let catalog = visits::catalog();
            let selected = scenario::filter(&catalog, &scenarios, tag.as_deref())?;
            let runner = Runner::new(config.wait_policy(), &config.username);

            let report = if let Some(remote) = &config.remote {
                info!(server = %remote.base_url, "driving remote app");
                let mut driver = RemoteDriver::new(remote)?;
                runner.run(&mut driver, selected)
            } else {
                let mut driver = local_app(&config)?;
                runner.run(&mut driver, selected)
            };

            print_report(&report, json)?;
            Ok(if report.success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Query {
            file,
            selector,
            contains,
            within,
        } => {
            let html = if file == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                std::fs::read_to_string(&file)?
            };

            let mut locator = Locator::css(&selector)?;
            if let Some(text) = &contains {
                locator = locator.containing(text);
            }
            if let Some(scope) = &within {
                locator = locator.within(&Locator::css(scope)?);
            }

            let page = rounds_core::Page::parse(&file, &html)?;
            let matches = page.find_all(&locator);
            for id in &matches {
                println!("{}", page.document.describe(*id));
            }
            eprintln!("{} match(es) for {}", matches.len(), locator);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Fixture {
            name,
            fingerprint,
            dir,
        } => {
            let mut set = FixtureSet::builtin()?;
            if let Some(dir) = &dir {
                set.load_dir(dir)?;
            }
            let fixture = set.get(&name)?;
            if fingerprint {
                let mut store = DocStore::new();
                store.reset(fixture);
                println!("{}", store.fingerprint()?);
            } else {
                println!("{}", serde_json::to_string_pretty(fixture)?);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Serve { port, fixtures_dir } => serve(port, fixtures_dir),
    }
}

#[cfg(feature = "serve")]
fn serve(port: u16, fixtures_dir: Option<PathBuf>) -> HarnessResult<ExitCode> {
    let config = rounds_server::ServerConfig {
        port,
        fixtures_dir,
        ..Default::default()
    };
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(rounds_server::serve(config))
        .map_err(|e| HarnessError::Driver(e.to_string()))?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(not(feature = "serve"))]
fn serve(_port: u16, _fixtures_dir: Option<PathBuf>) -> HarnessResult<ExitCode> {
    Err(HarnessError::Config(
        "this build of rounds does not include the serve command".to_string(),
    ))
}

fn local_app(config: &HarnessConfig) -> HarnessResult<WardApp> {
    let mut fixtures = FixtureSet::builtin()?;
    if let Some(dir) = &config.fixtures_dir {
        fixtures.load_dir(dir)?;
    }
    Ok(WardApp::with_fixtures(fixtures))
}

fn print_report(report: &SuiteReport, as_json: bool) -> HarnessResult<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for result in &report.results {
        let status = if result.passed { "ok" } else { "FAILED" };
        println!(
            "{:<60} {:>6} ({} steps, {} ms)",
            result.name,
            status,
            result.steps.len(),
            result.elapsed_ms
        );
        if let Some(failure) = &result.failure {
            let last = result
                .steps
                .last()
                .map(|s| s.description.as_str())
                .unwrap_or("start");
            println!("    after: {}", last);
            println!("    {:?}: {}", failure.kind, failure.message);
        }
    }
    println!("---");
    println!(
        "{} scenarios, {} passed, {} failed in {} ms",
        report.total, report.passed, report.failed, report.duration_ms
    );
    Ok(())
}
