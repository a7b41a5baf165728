use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use log::LevelFilter;
use tgen_core::invoker::ProcessTool;
use tgen_core::support::copy_support_files;
use tgen_core::{BuiltinDescriptors, Catalog, Config, Generator, LoadPolicy, RunOutcome};

mod progress;

use progress::BarProgress;

#[derive(Parser)]
#[command(name = "tgen")]
#[command(about = "Generates runtime test fixtures for parser generator targets", long_about = None)]
struct Cli {
    /// Configuration file (JSON, or TOML with a .toml extension)
    #[arg(short, long, global = true, default_value = "tgen.json")]
    config: PathBuf,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    silent: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Descriptor folder, instead of the one in the configuration
    #[arg(long, global = true)]
    descriptors: Option<PathBuf>,

    /// Leave out descriptors that do not parse instead of stopping
    #[arg(long, global = true)]
    skip_malformed: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the test tree (default)
    Generate,
    /// List the tests the configuration admits
    List,
    /// Print one descriptor in canonical form
    Dump {
        /// Group (folder) of the test
        group: String,
        /// Test name
        test: String,
    },
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(&cli);

    let config = Config::from_file(&cli.config)
        .wrap_err_with(|| format!("Failed to load configuration {}", cli.config.display()))?;
    let catalog = load_catalog(&cli, &config)?;

    match &cli.command {
        None | Some(Commands::Generate) => generate(&cli, config, &catalog),
        Some(Commands::List) => list(&config, &catalog),
        Some(Commands::Dump { group, test }) => dump(&catalog, group, test),
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.silent {
        LevelFilter::Error
    } else {
        match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    };

    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn load_catalog(cli: &Cli, config: &Config) -> Result<Catalog> {
    let root = cli
        .descriptors
        .clone()
        .unwrap_or_else(|| config.descriptors_root());
    let policy = if cli.skip_malformed {
        LoadPolicy::Skip
    } else {
        LoadPolicy::Abort
    };

    let mut catalog = Catalog::load(&root, policy)?;
    catalog.merge(&BuiltinDescriptors)?;
    Ok(catalog)
}

fn generate(cli: &Cli, config: Config, catalog: &Catalog) -> Result<ExitCode> {
    let tool = ProcessTool::new(&config.generator_or_default())?;
    let generator = Generator::new(config, Box::new(tool))?;
    let progress = BarProgress::new(cli.silent);

    match generator.run(catalog, &progress) {
        RunOutcome::Succeeded(summary) => {
            progress.finish();
            copy_support_files(generator.config())?;
            if !cli.silent {
                println!(
                    "Generated {} tests in {} ({} filtered out, {} warnings)",
                    summary.generated,
                    generator.config().target_root().display(),
                    summary.filtered,
                    summary.warnings
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Failed(failure) => {
            progress.abandon();
            eprintln!("error: {}", failure);
            if !cli.silent {
                for line in failure.error.diagnostics() {
                    eprintln!("  {}", line);
                }
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn list(config: &Config, catalog: &Catalog) -> Result<ExitCode> {
    let filter = config.pattern_filter()?;
    for (group, tests) in catalog.groups() {
        for test in tests {
            if filter.included(group, &test.name) {
                println!("{}/{}", group, test.name);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn dump(catalog: &Catalog, group: &str, test: &str) -> Result<ExitCode> {
    let descriptor = catalog
        .find(group, test)
        .ok_or_else(|| eyre!("No test `{}` in group `{}`", test, group))?;
    print!("{}", descriptor.to_descriptor_text());
    Ok(ExitCode::SUCCESS)
}
