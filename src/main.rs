use anyhow::Result;
use clap::Parser;
use fresh_start::commands;
use fresh_start::config::{CliOptions, ScaffoldConfig};
use fresh_start::repo;
use log::LevelFilter;
use std::io::Write;

#[derive(Parser)]
#[command(name = "fresh-start")]
#[command(
    about = "Bootstrap an opinionated structure in a fresh Laravel project",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Accept every default without prompting
    #[arg(long)]
    defaults: bool,

    /// Directory under app/ that will hold the models
    #[arg(long, value_name = "NAME")]
    models_directory: Option<String>,

    /// Name of the abstract base model class
    #[arg(long, value_name = "NAME")]
    abstract_model: Option<String>,

    /// Composer invocation used for package commands
    #[arg(long, value_name = "CMD")]
    composer: Option<String>,

    /// Skip authentication scaffolding
    #[arg(long)]
    without_auth: bool,

    /// Frontend preset to scaffold (bootstrap, vue or react)
    #[arg(long, value_name = "PRESET")]
    preset: Option<String>,

    /// Skip installing the optional dev packages
    #[arg(long)]
    without_packages: bool,

    /// Leave the bootstrap package entry in composer.json
    #[arg(long)]
    keep_package: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli);

    let root = repo::find_root()?;

    let options = CliOptions {
        defaults: cli.defaults,
        models_dir: cli.models_directory,
        abstract_model: cli.abstract_model,
        composer: cli.composer,
        without_auth: cli.without_auth,
        preset: cli.preset,
        without_packages: cli.without_packages,
        keep_package: cli.keep_package,
    };
    let config = ScaffoldConfig::resolve(&options)?;

    commands::app::fresh_start(&root, &config)
}

fn init_logging(cli: &Cli) {
    let mut builder = env_logger::builder();
    builder
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .format(|buf, record| {
            let level = record.level();
            let style = &buf.default_level_style(level);

            writeln!(buf, "[{style}{level}{style:#}] {}", record.args())
        });

    if !cli.verbose {
        builder.format_timestamp(None);
    }

    builder.init();
}
