use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use terramap_cli::{run_choropleth, run_mosaic, CliError, Config};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// `terramap` - merge elevation tiles and draw choropleth maps.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// YAML config file. Defaults apply to anything it leaves out.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge GeoTIFF tiles into a single mosaic.
    Mosaic(MosaicArgs),
    /// Join a CSV onto region polygons and write SVG and HTML maps.
    Choropleth(ChoroplethArgs),
    /// Write the default configuration as YAML.
    InitConfig {
        /// Destination file.
        #[arg(default_value = "terramap.yaml")]
        path: PathBuf,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
struct MosaicArgs {
    /// Directory containing the tiles.
    #[arg(long)]
    input_dir: Option<PathBuf>,
    /// Glob pattern for tile names.
    #[arg(long)]
    pattern: Option<String>,
    /// Mosaic output path.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ChoroplethArgs {
    /// Attribute CSV.
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Local GeoJSON polygons, used instead of the WFS.
    #[arg(long)]
    geometry_file: Option<PathBuf>,
    /// WFS endpoint.
    #[arg(long)]
    wfs_url: Option<String>,
    /// WFS feature type.
    #[arg(long)]
    type_name: Option<String>,
    /// Numeric column to map.
    #[arg(long)]
    value_column: Option<String>,
    /// Number of quantile classes.
    #[arg(long)]
    classes: Option<usize>,
    /// Colour ramp name.
    #[arg(long)]
    palette: Option<String>,
    /// Fail when a region has no attribute row.
    #[arg(long)]
    strict_join: bool,
    /// SVG output path.
    #[arg(long)]
    static_output: Option<PathBuf>,
    /// HTML output path.
    #[arg(long)]
    html_output: Option<PathBuf>,
}

impl MosaicArgs {
    fn apply(self, config: &mut Config) {
        let mosaic = &mut config.mosaic;
        if let Some(v) = self.input_dir {
            mosaic.input_dir = v;
        }
        if let Some(v) = self.pattern {
            mosaic.pattern = v;
        }
        if let Some(v) = self.output {
            mosaic.output = v;
        }
    }
}

impl ChoroplethArgs {
    fn apply(self, config: &mut Config) {
        let choropleth = &mut config.choropleth;
        if let Some(v) = self.csv {
            choropleth.csv_path = v;
        }
        if let Some(v) = self.geometry_file {
            choropleth.geometry_file = Some(v);
        }
        if let Some(v) = self.wfs_url {
            choropleth.wfs.url = Some(v);
        }
        if let Some(v) = self.type_name {
            choropleth.wfs.type_name = Some(v);
        }
        if let Some(v) = self.value_column {
            choropleth.value_column = v;
        }
        if let Some(v) = self.classes {
            choropleth.classes = v;
        }
        if let Some(v) = self.palette {
            choropleth.palette = v;
        }
        if self.strict_join {
            choropleth.strict_join = true;
        }
        if let Some(v) = self.static_output {
            choropleth.static_output = v;
        }
        if let Some(v) = self.html_output {
            choropleth.html_output = v;
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            Config::load(path)?
        }
        None => Config::default(),
    };

    match cli.command {
        Command::Mosaic(args) => {
            args.apply(&mut config);
            let summary = run_mosaic(&config.mosaic)?;
            info!(
                "Mosaic of {} tiles is {}x{} pixels",
                summary.tile_count, summary.width, summary.height
            );
        }
        Command::Choropleth(args) => {
            args.apply(&mut config);
            let summary = run_choropleth(&config.choropleth)?;
            info!(
                "Mapped {} of {} regions",
                summary.report.joined_count, summary.report.geometry_count
            );
        }
        Command::InitConfig { path, force } => {
            if path.exists() && !force {
                return Err(CliError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            std::fs::write(&path, config.to_yaml()?)?;
            info!("Wrote default config to {}", path.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
