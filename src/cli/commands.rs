use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Run trace extraction and plot generation over a directory of experiments
#[derive(Parser, Debug)]
#[command(
    name = "expsweep",
    about = "Run trace extraction and plot generation over a directory of experiments",
    version,
    author,
    long_about = "expsweep walks every directory under the experiment root. Directories \
                  without log.txt are not experiments, directories with an 'ongoing' marker \
                  are still running, and directories with plots/allplots.pdf are done. \
                  Every other experiment gets the extraction step and then the plotting \
                  step, each called with the experiment path as its last argument.\n\n\
                  Running without a subcommand is the same as 'expsweep sweep'."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(
        short = 'c',
        long,
        global = true,
        value_name = "FILE",
        help = "Read settings from a TOML config file"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(long, global = true, help = "Emit logs as JSON on stderr")]
    pub log_json: bool,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress progress and non-error output"
    )]
    pub quiet: bool,
}

impl CliArgs {
    /// The chosen subcommand, or a default `sweep` when none was given
    pub fn command_or_default(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Sweep(SweepArgs::default()))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(
        about = "Process every pending experiment",
        long_about = "Classifies every directory under the root and runs extraction and \
                      plotting for pending experiments.\n\n\
                      Examples:\n  \
                      expsweep sweep\n  \
                      expsweep sweep /data/experiments\n  \
                      expsweep sweep --extract-cmd 'python3 extractFromTrace.py' --timeout 3600\n  \
                      expsweep sweep --strict --keep-going --format json -o report.json"
    )]
    Sweep(SweepArgs),

    #[command(
        about = "Show how each directory would be classified",
        long_about = "Classifies every directory under the root without running any step.\n\n\
                      Examples:\n  \
                      expsweep status\n  \
                      expsweep status /data/experiments --format yaml"
    )]
    Status(StatusArgs),

    #[command(about = "Print the resolved configuration")]
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SweepArgs {
    #[arg(
        value_name = "ROOT",
        help = "Directory holding the experiments (defaults to 'experiments')"
    )]
    pub root: Option<PathBuf>,

    #[arg(
        long,
        value_name = "COMMAND",
        help = "Extraction command; the experiment path is appended"
    )]
    pub extract_cmd: Option<String>,

    #[arg(
        long,
        value_name = "COMMAND",
        help = "Plotting command; the experiment path is appended"
    )]
    pub plot_cmd: Option<String>,

    #[arg(long, value_name = "SECONDS", help = "Kill a step running longer than this")]
    pub timeout: Option<u64>,

    #[arg(long, help = "Treat a failed step as a failed experiment")]
    pub strict: bool,

    #[arg(
        long,
        help = "Continue with the next experiment after a failed one (with --strict)"
    )]
    pub keep_going: bool,

    #[arg(long, help = "Classify only, do not run any step")]
    pub dry_run: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Report format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write the report to a file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct StatusArgs {
    #[arg(
        value_name = "ROOT",
        help = "Directory holding the experiments (defaults to 'experiments')"
    )]
    pub root: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormatArg {
    #[default]
    Human,
    Json,
    Yaml,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
