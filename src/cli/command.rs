use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};

#[derive(Debug, ClapParser)]
#[command(
    name       = env!("CARGO_PKG_NAME"),
    version    = env!("CARGO_PKG_VERSION"),
    author     = env!("CARGO_PKG_AUTHORS"),
    about      = "Tools for probing, demuxing and wrapping raw DTS audio streams",
    long_about = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat warnings as fatal errors (fail on first warning).
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Level at which tolerated irregularities become errors.
    pub fn fail_level(&self) -> log::Level {
        if self.strict {
            log::Level::Warn
        } else {
            log::Level::Error
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print stream information
    Info(InfoArgs),

    /// Write the raw elementary stream without its container.
    Extract(ExtractArgs),

    /// Wrap a raw 14-bit DTS stream as CD audio.
    Wrap(WrapArgs),

    /// Print the components of a URL.
    Url(UrlArgs),
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input DTS stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also report the frame reached by a positional seek (0-65535).
    #[arg(long, value_name = "FRACTION")]
    pub seek: Option<u16>,

    /// Also report the frame reached by a time seek.
    #[arg(long, value_name = "MS")]
    pub seek_time: Option<u64>,

    /// Bytes inspected for stream recognition.
    #[arg(long, value_name = "BYTES", default_value_t = dts::process::PREVIEW_SIZE)]
    pub preview_size: usize,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Input DTS stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output path for the elementary stream ("-" for stdout).
    #[arg(long, value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// Start at this fraction of the stream (0-65535).
    #[arg(long, value_name = "FRACTION")]
    pub start: Option<u16>,
}

#[derive(Debug, Args)]
pub struct WrapArgs {
    /// Input raw DTS stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output path for the WAVE file.
    #[arg(long, value_name = "PATH")]
    pub output_path: PathBuf,
}

#[derive(Debug, Args)]
pub struct UrlArgs {
    /// URL to parse.
    #[arg(value_name = "URL")]
    pub url: String,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum OutputFormat {
    /// Aligned human-readable text.
    Text,
    /// YAML document.
    Yaml,
}
