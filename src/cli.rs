use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "runtar")]
#[command(version)]
#[command(about = "A Rust tar reader with HTTP URL support", long_about = None)]
#[command(after_help = "Examples:\n  \
  runtar data1.tar -x joe        extract all files except joe from data1.tar\n  \
  runtar -p foo.tar | more       send contents of foo.tar via pipe into more\n  \
  runtar foo.tar 'src/*.rs'      extract the .rs files directly under src\n  \
  runtar -l https://example.com/archive.tar   list files from remote tar")]
pub struct Cli {
    /// Tar file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files, directories or glob patterns to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Diagnostic log level, written to stderr
    #[arg(long, default_value = "warn", value_enum)]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warn,
    Error,
    Silent,
}

impl LogLevel {
    pub fn to_tracing_level(&self) -> Option<tracing::Level> {
        match self {
            LogLevel::Debug => Some(tracing::Level::DEBUG),
            LogLevel::Info => Some(tracing::Level::INFO),
            LogLevel::Warn => Some(tracing::Level::WARN),
            LogLevel::Error => Some(tracing::Level::ERROR),
            LogLevel::Silent => None,
        }
    }
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags() {
        let cli = Cli::parse_from(["runtar", "-qq", "-d", "out", "a.tar", "dir1", "-x", "*.log"]);
        assert_eq!(cli.file, "a.tar");
        assert_eq!(cli.files, ["dir1"]);
        assert_eq!(cli.extract_dir.as_deref(), Some("out"));
        assert_eq!(cli.exclude, ["*.log"]);
        assert!(cli.is_very_quiet());
        assert!(!cli.is_http_url());
        assert_eq!(cli.log_level, LogLevel::Warn);
    }

    #[test]
    fn pipe_mode_is_quiet() {
        let cli = Cli::parse_from(["runtar", "-p", "https://example.com/a.tar", "--log-level", "silent"]);
        assert!(cli.is_quiet());
        assert!(cli.is_http_url());
        assert_eq!(cli.log_level.to_tracing_level(), None);
    }
}
