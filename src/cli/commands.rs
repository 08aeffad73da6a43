use clap::{Parser, Subcommand, Args};

#[derive(Parser)]
#[command(name = "hnpscan", version, about = "Batch Host Header Poisoning scanner driven by a static-analysis engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan every project under a data root
    Scan(ScanArgs),
    /// Classify already decoded engine output without running the engine
    Triage(TriageArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ScanArgs {
    /// Directory whose immediate subdirectories are the projects to scan
    pub data_root: Option<String>,

    /// Host header detection query file
    #[arg(long)]
    pub query: Option<String>,

    /// Output directory for results
    #[arg(short, long)]
    pub output: Option<String>,

    /// Analysis engine executable (default: $CODEQL_PATH or `codeql` on PATH)
    #[arg(long)]
    pub engine: Option<String>,

    /// Only scan projects of this language: python, go, java, javascript, ruby
    #[arg(long)]
    pub language: Option<String>,

    /// Per-stage timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum number of targets analyzed at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Where analysis databases are cached (default: <output>/databases)
    #[arg(long)]
    pub database_dir: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Disable the progress display
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Args, Clone, Debug)]
pub struct TriageArgs {
    /// Decoded result files (tabular text)
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Output directory for the report
    #[arg(short, long, default_value = "./results")]
    pub output: String,
}

#[derive(Args, Clone, Debug)]
pub struct ValidateArgs {
    /// Path to config file
    pub config: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan_command() {
        let cli = Cli::try_parse_from([
            "hnpscan", "-vv", "scan", "./data", "--query", "hnp.ql",
            "--concurrency", "4", "--language", "python", "--no-progress",
        ]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.data_root.as_deref(), Some("./data"));
                assert_eq!(args.query.as_deref(), Some("hnp.ql"));
                assert_eq!(args.concurrency, Some(4));
                assert!(args.no_progress);
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn test_triage_requires_files() {
        assert!(Cli::try_parse_from(["hnpscan", "triage"]).is_err());
        let cli = Cli::try_parse_from(["hnpscan", "--quiet", "triage", "a.txt", "b.txt"]).unwrap();
        assert!(cli.quiet);
        match cli.command {
            Commands::Triage(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.output, "./results");
            }
            _ => panic!("expected triage"),
        }
    }
}
