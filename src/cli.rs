//! Command-line interface definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Document region segmentation for scanned exam pages
#[derive(Debug, Parser)]
#[command(name = "examseg", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Segment classified page documents into visual regions
    Segment(SegmentArgs),

    /// Show version and default configuration
    Info,
}

/// Arguments for the segment command
#[derive(Debug, Args)]
pub struct SegmentArgs {
    /// Classified page JSON file, or a directory of them
    pub input: PathBuf,

    /// Output directory (defaults to the input's directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file path (defaults to the user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the content margin (px)
    #[arg(long)]
    pub margin: Option<f64>,

    /// Override the label cluster gap threshold (px)
    #[arg(long)]
    pub gap_threshold: Option<f64>,

    /// Override the minimum fallback gap height (px)
    #[arg(long)]
    pub min_gap: Option<f64>,

    /// Use flexible-mode gap detection (smaller gaps accepted)
    #[arg(long)]
    pub flexible: bool,

    /// Override the duplicate overlap threshold (0-1)
    #[arg(long)]
    pub overlap_threshold: Option<f64>,

    /// Render a diagnostic overlay PNG per page
    #[arg(long)]
    pub overlay: bool,

    /// Pretty-print result JSON
    #[arg(long)]
    pub pretty: bool,

    /// Worker threads for directory input (defaults to CPU count)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Increase verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl SegmentArgs {
    /// Collect the override set for config merging
    pub fn overrides(&self) -> crate::config::CliOverrides {
        crate::config::CliOverrides {
            margin: self.margin,
            gap_threshold: self.gap_threshold,
            min_gap: self.min_gap,
            flexible: self.flexible,
            overlap_threshold: self.overlap_threshold,
            overlay: self.overlay,
            pretty: self.pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segment_command() {
        let cli = Cli::parse_from(["examseg", "segment", "pages/", "--flexible", "-j", "4"]);
        match cli.command {
            Commands::Segment(args) => {
                assert_eq!(args.input, PathBuf::from("pages/"));
                assert!(args.flexible);
                assert_eq!(args.jobs, Some(4));
                assert!(!args.overlay);
            }
            _ => panic!("expected segment command"),
        }
    }

    #[test]
    fn test_parse_info_command() {
        let cli = Cli::parse_from(["examseg", "info"]);
        assert!(matches!(cli.command, Commands::Info));
    }

    #[test]
    fn test_threshold_overrides() {
        let cli = Cli::parse_from([
            "examseg",
            "segment",
            "page.json",
            "--margin",
            "5",
            "--overlap-threshold",
            "0.9",
            "--overlay",
        ]);
        match cli.command {
            Commands::Segment(args) => {
                let overrides = args.overrides();
                assert_eq!(overrides.margin, Some(5.0));
                assert_eq!(overrides.overlap_threshold, Some(0.9));
                assert!(overrides.overlay);
                assert!(overrides.min_gap.is_none());
            }
            _ => panic!("expected segment command"),
        }
    }

    #[test]
    fn test_verbosity_count() {
        let cli = Cli::parse_from(["examseg", "segment", "page.json", "-vv"]);
        match cli.command {
            Commands::Segment(args) => assert_eq!(args.verbose, 2),
            _ => panic!("expected segment command"),
        }
    }
}
