//! examseg - Document region segmentation for scanned exam pages
//!
//! CLI entry point

use anyhow::{bail, Context};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use examseg::{
    exit_codes, render_overlay, Cli, Commands, Config, PageDocument, SegmentArgs, SegmentEngine,
    Segmentation,
};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Segment(args) => run_segment(&args),
        Commands::Info => run_info(),
    };

    std::process::exit(match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_codes::GENERAL_ERROR
        }
    });
}

// ============ Segment Command ============

fn run_segment(args: &SegmentArgs) -> anyhow::Result<i32> {
    init_tracing(args.verbose, args.quiet);

    if !args.input.exists() {
        eprintln!("Error: Input path does not exist: {}", args.input.display());
        return Ok(exit_codes::INPUT_NOT_FOUND);
    }

    let page_files = collect_page_files(&args.input)?;
    if page_files.is_empty() {
        eprintln!("Error: No page JSON files found in input path");
        return Ok(exit_codes::INPUT_NOT_FOUND);
    }

    // Config file, then CLI overrides on top
    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load().unwrap_or_default(),
    };
    config.merge_overrides(&args.overrides());

    let output_dir = match &args.output {
        Some(dir) => dir.clone(),
        None => {
            if args.input.is_file() {
                args.input
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."))
            } else {
                args.input.clone()
            }
        }
    };
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.clamp(1, num_cpus::get()))
            .build_global()
            .ok();
    }

    let progress = if args.quiet || page_files.len() == 1 {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(page_files.len() as u64);
        let style = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar
    };

    let engine = SegmentEngine::new(config.to_segment_options());

    // Pages are independent; one engine invocation per page
    let outcomes: Vec<anyhow::Result<()>> = page_files
        .par_iter()
        .map(|path| {
            let outcome = process_page(path, &output_dir, &engine, &config);
            progress.inc(1);
            outcome.with_context(|| format!("page {}", path.display()))
        })
        .collect();
    progress.finish_and_clear();

    let failures: Vec<String> = outcomes
        .iter()
        .filter_map(|r| r.as_ref().err().map(|e| format!("{e:#}")))
        .collect();

    if !failures.is_empty() {
        for failure in &failures {
            eprintln!("Error: {failure}");
        }
        eprintln!(
            "{}/{} pages segmented, {} failed",
            page_files.len() - failures.len(),
            page_files.len(),
            failures.len()
        );
        return Ok(exit_codes::INVALID_INPUT);
    }

    if !args.quiet {
        println!("{} pages segmented", page_files.len());
    }
    Ok(exit_codes::SUCCESS)
}

/// Segment one page file and write its result into the output directory
fn process_page(
    path: &Path,
    output_dir: &Path,
    engine: &SegmentEngine,
    config: &Config,
) -> anyhow::Result<()> {
    let page = PageDocument::load(path)?.into_page()?;
    let segmentation = engine.segment_page(&page)?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("page");

    let result_path = output_dir.join(format!("{stem}.regions.json"));
    write_result(&result_path, &segmentation, config.output.pretty)?;

    if config.output.overlay {
        let overlay_path = output_dir.join(format!("{stem}.overlay.png"));
        render_overlay(&page, &segmentation)
            .save(&overlay_path)
            .with_context(|| format!("failed to write {}", overlay_path.display()))?;
    }
    Ok(())
}

fn write_result(path: &Path, segmentation: &Segmentation, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(segmentation)?
    } else {
        serde_json::to_string(segmentation)?
    };
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Collect page JSON files from a file or directory input
fn collect_page_files(input: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("input is neither a file nor a directory");
    }

    let mut files: Vec<PathBuf> = fs::read_dir(input)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.extension().is_some_and(|ext| ext == "json")
                && !path
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().ends_with(".regions.json"))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("examseg={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

// ============ Info Command ============

fn run_info() -> anyhow::Result<i32> {
    println!("examseg {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Default configuration:");
    let config = Config::default();
    print!("{}", toml::to_string(&config)?);
    Ok(exit_codes::SUCCESS)
}
