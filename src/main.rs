use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use nippo::core::{DailyReport, ViewConfig};
use nippo::format_report;
use nippo::parser::date_from_path;
use nippo::projectors::carryover_projector;
use nippo::projectors::slot_projector::{self, SlotOptions};

#[derive(Debug, Parser)]
#[command(
    name = "nippo",
    about = "Daily-report tooling built on the nippo crate",
    version
)]
struct Cli {
    /// Enable verbose logging for debugging.
    #[arg(long, global = true)]
    verbose: bool,
    /// Author recorded on parsed reports.
    #[arg(long, global = true, default_value = "")]
    author: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse report files and print their structure.
    Parse(ParseArgs),

    /// Re-encode report files into the canonical markdown layout.
    Format(FormatArgs),

    /// Print the render slots computed for one report.
    Slots(SlotsArgs),

    /// Create a new report, optionally carrying over yesterday's open todos.
    New(NewArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Report files or directories containing `YYYY-MM-DD.md` files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Emit JSON instead of a debug representation.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct FormatArgs {
    /// Report files or directories to format.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Overwrite the file instead of printing to stdout.
    #[arg(long)]
    in_place: bool,
}

#[derive(Debug, Args)]
struct SlotsArgs {
    /// Report file to project.
    input: PathBuf,
    /// Which schedule list to project.
    #[arg(long, value_enum, default_value = "plan")]
    list: SlotsList,
    /// Emit JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SlotsList {
    Plan,
    Result,
}

#[derive(Debug, Args)]
struct NewArgs {
    /// Date for the new report. Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Previous report whose unfinished todos carry over.
    #[arg(long)]
    from: Option<PathBuf>,
    /// Write the markdown here instead of printing to stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    let author = cli.author.clone();
    match cli.command {
        Commands::Parse(args) => handle_parse(args, &author, verbose),
        Commands::Format(args) => handle_format(args, &author, verbose),
        Commands::Slots(args) => handle_slots(args, &author),
        Commands::New(args) => handle_new(args, &author, verbose),
    }
}

fn load_report(path: &Path, author: &str) -> Result<DailyReport> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let date = date_from_path(path)?;
    Ok(nippo::parse_report_from_str(date, author, &text))
}

fn handle_parse(args: ParseArgs, author: &str, verbose: bool) -> Result<()> {
    let ParseArgs { inputs, json } = args;
    let expanded = expand_inputs(&inputs, verbose)?;
    if expanded.is_empty() {
        anyhow::bail!("no report files found in the provided inputs");
    }

    let mut parsed = Vec::new();
    for path in expanded {
        if verbose {
            eprintln!("Parsing {:?}", path);
        }
        let report = load_report(&path, author).with_context(|| format!("parsing {:?}", path))?;
        parsed.push((path, report));
    }

    if json {
        #[derive(serde::Serialize)]
        struct JsonOutput<'a> {
            path: String,
            report: &'a DailyReport,
        }

        let payload: Vec<JsonOutput<'_>> = parsed
            .iter()
            .map(|(path, report)| JsonOutput {
                path: path.display().to_string(),
                report,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for (idx, (path, report)) in parsed.iter().enumerate() {
            if parsed.len() > 1 {
                println!("== {} ==", path.display());
            }
            println!("{:#?}", report);
            if parsed.len() > 1 && idx + 1 < parsed.len() {
                println!();
            }
        }
    }
    Ok(())
}

fn handle_format(args: FormatArgs, author: &str, verbose: bool) -> Result<()> {
    let FormatArgs { inputs, in_place } = args;
    let expanded = expand_inputs(&inputs, verbose)?;
    if expanded.is_empty() {
        anyhow::bail!("no report files found in the provided inputs");
    }

    let mut first = true;
    for path in expanded {
        if verbose {
            eprintln!("Formatting {:?}", path);
        }
        let report = load_report(&path, author).with_context(|| format!("parsing {:?}", path))?;
        let formatted = format_report(&report);

        if in_place {
            fs::write(&path, formatted.as_bytes())
                .with_context(|| format!("writing {:?}", path))?;
        } else {
            if !first {
                println!();
                println!("== {} ==", path.display());
            } else if inputs.len() > 1 {
                println!("== {} ==", path.display());
            }
            first = false;
            print!("{formatted}");
        }
    }

    Ok(())
}

fn handle_slots(args: SlotsArgs, author: &str) -> Result<()> {
    let SlotsArgs { input, list, json } = args;
    let report = load_report(&input, author).with_context(|| format!("parsing {:?}", input))?;

    let entries = match list {
        SlotsList::Plan => &report.plan,
        SlotsList::Result => &report.result,
    };
    let opts = SlotOptions::from_config(&ViewConfig::default());
    let slots = slot_projector::project_slots(entries, &opts);

    if json {
        println!("{}", serde_json::to_string_pretty(&slots)?);
        return Ok(());
    }

    if slots.is_empty() {
        eprintln!("No renderable slots in the selected list.");
        return Ok(());
    }
    for slot in &slots {
        let label = if slot.is_break {
            "(break)".to_string()
        } else {
            format!("[{}] {}", slot.project, slot.task)
        };
        println!("{} {:>4}min {}", slot.time, slot.duration, label);
    }
    Ok(())
}

fn handle_new(args: NewArgs, author: &str, verbose: bool) -> Result<()> {
    let NewArgs { date, from, output } = args;
    let date = date.unwrap_or_else(|| Local::now().date_naive());

    let report = match from {
        Some(prev_path) => {
            if verbose {
                eprintln!("Carrying over from {:?}", prev_path);
            }
            let previous = load_report(&prev_path, author)
                .with_context(|| format!("parsing previous report {:?}", prev_path))?;
            carryover_projector::build_next_day(&previous, date)
        }
        None => DailyReport::new(date, author),
    };

    let text = format_report(&report);
    match output {
        Some(path) => {
            fs::write(&path, text.as_bytes()).with_context(|| format!("writing {:?}", path))?;
            println!("Wrote new report to {:?}", path);
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn expand_inputs(paths: &[PathBuf], verbose: bool) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut visited = BTreeSet::new();
    for path in paths {
        let canonical =
            fs::canonicalize(path).with_context(|| format!("resolving path {:?}", path))?;
        let meta = fs::metadata(&canonical)
            .with_context(|| format!("reading metadata for {:?}", canonical))?;
        if meta.is_dir() {
            if verbose {
                eprintln!("Scanning directory {:?}", canonical);
            }
            for file in collect_report_files(&canonical)? {
                if visited.insert(file.clone()) {
                    out.push(file);
                }
            }
        } else if meta.is_file() {
            if canonical.extension().map(|ext| ext == "md").unwrap_or(false) {
                if visited.insert(canonical.clone()) {
                    out.push(canonical);
                }
            } else {
                anyhow::bail!("{:?} is not a .md file", canonical);
            }
        }
    }
    Ok(out)
}

fn collect_report_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading directory {:?}", dir))? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if !file_type.is_file() {
            continue;
        }
        let path = entry.path();
        // Only date-named reports count; stray markdown is left alone.
        if path.extension().map(|ext| ext == "md").unwrap_or(false)
            && date_from_path(&path).is_ok()
        {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}
