//! sectionize CLI - heading-aware chunking for PDF and DOCX files

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use sectionize::parser::segment;
use sectionize::render::{self, JsonFormat};
use sectionize::{
    Dataset, Evaluation, ForestModel, LabelStore, PipelineOptions, Sectionizer, Segmenter,
};

#[derive(Parser)]
#[command(name = "sectionize")]
#[command(version)]
#[command(about = "Split PDF and DOCX files into heading-delimited chunks", long_about = None)]
struct Cli {
    /// Word-frequency dictionary used to re-split run-together words
    #[arg(long, global = true, value_name = "FILE", env = "SECTIONIZE_DICTIONARY")]
    dictionary: Option<PathBuf>,

    /// Maximum words per chunk
    #[arg(long, global = true, default_value_t = sectionize::parser::DEFAULT_MAX_WORDS)]
    max_words: usize,

    /// Vertical tolerance for grouping words into lines
    #[arg(long, global = true, default_value_t = sectionize::parser::DEFAULT_LINE_THRESHOLD)]
    threshold: f32,

    /// Process files one at a time
    #[arg(long, global = true)]
    sequential: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Structure documents into sections and chunks
    Structure {
        /// Input PDF or DOCX files
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Classifier model (JSON)
        #[arg(short, long, value_name = "FILE", env = "SECTIONIZE_MODEL")]
        model: PathBuf,

        /// Output file for one input, output directory for several (stdout if not specified)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Produce rule-based labels for training
    Label {
        /// Input PDF or DOCX files
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Output label file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show the repaired lines of a document
    Inspect {
        /// Input PDF or DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Label file keyed by document file name
        #[arg(short, long, value_name = "FILE")]
        labels: Option<PathBuf>,

        /// Print lines with all features as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the inferred body and heading typography
    Insights {
        /// Input PDF or DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print insights as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export labelled feature vectors for training
    Dataset {
        /// Input PDF or DOCX files
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Label file keyed by document file name
        #[arg(short, long, value_name = "FILE")]
        labels: PathBuf,

        /// Output dataset file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Score a classifier against reference labels
    Evaluate {
        /// Input PDF or DOCX files
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Classifier model (JSON)
        #[arg(short, long, value_name = "FILE", env = "SECTIONIZE_MODEL")]
        model: PathBuf,

        /// Label file keyed by document file name
        #[arg(short, long, value_name = "FILE")]
        labels: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = run(cli);

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(ref path) = cli.dictionary {
        segment::install(Segmenter::from_path(path)?)?;
        log::info!("Loaded dictionary {}", path.display());
    }

    let mut options = PipelineOptions::new()
        .with_max_words(cli.max_words)
        .with_line_threshold(cli.threshold);
    if cli.sequential {
        options = options.sequential();
    }
    options.validate()?;
    let sectionizer = Sectionizer::new().with_options(options);

    match cli.command {
        Commands::Structure {
            inputs,
            model,
            output,
            compact,
        } => cmd_structure(sectionizer, &inputs, &model, output.as_deref(), compact),
        Commands::Label { inputs, output } => cmd_label(&sectionizer, &inputs, output.as_deref()),
        Commands::Inspect {
            input,
            labels,
            json,
        } => cmd_inspect(&sectionizer, &input, labels.as_deref(), json),
        Commands::Insights { input, json } => cmd_insights(&sectionizer, &input, json),
        Commands::Dataset {
            inputs,
            labels,
            output,
        } => cmd_dataset(&sectionizer, &inputs, &labels, output.as_deref()),
        Commands::Evaluate {
            inputs,
            model,
            labels,
        } => cmd_evaluate(sectionizer, &inputs, &model, &labels),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    }
}

fn progress_bar(len: usize) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn write_or_print(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_structure(
    sectionizer: Sectionizer,
    inputs: &[PathBuf],
    model: &Path,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let sectionizer = sectionizer.with_classifier(ForestModel::load(model)?);

    if let [input] = inputs {
        let sections = sectionizer.structure(input)?;
        let json = render::to_json(&sections, format)?;
        return write_or_print(output, &json);
    }

    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&output_dir)?;

    let pb = progress_bar(inputs.len())?;
    pb.set_message("Structuring...");
    let items = sectionizer.structure_batch(inputs);

    let mut failed = 0;
    for item in items {
        pb.inc(1);
        match item.result {
            Ok(sections) => {
                let stem = item.path.file_stem().unwrap_or_default().to_string_lossy();
                let path = output_dir.join(format!("{}.json", stem));
                fs::write(&path, render::to_json(&sections, format)?)?;
                pb.println(format!("{} {}", "Wrote".green(), path.display()));
            }
            Err(e) => {
                failed += 1;
                pb.println(format!("{} {}: {}", "Failed".red(), item.path.display(), e));
            }
        }
    }
    pb.finish_with_message("Done!");

    if failed > 0 {
        return Err(format!("{} of {} files failed", failed, inputs.len()).into());
    }
    Ok(())
}

fn cmd_label(
    sectionizer: &Sectionizer,
    inputs: &[PathBuf],
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = progress_bar(inputs.len())?;
    pb.set_message("Labelling...");

    let mut store = LabelStore::new();
    for input in inputs {
        let labels = sectionizer.weak_labels(input)?;
        store.insert(file_name(input), labels);
        pb.inc(1);
    }
    pb.finish_and_clear();

    write_or_print(output, &store.to_json()?)
}

fn cmd_inspect(
    sectionizer: &Sectionizer,
    input: &Path,
    labels: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = labels.map(LabelStore::load).transpose()?;
    let reference = store.as_ref().and_then(|s| s.for_path(input));
    let lines = sectionizer.extract_lines(input)?;

    if json {
        println!("{}", render::to_json_value(&lines, JsonFormat::Pretty)?);
        return Ok(());
    }

    for line in &lines {
        let sizes: Vec<String> = line.size_stats.keys().map(|s| s.to_string()).collect();
        let label = reference
            .and_then(|r| r.get_raw(&line.key()))
            .unwrap_or("UNLABELED");
        let label = if label == "HEADING" {
            label.yellow().bold()
        } else {
            label.dimmed()
        };
        println!(
            "{} {} {:<9} {}",
            format!("[{:>8}]", line.key()).dimmed(),
            format!("{:>7.1}", line.layout.top).cyan(),
            label,
            line.text
        );
        println!(
            "           {} {}  {} {}",
            "sizes".dimmed(),
            sizes.join(","),
            "fonts".dimmed(),
            line.style_stats.keys().cloned().collect::<Vec<_>>().join(",")
        );
    }
    println!("\n{} {} lines", "Total:".bold(), lines.len());

    Ok(())
}

fn cmd_insights(
    sectionizer: &Sectionizer,
    input: &Path,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let document = sectionizer.analyze(input)?;
    let insights = &document.insights;

    if json {
        println!("{}", render::to_json_value(insights, JsonFormat::Pretty)?);
        return Ok(());
    }
    let none = || "-".dimmed().to_string();

    println!("{}", "Typography Insights".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Lines".bold(), document.lines.len());
    println!(
        "{}: {}",
        "Paragraph font".bold(),
        insights.paragraph_font.clone().unwrap_or_else(none)
    );
    println!(
        "{}: {}",
        "Heading fonts".bold(),
        if insights.heading_fonts.is_empty() {
            none()
        } else {
            insights.heading_fonts.join(", ")
        }
    );
    println!(
        "{}: {}",
        "Paragraph size".bold(),
        insights
            .paragraph_size
            .map(|s| s.to_string())
            .unwrap_or_else(none)
    );
    println!(
        "{}: {}",
        "Heading size".bold(),
        insights
            .heading_size
            .map(|s| s.to_string())
            .unwrap_or_else(none)
    );

    Ok(())
}

fn cmd_dataset(
    sectionizer: &Sectionizer,
    inputs: &[PathBuf],
    labels: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = LabelStore::load(labels)?;
    let pb = progress_bar(inputs.len())?;
    pb.set_message("Collecting samples...");

    let mut dataset = Dataset::new();
    for input in inputs {
        pb.inc(1);
        let Some(reference) = store.for_path(input) else {
            pb.println(format!("{} {}: no labels", "Skipped".yellow(), input.display()));
            continue;
        };
        let document = sectionizer.analyze(input)?;
        let added = dataset.add_document(&document.lines, &document.insights, reference);
        log::debug!("{}: {} samples", input.display(), added);
    }
    pb.finish_and_clear();

    for (label, count) in dataset.class_counts() {
        eprintln!("{}: {}", label.to_string().bold(), count);
    }

    write_or_print(output, &render::to_json_value(&dataset, JsonFormat::Compact)?)
}

fn cmd_evaluate(
    sectionizer: Sectionizer,
    inputs: &[PathBuf],
    model: &Path,
    labels: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = LabelStore::load(labels)?;
    let sectionizer = sectionizer.with_classifier(ForestModel::load(model)?);

    let mut evaluation = Evaluation::new();
    for input in inputs {
        let Some(reference) = store.for_path(input) else {
            eprintln!("{} {}: no labels", "Skipped".yellow(), input.display());
            continue;
        };
        let document = sectionizer.analyze(input)?;
        let predicted = sectionizer.classify(&document)?;
        evaluation.add_document(&predicted, reference);
    }

    println!("{}", "Evaluation".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Lines".bold(), evaluation.total());
    println!("{}: {}", "Skipped".bold(), evaluation.skipped);
    println!("{}: {:.3}", "Accuracy".bold(), evaluation.accuracy());
    println!();
    println!(
        "{:<10} {:>9} {:>9} {:>9} {:>9}",
        "label", "precision", "recall", "f1", "support"
    );
    for score in evaluation.scores() {
        println!(
            "{:<10} {:>9.3} {:>9.3} {:>9.3} {:>9}",
            score.label.as_str(),
            score.precision,
            score.recall,
            score.f1,
            score.support
        );
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "sectionize".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Heading-aware chunking for PDF and DOCX files");
    println!();
    println!("License: MIT");
}
