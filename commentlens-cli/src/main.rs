use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

// Import from commentlens-core
use commentlens_core::console::run_console;
use commentlens_core::{
    classify_image_bytes, export_all, AnalyzerConfig, ClassificationResult, ClassifierKind,
    DocumentAnalyzer, DocumentFormat, ExportFormat, ExportTarget, ImageClassifier,
    PipelineStages, RawDocument, ResultTable, StepProfiler,
};

// Import CLI utilities
use commentlens::FontLocator;

/// Widest message column in printed tables
const TABLE_TEXT_WIDTH: usize = 60;
/// Widest bar in the category chart
const BAR_WIDTH: usize = 40;

#[derive(Parser)]
#[command(name = "commentlens")]
#[command(about = "Classify the comments in documents by sentiment, toxicity and emotion")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract comments from a document, classify and export them
    Analyze(AnalyzeArgs),
    /// Classify an image and print its top labels
    Image(ImageArgs),
    /// Classify messages typed on stdin until `exit`
    Console(ConsoleArgs),
    /// Show available config options and the effective config
    ShowConfigs {
        /// Path to custom config file (YAML format)
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// CSV, XLSX/XLS, PDF or TXT file to analyze
    #[arg(short, long)]
    input: String,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Directory for exported files (overrides config)
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Base name of exported files (overrides config)
    #[arg(short, long)]
    name: Option<String>,

    /// Export formats, comma separated: csv, xlsx, pdf
    #[arg(short, long, value_delimiter = ',')]
    formats: Vec<String>,

    /// TrueType font embedded in the PDF report
    #[arg(long)]
    font: Option<String>,

    /// Classifiers to run, comma separated: sentiment, toxicity, emotion
    #[arg(long, value_delimiter = ',')]
    classifiers: Vec<String>,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,

    /// Print results without writing any export
    #[arg(long)]
    no_export: bool,

    /// Dump all intermediate pipeline stage outputs to this directory
    #[arg(long)]
    dump_stages: Option<String>,
}

#[derive(Args)]
struct ImageArgs {
    /// PNG, JPEG, GIF, BMP or WEBP file
    #[arg(short, long)]
    input: String,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Number of labels to print (overrides config)
    #[arg(short = 'k', long)]
    top_k: Option<usize>,
}

#[derive(Args)]
struct ConsoleArgs {
    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Classifier used for every message: sentiment, toxicity or emotion
    #[arg(long)]
    classifier: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("commentlens=info".parse()?)
                .add_directive("commentlens_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    println!("🦀 CommentLens Document Analyzer");

    match cli.command {
        Command::Analyze(args) => analyze(args),
        Command::Image(args) => image(args),
        Command::Console(args) => console(args),
        Command::ShowConfigs { config } => show_configs(config.as_deref()),
    }
}

fn load_config(path: Option<&str>) -> AnalyzerConfig {
    let config = AnalyzerConfig::load_with_fallback(path);
    if let Some(config_path) = path {
        println!("📋 Loaded config from: {}", config_path);
    } else {
        println!("📋 Using default config");
    }
    config
}

fn parse_kinds(names: &[String]) -> Result<Vec<ClassifierKind>> {
    names
        .iter()
        .map(|name| {
            ClassifierKind::parse(name).ok_or_else(|| {
                anyhow!("Unknown classifier '{name}' (expected sentiment, toxicity or emotion)")
            })
        })
        .collect()
}

fn parse_formats(names: &[String]) -> Result<Vec<ExportFormat>> {
    names
        .iter()
        .map(|name| {
            ExportFormat::parse(name)
                .ok_or_else(|| anyhow!("Unknown export format '{name}' (expected csv, xlsx or pdf)"))
        })
        .collect()
}

/// Apply CLI overrides to config, then re-check it
fn apply_overrides(config: &mut AnalyzerConfig, args: &AnalyzeArgs) -> Result<()> {
    if !args.classifiers.is_empty() {
        config.select_classifiers(&parse_kinds(&args.classifiers)?);
    }
    if let Some(dir) = &args.output_dir {
        config.export.output_dir = dir.clone();
    }
    if let Some(name) = &args.name {
        config.export.file_name = name.clone();
    }
    if !args.formats.is_empty() {
        config.export.formats = parse_formats(&args.formats)?;
    }
    if let Some(font) = &args.font {
        config.export.font_path = Some(font.clone());
    }
    config.validate().context("Invalid command line options")
}

fn analyze(args: AnalyzeArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref());
    apply_overrides(&mut config, &args)?;

    let analyzer = create_analyzer(&config)?;
    if analyzer.classifiers().is_empty() {
        bail!("No classifiers enabled. Enable at least one in the config or with --classifiers");
    }

    println!("📄 Processing: {}", args.input);

    let document = match RawDocument::from_path(Path::new(&args.input)) {
        Ok(document) => document,
        Err(e) => {
            report_document_error(&args.input, &e);
            std::process::exit(1);
        }
    };

    // Stage dump mode: capture and save all intermediates
    if let Some(stages_dir) = &args.dump_stages {
        println!("\n🔬 Pipeline stage dump mode");
        match analyzer.capture_stages(&document) {
            Ok(stages) => {
                save_stages(&stages, stages_dir)?;
                println!("\n✅ All stages dumped to: {}", stages_dir);
                return Ok(());
            }
            Err(e) => {
                report_document_error(&args.input, &e);
                std::process::exit(1);
            }
        }
    }

    let mut profiler = StepProfiler::new(args.profile);
    let table = match analyzer.analyze_document_with_profiler(&document, &mut profiler) {
        Ok(table) => table,
        Err(e) => {
            report_document_error(&args.input, &e);
            std::process::exit(1);
        }
    };

    if table.is_empty() {
        println!("⚠️  No comments found in {}", args.input);
        return Ok(());
    }

    println!("✅ Analyzed {} comments", table.len());
    print_views(&table);
    print_category_chart(&table);

    if !args.no_export {
        profiler.time_step("3. Export", || export_table(&table, &config));
    }
    profiler.print_summary();

    Ok(())
}

fn report_document_error(input: &str, error: &commentlens_core::AnalyzerError) {
    if error.is_document_level() {
        eprintln!("❌ Cannot analyze {input}: {error}");
        eprintln!("   Supported inputs: .csv, .xlsx, .xls, .pdf, .txt");
    } else {
        eprintln!("❌ Processing failed: {error}");
    }
}

fn print_view(title: &str, table: &ResultTable, rows: &[&ClassificationResult]) {
    println!("\n{} ({})", title, rows.len());
    if rows.is_empty() {
        println!("   (none)");
        return;
    }
    println!("{}", table.render(rows, TABLE_TEXT_WIDTH));
}

fn print_views(table: &ResultTable) {
    let all: Vec<&ClassificationResult> = table.rows().iter().collect();
    print_view("📊 Full Analysis", table, &all);

    if table.has_sentiment() {
        print_view("😊 Positive Comments", table, &table.positive());
        print_view("😞 Negative Comments", table, &table.negative());
    }
    print_view("🚨 Needs Attention", table, &table.needs_attention());

    let failed = table.failed();
    if !failed.is_empty() {
        println!("\n⚠️  {} comments could not be classified (marked ERROR)", failed.len());
    }
}

fn bar_chart(counts: &[(String, usize)], width: usize) -> Vec<String> {
    let max = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let label_width = counts.iter().map(|(c, _)| c.chars().count()).max().unwrap_or(0);
    counts
        .iter()
        .map(|(category, count)| {
            let bar = if max == 0 {
                0
            } else {
                // Non-zero counts always get at least one block
                ((count * width + max - 1) / max).max(usize::from(*count > 0))
            };
            format!(
                "   {:<label_width$}  {} {}",
                category,
                "█".repeat(bar),
                count
            )
        })
        .collect()
}

fn print_category_chart(table: &ResultTable) {
    println!("\n📈 Category Distribution:");
    for line in bar_chart(&table.category_counts(), BAR_WIDTH) {
        println!("{line}");
    }
}

fn export_table(table: &ResultTable, config: &AnalyzerConfig) {
    let explicit_font = config.export.font_path.as_deref().map(Path::new);
    let font_path: Option<PathBuf> = if config.export.formats.contains(&ExportFormat::Pdf) {
        Some(FontLocator::new(explicit_font).resolve())
    } else {
        None
    };

    let target = ExportTarget {
        output_dir: Path::new(&config.export.output_dir),
        file_name: &config.export.file_name,
        font_path: font_path.as_deref(),
    };

    println!("\n💾 Exporting...");
    let report = export_all(table, &config.export.formats, &target);
    for path in report.written() {
        println!("   ✅ {}", path.display());
    }
    for (format, error) in report.failures() {
        println!("   ⚠️  {} not written: {}", format, error);
    }
    if !report.all_succeeded() {
        println!("   Other formats were still written; see above for details.");
    }
}

fn image(args: ImageArgs) -> Result<()> {
    let config = load_config(args.config.as_deref());
    let top_k = args.top_k.unwrap_or(config.image.top_k).max(1);

    let path = Path::new(&args.input);
    match DocumentFormat::from_path(path) {
        Ok(DocumentFormat::Image) => {}
        Ok(other) => bail!("{} is a {} document, not an image", args.input, other),
        Err(e) => bail!("Cannot classify {}: {e}", args.input),
    }
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", args.input))?;

    let classifier = create_image_classifier(&config)?;
    println!("🖼️  Classifying {} with {}", args.input, classifier.name());

    match classify_image_bytes(classifier.as_ref(), &bytes, top_k) {
        Ok(predictions) => {
            println!("\n🏷️  Top {} labels:", predictions.len());
            for (rank, prediction) in predictions.iter().enumerate() {
                println!(
                    "   {}. {} ({:.2}%)",
                    rank + 1,
                    prediction.label,
                    prediction.score * 100.0
                );
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Image classification failed: {e}");
            std::process::exit(1);
        }
    }
}

fn console(args: ConsoleArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref());
    let kind = match &args.classifier {
        Some(name) => ClassifierKind::parse(name)
            .ok_or_else(|| anyhow!("Unknown classifier '{name}' (expected sentiment, toxicity or emotion)"))?,
        None => config.console_classifier,
    };
    config.select_classifiers(&[kind]);
    config.validate().context("Invalid command line options")?;

    let analyzer = create_analyzer(&config)?;
    let classifier = analyzer
        .classifiers()
        .first()
        .ok_or_else(|| anyhow!("No {kind} classifier available"))?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let summary = run_console(classifier, stdin.lock(), &mut stdout)?;
    stdout.flush()?;

    tracing::info!(
        "Console session: {} analyzed, {} failed, {} empty lines skipped",
        summary.analyzed,
        summary.failed,
        summary.skipped
    );
    Ok(())
}

/// Create DocumentAnalyzer backed by the hosted inference API
#[cfg(feature = "hosted-inference")]
fn create_analyzer(config: &AnalyzerConfig) -> Result<DocumentAnalyzer> {
    println!("🚀 Using hosted inference: {}", config.inference.endpoint);
    for classifier in config.enabled_classifiers() {
        println!("   - {}: {}", classifier.kind, classifier.model);
    }
    Ok(DocumentAnalyzer::from_config(config))
}

/// Fallback when no backend is compiled in
#[cfg(not(feature = "hosted-inference"))]
fn create_analyzer(_config: &AnalyzerConfig) -> Result<DocumentAnalyzer> {
    Err(anyhow!(
        "No inference backend compiled in!\n\
         Compile with: --features hosted-inference"
    ))
}

#[cfg(feature = "hosted-inference")]
fn create_image_classifier(config: &AnalyzerConfig) -> Result<Box<dyn ImageClassifier>> {
    Ok(Box::new(commentlens_core::HostedImageClassifier::from_config(config)))
}

#[cfg(not(feature = "hosted-inference"))]
fn create_image_classifier(_config: &AnalyzerConfig) -> Result<Box<dyn ImageClassifier>> {
    Err(anyhow!(
        "No inference backend compiled in!\n\
         Compile with: --features hosted-inference"
    ))
}

fn show_configs(path: Option<&str>) -> Result<()> {
    let config = load_config(path);

    println!("\n📋 Available Commands:");
    println!("  analyze -i <file>       Extract, classify and export the comments of a document");
    println!("  image -i <file>         Print the top labels of an image");
    println!("  console                 Classify messages typed on stdin ('exit' to quit)");
    println!("  show-configs            Show this overview");

    println!("\n📋 Analyze Options:");
    println!("  --config <path>         Load custom config file");
    println!("  --output-dir <dir>      Directory for exported files");
    println!("  --name <base>           Base name of exported files (default: Full_Analysis)");
    println!("  --formats <list>        csv, xlsx, pdf (comma separated)");
    println!("  --font <path>           TrueType font for the PDF report");
    println!("  --classifiers <list>    sentiment, toxicity, emotion (comma separated)");
    println!("  --profile               Print per-stage timings");
    println!("  --no-export             Print results only");
    println!("  --dump-stages <dir>     Save raw texts, text units and results as JSON");

    println!("\n📄 Supported Inputs:");
    println!("  .csv                    Every cell below the header row, column by column");
    println!("  .xlsx / .xls            First worksheet, same layout as CSV");
    println!("  .pdf                    Text layer, one comment per line");
    println!("  .txt                    One comment per line");
    println!("  .png .jpg .gif .bmp     With the image command only");

    println!("\n🔤 PDF Font Lookup:");
    for candidate in FontLocator::new(config.export.font_path.as_deref().map(Path::new)).candidates() {
        println!("  {}", candidate.display());
    }

    println!("\n📝 Usage Examples:");
    println!("  cargo run -- analyze -i comments.csv");
    println!("  cargo run -- analyze -i report.pdf --classifiers sentiment --formats csv,xlsx");
    println!("  cargo run -- console --classifier emotion");

    println!("\n⚙️  Effective Config:");
    println!("{}", config.to_yaml()?);
    Ok(())
}

fn save_stages(stages: &PipelineStages, output_dir: &str) -> Result<()> {
    use std::fs;
    fs::create_dir_all(output_dir)?;

    // Stage 1a: Raw strings
    let raw_path = format!("{}/stage1a_raw_texts.json", output_dir);
    fs::write(&raw_path, serde_json::to_string_pretty(&stages.raw_texts)?)?;
    println!("  💾 {} ({} strings)", raw_path, stages.raw_texts.len());

    // Stage 1b: TextUnits
    let units_path = format!("{}/stage1b_text_units.json", output_dir);
    fs::write(&units_path, serde_json::to_string_pretty(&stages.text_units)?)?;
    println!("  💾 {} ({} units)", units_path, stages.text_units.len());

    // Stage 2: Result table
    let table_path = format!("{}/stage2_results.json", output_dir);
    fs::write(&table_path, serde_json::to_string_pretty(&stages.table)?)?;
    println!("  💾 {} ({} rows)", table_path, stages.table.len());

    // Summary file: quick reference for validation scripts
    let summary = serde_json::json!({
        "document": stages.document_name,
        "format": stages.format,
        "captured_at": chrono::Utc::now().to_rfc3339(),
        "stage_counts": {
            "raw_texts": stages.raw_texts.len(),
            "text_units": stages.text_units.len(),
            "results": stages.table.len(),
            "failed": stages.table.failed().len(),
        }
    });
    let summary_path = format!("{}/summary.json", output_dir);
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
    println!("  💾 {}", summary_path);

    Ok(())
}
