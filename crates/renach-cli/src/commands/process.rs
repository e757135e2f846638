//! Process command - extract data from a single form.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use renach_core::models::config::RenachConfig;
use renach_core::photo::decode_data_url;
use renach_core::{
    ExtractionResult, Field, FormParser, LopdfBackend, RenachExtractor, RenachParser,
};

use super::config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, or already extracted text as .txt)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Skip the photo crop
    #[arg(long)]
    no_photo: bool,

    /// Also write the cropped photo as a PNG file
    #[arg(long)]
    photo_out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = config::load(config_path)?;
    if args.no_photo {
        config.photo.enabled = false;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message("Extracting fields...");

    let result = extract_file(&args.input, config).await;
    pb.finish_and_clear();

    let result = result?;
    if !result.success {
        anyhow::bail!(
            "Extraction failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    if let Some(photo_path) = &args.photo_out {
        match &result.photo {
            Some(url) => {
                fs::write(photo_path, decode_data_url(url)?)?;
                eprintln!("{} Photo written to {}", style("✓").green(), photo_path.display());
            }
            None => eprintln!("{} No photo extracted", style("!").yellow()),
        }
    }

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Run the right path for the file type: full pipeline for `.pdf`, text rules for `.txt`.
pub async fn extract_file(path: &Path, config: RenachConfig) -> anyhow::Result<ExtractionResult> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => {
            let data = fs::read(path)?;
            let backend = LopdfBackend::from_config(&config.pdf);
            Ok(RenachExtractor::new(backend, config).extract(data).await)
        }
        "txt" => {
            let text = fs::read_to_string(path)?;
            if text.trim().is_empty() {
                anyhow::bail!("Input text is empty");
            }
            let parsed = RenachParser::from_config(&config.extraction).parse(&text);
            for warning in &parsed.warnings {
                debug!("{}", warning);
            }
            Ok(ExtractionResult::success(parsed.record, None))
        }
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    }
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(Field::ALL.iter().map(|f| f.key()))?;
    wtr.write_record(
        Field::ALL
            .iter()
            .map(|f| result.record.get(*f).unwrap_or_default()),
    )?;

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    for (field, value) in result.record.iter() {
        if field.is_address_fragment() {
            continue;
        }
        output.push_str(&format!("{}: {}\n", field, value));
    }

    let fragments: Vec<_> = result
        .record
        .iter()
        .filter(|(field, _)| field.is_address_fragment())
        .collect();
    if !fragments.is_empty() {
        output.push_str("\nAddress:\n");
        for (field, value) in fragments {
            output.push_str(&format!("  {}: {}\n", field, value));
        }
    }

    output.push_str(&format!(
        "\nPhoto: {}\n",
        if result.photo.is_some() { "present" } else { "absent" }
    ));
    output
}
