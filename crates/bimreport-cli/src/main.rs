use anyhow::{bail, Context, Result};
use bimreport_core::layout::{DocumentSink, PageSetup};
use bimreport_core::normalize::normalize_all;
use bimreport_core::params::{
    AnalysisParameters, DEVIATION_TOLERANCES, FLOOR_LEVELS, MAX_DISTANCES, MIN_COLUMN_WIDTHS,
};
use bimreport_core::pipeline::{render_response, report_file_name};
use bimreport_core::report::{ReportContext, ReportSummary};
use bimreport_core::schema::parse_results;
use bimreport_core::settings::Settings;
use bimreport_core::upload::UploadSelection;
use bimreport_core::workflow::{AnalysisService, Workflow, WorkflowState};
use bimreport_pdf::PdfDirectorySink;
use bimreport_service::HttpAnalysisService;
use clap::builder::PossibleValuesParser;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};

const DEFAULT_OUT_DIR: &str = "reports";

#[derive(Debug, Parser)]
#[command(name = "bimreport")]
#[command(about = "Column tilt analysis of BIM models, reported as PDF.")]
struct Cli {
    /// TOML settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Base URL of the analysis service.
    #[arg(long, global = true, env = "BIMREPORT_SERVICE_URL")]
    service_url: Option<String>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload a model, run the analysis and save the PDF report.
    Analyze {
        input: PathBuf,
        #[command(flatten)]
        form: FormArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Build the report from a saved service response without calling the service.
    Render {
        response: PathBuf,
        /// Model file name printed in the report header.
        #[arg(long)]
        file_name: String,
        #[arg(long, value_parser = PossibleValuesParser::new(FLOOR_LEVELS))]
        floor_level: String,
        #[command(flatten)]
        output: OutputArgs,
        /// Also write the plain report text here.
        #[arg(long)]
        text: Option<PathBuf>,
    },
    /// Query the analysis service health endpoint.
    Health,
}

#[derive(Debug, Args)]
struct FormArgs {
    #[arg(long, value_parser = PossibleValuesParser::new(FLOOR_LEVELS))]
    floor_level: String,
    #[arg(long, value_parser = PossibleValuesParser::new(MIN_COLUMN_WIDTHS))]
    min_column_width: Option<String>,
    #[arg(long, value_parser = PossibleValuesParser::new(MAX_DISTANCES))]
    max_distance: Option<String>,
    #[arg(long, value_parser = PossibleValuesParser::new(DEVIATION_TOLERANCES))]
    deviation_tolerance: Option<String>,
}

impl FormArgs {
    fn into_parameters(self) -> AnalysisParameters {
        AnalysisParameters {
            floor_level: self.floor_level,
            min_column_width: self.min_column_width.unwrap_or_default(),
            max_distance: self.max_distance.unwrap_or_default(),
            deviation_tolerance: self.deviation_tolerance.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Directory for the PDF report.
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Write the normalized elements as JSON.
    #[arg(long)]
    dump_elements: Option<PathBuf>,
    /// Print the report summary as JSON on stdout.
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(url) = cli.service_url {
        settings.service.url = url;
    }

    match cli.cmd {
        Command::Analyze {
            input,
            form,
            output,
        } => analyze(&settings, &input, form.into_parameters(), &output),
        Command::Render {
            response,
            file_name,
            floor_level,
            output,
            text,
        } => render(
            &settings,
            &response,
            &file_name,
            &floor_level,
            &output,
            text.as_deref(),
        ),
        Command::Health => health(&settings),
    }
}

fn analyze(
    settings: &Settings,
    input: &Path,
    parameters: AnalysisParameters,
    output: &OutputArgs,
) -> Result<()> {
    ensure_input_file(input)?;
    let selection =
        UploadSelection::from_path(input).with_context(|| format!("read model: {input:?}"))?;

    let mut workflow = Workflow::new(settings.workflow);
    workflow.set_parameters(parameters)?;
    workflow.select(selection)?;
    wait_for_upload(&mut workflow);

    let service = HttpAnalysisService::new(&settings.service)?;
    let mut sink = PdfDirectorySink::new(out_dir(settings, output));

    let request = workflow.start()?;
    let outcome = service.analyze(&request);
    let body = outcome.as_ref().ok().cloned();
    let file_name = workflow.complete(outcome, &mut sink)?;

    let path = sink.dir().join(&file_name);
    println!("{}", path.display());

    if let Some(body) = body {
        write_extras(&body, output)?;
    }
    Ok(())
}

/// Pumps the workflow timers until the simulated upload has finished.
fn wait_for_upload(workflow: &mut Workflow) {
    while matches!(workflow.state(), WorkflowState::Uploading { .. }) {
        let Some(wait) = workflow.time_until_next_timer() else {
            break;
        };
        std::thread::sleep(wait);
        workflow.poll();
    }
}

fn render(
    settings: &Settings,
    response: &Path,
    file_name: &str,
    floor_level: &str,
    output: &OutputArgs,
    text: Option<&Path>,
) -> Result<()> {
    ensure_input_file(response)?;
    let raw = std::fs::read_to_string(response)
        .with_context(|| format!("read response: {response:?}"))?;
    let body: Value = serde_json::from_str(&raw).context("parse response json")?;

    let ctx = ReportContext {
        file_name,
        floor_level,
        generated_at: chrono::Local::now().naive_local(),
    };
    let rendered = render_response(&body, &ctx, &PageSetup::a4())?;

    let report_name = report_file_name(chrono::Utc::now().date_naive());
    let mut sink = PdfDirectorySink::new(out_dir(settings, output));
    sink.emit(&rendered.document, &report_name)?;
    println!("{}", sink.dir().join(&report_name).display());

    if let Some(path) = text {
        write_file(path, &rendered.text).with_context(|| format!("write text: {path:?}"))?;
    }
    write_extras(&body, output)
}

fn health(settings: &Settings) -> Result<()> {
    let service = HttpAnalysisService::new(&settings.service)?;
    let status = service
        .health()
        .with_context(|| format!("analysis service at {}", settings.service.url))?;
    let json = serde_json::to_string_pretty(&status).context("serialize health")?;
    println!("{json}");
    Ok(())
}

fn write_extras(body: &Value, output: &OutputArgs) -> Result<()> {
    if output.dump_elements.is_none() && !output.summary {
        return Ok(());
    }
    let elements = normalize_all(&parse_results(body)?);

    if let Some(path) = &output.dump_elements {
        let json = serde_json::to_string_pretty(&elements).context("serialize elements")?;
        write_file(path, &json).with_context(|| format!("write elements: {path:?}"))?;
    }
    if output.summary {
        let summary = ReportSummary::from_elements(&elements);
        let json = serde_json::to_string_pretty(&summary).context("serialize summary")?;
        println!("{json}");
    }
    Ok(())
}

fn out_dir(settings: &Settings, output: &OutputArgs) -> PathBuf {
    output
        .out_dir
        .clone()
        .or_else(|| settings.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR))
}

fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    std::fs::write(path, contents)
}

fn ensure_input_file(input: &Path) -> Result<()> {
    match std::fs::metadata(input) {
        Ok(meta) => {
            if meta.is_file() {
                Ok(())
            } else {
                bail!("input is not a file: {input:?}");
            }
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            bail!("input not found: {input:?} (cwd: {cwd:?}).");
        }
        Err(err) => Err(err).with_context(|| format!("stat input: {input:?}")),
    }
}
