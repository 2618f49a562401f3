use anyhow::Result;
use bimreport_core::error::ServiceError;
use bimreport_core::params::{
    AnalysisParameters, DEVIATION_TOLERANCES, FLOOR_LEVELS, MAX_DISTANCES, MIN_COLUMN_WIDTHS,
};
use bimreport_core::settings::Settings;
use bimreport_core::upload::UploadSelection;
use bimreport_core::workflow::{AnalysisRequest, AnalysisService, Workflow, WorkflowState};
use bimreport_pdf::PdfDirectorySink;
use bimreport_service::HttpAnalysisService;
use eframe::egui;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;

const CONFIG_ENV: &str = "BIMREPORT_CONFIG";
const DEFAULT_OUT_DIR: &str = "reports";

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let settings = load_settings().unwrap_or_else(|e| {
        tracing::warn!(error = %format!("{e:#}"), "using default settings");
        Settings::default()
    });

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "BIM Column Analysis",
        native_options,
        Box::new(|cc| Ok(Box::new(BimReportApp::new(cc, settings)))),
    )
}

fn load_settings() -> Result<Settings> {
    let mut settings = match std::env::var_os(CONFIG_ENV) {
        Some(path) => Settings::load(Path::new(&path))?,
        None => Settings::default(),
    };
    if let Ok(url) = std::env::var("BIMREPORT_SERVICE_URL") {
        settings.service.url = url;
    }
    Ok(settings)
}

type Outcome = Result<Value, ServiceError>;

struct BimReportApp {
    workflow: Workflow,
    service: Result<Arc<HttpAnalysisService>, ServiceError>,
    sink: PdfDirectorySink,
    in_flight: Option<Receiver<Outcome>>,
    last_report: Option<PathBuf>,
    status: String,
}

impl BimReportApp {
    fn new(_cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        let out_dir = settings
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));
        Self {
            workflow: Workflow::new(settings.workflow),
            service: HttpAnalysisService::new(&settings.service).map(Arc::new),
            sink: PdfDirectorySink::new(out_dir),
            in_flight: None,
            last_report: None,
            status: "Choose an IFC or STEP model to begin.".to_string(),
        }
    }

    fn pick_input(&mut self) {
        let file = rfd::FileDialog::new()
            .add_filter("BIM models", &["ifc", "stp", "step"])
            .pick_file();
        if let Some(path) = file {
            self.load_input(&path);
        }
    }

    fn pick_output_dir(&mut self) {
        if let Some(path) = rfd::FileDialog::new().pick_folder() {
            self.sink = PdfDirectorySink::new(path);
        }
    }

    fn load_input(&mut self, path: &Path) {
        let selection = match UploadSelection::from_path(path) {
            Ok(selection) => selection,
            Err(e) => {
                self.status = format!("Failed to read {}: {e}", path.display());
                return;
            }
        };
        match self.workflow.select(selection) {
            Ok(()) => self.status = format!("Uploading {}", path.display()),
            Err(e) => self.status = e.to_string(),
        }
    }

    fn run_analysis(&mut self, ctx: &egui::Context) {
        let request = match self.workflow.start() {
            Ok(request) => request,
            Err(e) => {
                self.status = e.to_string();
                return;
            }
        };
        match self.service.clone() {
            Ok(service) => {
                self.in_flight = Some(spawn_analysis(service, request, ctx.clone()));
                self.status = "Analyzing…".to_string();
            }
            Err(e) => self.finish(Err(e)),
        }
    }

    fn collect_outcome(&mut self) {
        let Some(rx) = &self.in_flight else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(ServiceError::Transport(
                "analysis worker stopped unexpectedly".to_string(),
            )),
        };
        self.in_flight = None;
        self.finish(outcome);
    }

    fn finish(&mut self, outcome: Outcome) {
        match self.workflow.complete(outcome, &mut self.sink) {
            Ok(file_name) => {
                self.last_report = self.sink.last_written().map(Path::to_path_buf);
                self.status = format!("Saved {file_name}");
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    fn handle_file_drop(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().find(|f| f.path.is_some()) else {
            return;
        };
        if let Some(path) = file.path {
            self.load_input(&path);
        }
    }

    fn draw_form(&mut self, ui: &mut egui::Ui) -> bool {
        let enabled = self.workflow.controls_enabled();
        let mut parameters = self.workflow.parameters().clone();
        let mut start = false;

        ui.add_enabled_ui(enabled, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Choose model…").clicked() {
                    self.pick_input();
                }
                match self.workflow.accepted_file() {
                    Some(file) => ui.label(format!("{} ({} bytes)", file.name(), file.size())),
                    None => ui.label("No model uploaded. Drop a file here or choose one."),
                };
            });
            ui.separator();

            egui::Grid::new("parameters")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    option_row(ui, "Floor level", &mut parameters.floor_level, &FLOOR_LEVELS, false);
                    option_row(
                        ui,
                        "Min column width",
                        &mut parameters.min_column_width,
                        &MIN_COLUMN_WIDTHS,
                        true,
                    );
                    option_row(ui, "Max distance", &mut parameters.max_distance, &MAX_DISTANCES, true);
                    option_row(
                        ui,
                        "Deviation tolerance",
                        &mut parameters.deviation_tolerance,
                        &DEVIATION_TOLERANCES,
                        true,
                    );
                });
            ui.separator();

            start = ui.button("Start analysis").clicked();
        });

        if &parameters != self.workflow.parameters() {
            apply_parameters(&mut self.workflow, parameters);
        }
        start
    }

    fn draw_notice(&mut self, ctx: &egui::Context) {
        let (title, message) = match self.workflow.state() {
            WorkflowState::UploadSucceeded => ("Upload", "File uploaded successfully!".to_string()),
            WorkflowState::ReportReady { file_name } => {
                ("Report", format!("Report downloaded: {file_name}"))
            }
            WorkflowState::Failed { error } => ("Error", error.to_string()),
            _ => return,
        };

        let mut close = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                ui.horizontal(|ui| {
                    if let (WorkflowState::ReportReady { .. }, Some(path)) =
                        (self.workflow.state(), &self.last_report)
                    {
                        if ui.button("Open report").clicked() {
                            let _ = open::that(path);
                        }
                    }
                    if ui.button("Close").clicked() {
                        close = true;
                    }
                });
            });
        if close {
            self.workflow.dismiss();
        }
    }
}

impl eframe::App for BimReportApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.collect_outcome();
        self.workflow.poll();
        if self.workflow.controls_enabled() {
            self.handle_file_drop(ctx);
        }

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Column tilt analysis");
                ui.separator();
                if ui.button("Output folder…").clicked() {
                    self.pick_output_dir();
                }
                ui.label(format!("Reports: {}", self.sink.dir().display()));
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.workflow.state().is_busy() {
                    ui.spinner();
                }
                ui.label(&self.status);
                if ui.button("Open folder").clicked() {
                    let _ = open::that(self.sink.dir());
                }
            });
        });

        let mut start = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            start = self.draw_form(ui);
            ui.add_space(8.0);
            match self.workflow.state() {
                WorkflowState::Uploading { selection } => {
                    ui.label(format!("Uploading {}…", selection.name()));
                }
                WorkflowState::Submitting => {
                    ui.label("Analyzing model…");
                }
                _ => {}
            }
        });
        if start {
            self.run_analysis(ctx);
        }

        self.draw_notice(ctx);

        if let Some(wait) = self.workflow.time_until_next_timer() {
            ctx.request_repaint_after(wait);
        }
    }
}

fn spawn_analysis(
    service: Arc<HttpAnalysisService>,
    request: AnalysisRequest,
    ctx: egui::Context,
) -> Receiver<Outcome> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let outcome = service.analyze(&request);
        let _ = tx.send(outcome);
        ctx.request_repaint();
    });
    rx
}

fn apply_parameters(workflow: &mut Workflow, parameters: AnalysisParameters) {
    if let Err(e) = workflow.set_parameters(parameters) {
        tracing::debug!(error = %e, "form change ignored");
    }
}

fn option_row(ui: &mut egui::Ui, label: &str, value: &mut String, options: &[&str], optional: bool) {
    ui.label(label);
    let shown = if value.is_empty() {
        "Select…".to_string()
    } else {
        value.clone()
    };
    egui::ComboBox::from_id_salt(label)
        .selected_text(shown)
        .show_ui(ui, |ui| {
            if optional {
                ui.selectable_value(value, String::new(), "(not set)");
            }
            for option in options {
                ui.selectable_value(value, option.to_string(), *option);
            }
        });
    ui.end_row();
}

