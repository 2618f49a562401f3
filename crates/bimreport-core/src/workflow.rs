//! Upload and analysis lifecycle.
//!
//! `Workflow` owns the form values and the current state; front ends only
//! call its transition methods and read it back. Time-based transitions
//! (simulated upload, auto-dismissed notices) are one-shot timers that fire
//! from [`Workflow::poll`]. Entering any state replaces the pending timer, so
//! a timer never acts on a state other than the one that scheduled it.

use crate::error::{AnalysisError, ServiceError};
use crate::layout::{DocumentSink, PageSetup};
use crate::params::AnalysisParameters;
use crate::pipeline::{render_response, report_file_name};
use crate::report::ReportContext;
use crate::settings::WorkflowConfig;
use crate::upload::UploadSelection;
use serde_json::Value;
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}

/// The remote analysis endpoint.
pub trait AnalysisService {
    fn analyze(&self, request: &AnalysisRequest) -> Result<Value, ServiceError>;
}

/// Snapshot of the form taken when an analysis starts.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub file: UploadSelection,
    pub parameters: AnalysisParameters,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    Uploading { selection: UploadSelection },
    UploadSucceeded,
    Submitting,
    ReportReady { file_name: String },
    Failed { error: AnalysisError },
}

impl WorkflowState {
    pub fn label(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Uploading { .. } => "uploading",
            WorkflowState::UploadSucceeded => "upload-succeeded",
            WorkflowState::Submitting => "submitting",
            WorkflowState::ReportReady { .. } => "report-ready",
            WorkflowState::Failed { .. } => "failed",
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            WorkflowState::Uploading { .. } | WorkflowState::Submitting
        )
    }

    fn is_notice(&self) -> bool {
        matches!(
            self,
            WorkflowState::UploadSucceeded
                | WorkflowState::ReportReady { .. }
                | WorkflowState::Failed { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    UploadFinished,
    DismissNotice,
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    event: TimerEvent,
    due: Instant,
}

pub struct Workflow<C: Clock = SystemClock> {
    config: WorkflowConfig,
    page_setup: PageSetup,
    clock: C,
    state: WorkflowState,
    file: Option<UploadSelection>,
    parameters: AnalysisParameters,
    timer: Option<Scheduled>,
}

impl Workflow<SystemClock> {
    pub fn new(config: WorkflowConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Workflow<C> {
    pub fn with_clock(config: WorkflowConfig, clock: C) -> Self {
        Self {
            config,
            page_setup: PageSetup::default(),
            clock,
            state: WorkflowState::Idle,
            file: None,
            parameters: AnalysisParameters::default(),
            timer: None,
        }
    }

    pub fn with_page_setup(mut self, setup: PageSetup) -> Self {
        self.page_setup = setup;
        self
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn parameters(&self) -> &AnalysisParameters {
        &self.parameters
    }

    pub fn accepted_file(&self) -> Option<&UploadSelection> {
        self.file.as_ref()
    }

    /// Inputs and the start button are disabled while this is false.
    pub fn controls_enabled(&self) -> bool {
        !self.state.is_busy()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.map(|t| t.due)
    }

    pub fn time_until_next_timer(&self) -> Option<Duration> {
        self.timer
            .map(|t| t.due.saturating_duration_since(self.clock.now()))
    }

    pub fn set_parameters(&mut self, parameters: AnalysisParameters) -> Result<(), AnalysisError> {
        self.ensure_idle_controls()?;
        self.parameters = parameters;
        Ok(())
    }

    pub fn set_floor_level(&mut self, value: impl Into<String>) -> Result<(), AnalysisError> {
        self.ensure_idle_controls()?;
        self.parameters.floor_level = value.into();
        Ok(())
    }

    pub fn set_min_column_width(&mut self, value: impl Into<String>) -> Result<(), AnalysisError> {
        self.ensure_idle_controls()?;
        self.parameters.min_column_width = value.into();
        Ok(())
    }

    pub fn set_max_distance(&mut self, value: impl Into<String>) -> Result<(), AnalysisError> {
        self.ensure_idle_controls()?;
        self.parameters.max_distance = value.into();
        Ok(())
    }

    pub fn set_deviation_tolerance(
        &mut self,
        value: impl Into<String>,
    ) -> Result<(), AnalysisError> {
        self.ensure_idle_controls()?;
        self.parameters.deviation_tolerance = value.into();
        Ok(())
    }

    /// Offers a file for upload. An unsupported extension fails the attempt
    /// immediately; otherwise the upload runs for `upload_latency`.
    pub fn select(&mut self, selection: UploadSelection) -> Result<(), AnalysisError> {
        self.ensure_idle_controls()?;

        if !selection.has_accepted_extension() {
            let error = AnalysisError::UnsupportedFormat {
                file_name: selection.name().to_string(),
            };
            self.fail(error.clone());
            return Err(error);
        }

        info!(file = selection.name(), size = selection.size(), "upload started");
        let latency = self.config.upload_latency();
        self.enter(WorkflowState::Uploading { selection });
        self.schedule(TimerEvent::UploadFinished, latency);
        Ok(())
    }

    /// Validates the form and enters `Submitting`, returning the request to
    /// send. The caller must hand the service outcome to [`Workflow::complete`].
    pub fn start(&mut self) -> Result<AnalysisRequest, AnalysisError> {
        self.ensure_idle_controls()?;

        let file = match self.file.clone() {
            Some(file) if self.parameters.has_floor_level() => file,
            _ => {
                self.fail(AnalysisError::Validation);
                return Err(AnalysisError::Validation);
            }
        };

        info!(
            file = file.name(),
            floor_level = %self.parameters.floor_level,
            "analysis submitted"
        );
        self.enter(WorkflowState::Submitting);
        Ok(AnalysisRequest {
            file,
            parameters: self.parameters.clone(),
        })
    }

    /// Finishes a submission: builds and emits the report on success, or
    /// records the failure. Returns the saved report's file name.
    pub fn complete(
        &mut self,
        outcome: Result<Value, ServiceError>,
        sink: &mut dyn DocumentSink,
    ) -> Result<String, AnalysisError> {
        if !matches!(self.state, WorkflowState::Submitting) {
            warn!(
                state = self.state.label(),
                "service outcome arrived with no submission in flight"
            );
            return Err(AnalysisError::NoSubmission);
        }

        match self.build_and_emit(outcome, sink) {
            Ok(file_name) => {
                info!(file = %file_name, "report saved");
                let notice = self.config.report_notice();
                self.enter(WorkflowState::ReportReady {
                    file_name: file_name.clone(),
                });
                self.schedule(TimerEvent::DismissNotice, notice);
                Ok(file_name)
            }
            Err(error) => {
                self.fail(error.clone());
                Err(error)
            }
        }
    }

    /// `start`, a blocking service call and `complete` in one step.
    pub fn submit(
        &mut self,
        service: &dyn AnalysisService,
        sink: &mut dyn DocumentSink,
    ) -> Result<String, AnalysisError> {
        let request = self.start()?;
        let outcome = service.analyze(&request);
        self.complete(outcome, sink)
    }

    /// Closes the current notice. The accepted file and form values stay.
    pub fn dismiss(&mut self) {
        if self.state.is_notice() {
            self.enter(WorkflowState::Idle);
        }
    }

    /// Fires every timer that is due. Returns true when the state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Some(timer) = self.timer {
            if self.clock.now() < timer.due {
                break;
            }
            self.timer = None;
            debug!(event = ?timer.event, state = self.state.label(), "timer fired");
            changed |= self.on_timer(timer.event);
        }
        changed
    }

    fn on_timer(&mut self, event: TimerEvent) -> bool {
        match event {
            TimerEvent::UploadFinished => {
                let state = std::mem::replace(&mut self.state, WorkflowState::Idle);
                let WorkflowState::Uploading { selection } = state else {
                    self.state = state;
                    return false;
                };
                info!(file = selection.name(), "upload finished");
                self.file = Some(selection);
                let notice = self.config.upload_notice();
                self.enter(WorkflowState::UploadSucceeded);
                self.schedule(TimerEvent::DismissNotice, notice);
                true
            }
            TimerEvent::DismissNotice => {
                if !self.state.is_notice() {
                    return false;
                }
                self.enter(WorkflowState::Idle);
                true
            }
        }
    }

    fn build_and_emit(
        &self,
        outcome: Result<Value, ServiceError>,
        sink: &mut dyn DocumentSink,
    ) -> Result<String, AnalysisError> {
        let body = outcome?;
        let file = self.file.as_ref().map(|f| f.name()).unwrap_or_default();
        let ctx = ReportContext {
            file_name: file,
            floor_level: &self.parameters.floor_level,
            generated_at: chrono::Local::now().naive_local(),
        };
        let rendered = render_response(&body, &ctx, &self.page_setup)?;
        debug!(
            elements = rendered.elements.len(),
            pages = rendered.document.page_count(),
            "report laid out"
        );

        let file_name = report_file_name(chrono::Utc::now().date_naive());
        sink.emit(&rendered.document, &file_name)?;
        Ok(file_name)
    }

    fn ensure_idle_controls(&self) -> Result<(), AnalysisError> {
        if self.state.is_busy() {
            debug!(state = self.state.label(), "request rejected while busy");
            return Err(AnalysisError::Busy);
        }
        Ok(())
    }

    fn fail(&mut self, error: AnalysisError) {
        warn!(%error, "workflow failed");
        let notice = self.config.error_notice();
        self.enter(WorkflowState::Failed { error });
        self.schedule(TimerEvent::DismissNotice, notice);
    }

    fn enter(&mut self, next: WorkflowState) {
        debug!(from = self.state.label(), to = next.label(), "transition");
        self.timer = None;
        self.state = next;
    }

    fn schedule(&mut self, event: TimerEvent, after: Duration) {
        self.timer = Some(Scheduled {
            event,
            due: self.clock.now() + after,
        });
    }
}
