use bimreport_core::error::{AnalysisError, EmissionError, SchemaError, ServiceError};
use bimreport_core::layout::{DocumentSink, ReportDocument};
use bimreport_core::settings::WorkflowConfig;
use bimreport_core::upload::UploadSelection;
use bimreport_core::workflow::{
    AnalysisRequest, AnalysisService, ManualClock, Workflow, WorkflowState,
};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::time::Duration;

#[derive(Default)]
struct MemorySink {
    saved: Vec<(String, ReportDocument)>,
    fail_with: Option<String>,
}

impl DocumentSink for MemorySink {
    fn emit(&mut self, document: &ReportDocument, file_name: &str) -> Result<(), EmissionError> {
        if let Some(reason) = &self.fail_with {
            return Err(EmissionError::new(file_name, reason));
        }
        self.saved.push((file_name.to_string(), document.clone()));
        Ok(())
    }
}

struct StubService {
    reply: Result<Value, ServiceError>,
    requests: RefCell<Vec<AnalysisRequest>>,
}

impl StubService {
    fn replying(reply: Result<Value, ServiceError>) -> Self {
        Self {
            reply,
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl AnalysisService for StubService {
    fn analyze(&self, request: &AnalysisRequest) -> Result<Value, ServiceError> {
        self.requests.borrow_mut().push(request.clone());
        self.reply.clone()
    }
}

fn ifc_file() -> UploadSelection {
    UploadSelection::new("tower.IFC", b"ISO-10303-21;".to_vec())
}

fn workflow() -> (Workflow<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    (
        Workflow::with_clock(WorkflowConfig::default(), clock.clone()),
        clock,
    )
}

/// Selects a file and lets the simulated upload finish.
fn uploaded(file: UploadSelection) -> (Workflow<ManualClock>, ManualClock) {
    let (mut wf, clock) = workflow();
    wf.select(file).expect("accepted extension");
    clock.advance(Duration::from_millis(2000));
    assert!(wf.poll());
    (wf, clock)
}

#[test]
fn unsupported_extension_fails_without_uploading() {
    let (mut wf, clock) = workflow();
    let err = wf
        .select(UploadSelection::new("plan.dwg", b"AC1027".to_vec()))
        .expect_err("dwg is not accepted");

    assert_eq!("FILE FORMAT UNSUPPORTED!", err.to_string());
    assert!(matches!(
        wf.state(),
        WorkflowState::Failed {
            error: AnalysisError::UnsupportedFormat { .. }
        }
    ));
    assert!(wf.accepted_file().is_none());

    clock.advance(Duration::from_secs(10));
    wf.poll();
    assert_eq!(&WorkflowState::Idle, wf.state());
    assert!(wf.accepted_file().is_none());
}

#[test]
fn upload_completes_after_latency_and_notice_clears() {
    let (mut wf, clock) = workflow();
    wf.select(ifc_file()).expect("accepted extension");
    assert_eq!("uploading", wf.state().label());
    assert!(!wf.controls_enabled());

    clock.advance(Duration::from_millis(1999));
    assert!(!wf.poll());
    assert_eq!("uploading", wf.state().label());

    clock.advance(Duration::from_millis(1));
    assert!(wf.poll());
    assert_eq!(&WorkflowState::UploadSucceeded, wf.state());
    assert_eq!(Some("tower.IFC"), wf.accepted_file().map(|f| f.name()));

    clock.advance(Duration::from_millis(2000));
    assert!(wf.poll());
    assert_eq!(&WorkflowState::Idle, wf.state());
    assert_eq!(Some("tower.IFC"), wf.accepted_file().map(|f| f.name()));
}

#[test]
fn busy_workflow_rejects_new_actions() {
    let (mut wf, _clock) = workflow();
    wf.select(ifc_file()).expect("accepted extension");

    assert_eq!(Err(AnalysisError::Busy), wf.select(ifc_file()));
    assert_eq!(Err(AnalysisError::Busy), wf.start().map(|_| ()));
    assert_eq!(Err(AnalysisError::Busy), wf.set_floor_level("Basement"));
    assert_eq!("uploading", wf.state().label());
}

#[test]
fn start_without_floor_level_fails_and_keeps_form() {
    let (mut wf, _clock) = uploaded(ifc_file());
    wf.set_deviation_tolerance("±2mm").expect("idle controls");
    let before = wf.parameters().clone();

    let err = wf.start().expect_err("floor level missing");
    assert_eq!("Please upload a file and select floor level!", err.to_string());
    assert_eq!(
        &WorkflowState::Failed {
            error: AnalysisError::Validation
        },
        wf.state()
    );
    assert_eq!(&before, wf.parameters());
    assert!(wf.accepted_file().is_some());
}

#[test]
fn start_without_file_fails() {
    let (mut wf, _clock) = workflow();
    wf.set_floor_level("Ground Floor").expect("idle controls");
    assert_eq!(Err(AnalysisError::Validation), wf.start().map(|_| ()));
}

#[test]
fn end_to_end_report_is_emitted() {
    let (mut wf, clock) = uploaded(ifc_file());
    wf.set_floor_level("Ground Floor").expect("idle controls");
    wf.set_deviation_tolerance("±2mm").expect("idle controls");

    let service = StubService::replying(Ok(json!({
        "results": [{ "tilt_ratio": 0.2, "column_height_mm": 2500 }]
    })));
    let mut sink = MemorySink::default();

    let file_name = wf.submit(&service, &mut sink).expect("report saved");
    assert!(file_name.starts_with("BIM_Analysis_Report_"));
    assert!(file_name.ends_with(".pdf"));
    assert_eq!(
        &WorkflowState::ReportReady {
            file_name: file_name.clone()
        },
        wf.state()
    );

    let requests = service.requests.borrow();
    assert_eq!(1, requests.len());
    assert_eq!("tower.IFC", requests[0].file.name());
    assert_eq!(
        vec![("deviation_tolerance", "±2mm")],
        requests[0].parameters.optional_fields()
    );

    assert_eq!(1, sink.saved.len());
    let (saved_name, document) = &sink.saved[0];
    assert_eq!(&file_name, saved_name);
    assert!(document.contains_line("Columns Detected: 1"));
    assert!(document.contains_line("Average Column Height: 2500.00 mm"));
    assert!(document.contains_line("Tilt Ratio: 0.200"));
    assert!(document.contains_line("Floor Level: Ground Floor"));
    assert!(document.contains_line("File: tower.IFC"));

    clock.advance(Duration::from_millis(3000));
    assert!(wf.poll());
    assert_eq!(&WorkflowState::Idle, wf.state());
    assert_eq!("Ground Floor", wf.parameters().floor_level);
}

#[test]
fn start_hands_back_a_request_and_waits() {
    let (mut wf, _clock) = uploaded(ifc_file());
    wf.set_floor_level("Basement").expect("idle controls");

    let request = wf.start().expect("valid form");
    assert_eq!("Basement", request.parameters.floor_level);
    assert_eq!(&WorkflowState::Submitting, wf.state());
    assert!(!wf.controls_enabled());
    assert_eq!(Err(AnalysisError::Busy), wf.start().map(|_| ()));

    let mut sink = MemorySink::default();
    wf.complete(Ok(json!({ "results": [] })), &mut sink)
        .expect("report saved");
    assert!(sink.saved[0].1.contains_line("Compliance Status: NO DATA"));
}

#[test]
fn service_status_error_is_surfaced() {
    let (mut wf, clock) = uploaded(ifc_file());
    wf.set_floor_level("Ground Floor").expect("idle controls");

    let service = StubService::replying(Err(ServiceError::Status(500)));
    let mut sink = MemorySink::default();
    let err = wf.submit(&service, &mut sink).expect_err("backend failed");

    assert_eq!("Backend error: 500", err.to_string());
    assert!(sink.saved.is_empty());
    assert_eq!("failed", wf.state().label());

    wf.dismiss();
    assert_eq!(&WorkflowState::Idle, wf.state());
    assert!(wf.accepted_file().is_some());

    clock.advance(Duration::from_secs(30));
    assert!(!wf.poll());
}

#[test]
fn transport_error_text_is_surfaced() {
    let (mut wf, _clock) = uploaded(ifc_file());
    wf.set_floor_level("Ground Floor").expect("idle controls");

    let service = StubService::replying(Err(ServiceError::Transport(
        "error sending request: connection refused".to_string(),
    )));
    let err = wf
        .submit(&service, &mut MemorySink::default())
        .expect_err("backend unreachable");
    assert_eq!("error sending request: connection refused", err.to_string());
}

#[test]
fn malformed_response_is_a_schema_error() {
    let (mut wf, _clock) = uploaded(ifc_file());
    wf.set_floor_level("Ground Floor").expect("idle controls");

    let service = StubService::replying(Ok(json!({ "detail": "not found" })));
    let err = wf
        .submit(&service, &mut MemorySink::default())
        .expect_err("no results array");
    assert_eq!(AnalysisError::Schema(SchemaError::MissingResults), err);
}

#[test]
fn emission_failure_fails_the_attempt() {
    let (mut wf, _clock) = uploaded(ifc_file());
    wf.set_floor_level("Ground Floor").expect("idle controls");

    let service = StubService::replying(Ok(json!({ "results": [] })));
    let mut sink = MemorySink {
        fail_with: Some("disk full".to_string()),
        ..MemorySink::default()
    };
    let err = wf.submit(&service, &mut sink).expect_err("save failed");
    assert!(matches!(err, AnalysisError::Emission(_)));
    assert!(err.to_string().contains("disk full"));
    assert_eq!("failed", wf.state().label());
}

#[test]
fn error_notice_clears_on_its_own() {
    let (mut wf, clock) = workflow();
    wf.start().expect_err("nothing uploaded");

    clock.advance(Duration::from_millis(4999));
    assert!(!wf.poll());
    clock.advance(Duration::from_millis(1));
    assert!(wf.poll());
    assert_eq!(&WorkflowState::Idle, wf.state());
}

#[test]
fn dismiss_supersedes_pending_timer() {
    let (mut wf, clock) = uploaded(ifc_file());
    assert_eq!(&WorkflowState::UploadSucceeded, wf.state());
    wf.dismiss();
    assert!(wf.next_deadline().is_none());

    wf.set_floor_level("Mezzanine").expect("idle controls");
    wf.start().expect("valid form");
    clock.advance(Duration::from_secs(5));
    assert!(!wf.poll());
    assert_eq!(&WorkflowState::Submitting, wf.state());
}

#[test]
fn completion_without_submission_is_rejected() {
    let (mut wf, _clock) = workflow();
    let result = wf.complete(Ok(json!({ "results": [] })), &mut MemorySink::default());
    assert_eq!(Err(AnalysisError::NoSubmission), result);
    assert_eq!(&WorkflowState::Idle, wf.state());
}

#[test]
fn reselecting_after_failure_starts_a_new_upload() {
    let (mut wf, _clock) = workflow();
    let _ = wf.select(UploadSelection::new("notes.txt", Vec::<u8>::new()));
    assert_eq!("failed", wf.state().label());

    wf.select(UploadSelection::new("bridge.stp", b"data".to_vec()))
        .expect("accepted extension");
    assert_eq!("uploading", wf.state().label());
}
