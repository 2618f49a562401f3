use bimreport_core::error::SchemaError;
use bimreport_core::schema::parse_results;
use serde_json::json;

#[test]
fn accepts_backend_shaped_response() {
    let body = json!({
        "results": [
            {
                "element_id": "C-01",
                "tilt_class": 1,
                "tilt_ratio": 0.012,
                "model_version": "v1.0.0",
                "deviation_tolerance": 2.0,
                "leaning_status": "within tolerance",
                "column_height_mm": 3000.0,
                "source_file": null,
                "extra_field": [1, 2, 3]
            },
            { "tilt_ratio": "0.2" }
        ],
        "count": 2,
        "parameters": { "deviation_tolerance": 2.0 }
    });

    let records = parse_results(&body).expect("valid response");
    assert_eq!(2, records.len());
    assert_eq!(Some(&json!("C-01")), records[0].get("element_id"));
}

#[test]
fn empty_results_are_fine() {
    let records = parse_results(&json!({ "results": [] })).expect("valid response");
    assert!(records.is_empty());
}

#[test]
fn rejects_missing_results() {
    assert_eq!(
        Err(SchemaError::MissingResults),
        parse_results(&json!({ "count": 0 }))
    );
    assert_eq!(
        Err(SchemaError::MissingResults),
        parse_results(&json!({ "results": "none" }))
    );
    assert_eq!(Err(SchemaError::NotAnObject), parse_results(&json!([])));
}

#[test]
fn rejects_non_object_records() {
    assert_eq!(
        Err(SchemaError::RecordNotAnObject { index: 1 }),
        parse_results(&json!({ "results": [{}, 7] }))
    );
}

#[test]
fn rejects_mistyped_fields() {
    let err = parse_results(&json!({
        "results": [{ "element_id": "C-01" }, { "column_height_mm": "3000" }]
    }))
    .expect_err("height must be numeric");
    assert_eq!(
        SchemaError::InvalidField {
            index: 1,
            field: "column_height_mm".to_string(),
            expected: "a number",
        },
        err
    );

    let err = parse_results(&json!({ "results": [{ "tilt_class": { "label": 1 } }] }))
        .expect_err("tilt class must be scalar");
    assert!(err.to_string().contains("tilt_class"));
}
