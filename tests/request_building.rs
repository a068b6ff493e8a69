//! Behaviour tests for report request composition.

mod common;

use serde_json::json;
use tunerep_core::{
    Action, EndpointCapabilities, EndpointDefinition, ExportFormat, FieldsInput, ReportQuery,
    ReportingError, ValidationError,
};

use common::{endpoint, envelope, query_pairs, query_value, ScriptedHttpClient};

const STATS: &str = "advertiser/stats";

fn plain() -> EndpointCapabilities {
    EndpointCapabilities::default()
}

fn cohort() -> EndpointCapabilities {
    EndpointCapabilities {
        supports_cohort: true,
        ..EndpointCapabilities::default()
    }
}

fn dated() -> ReportQuery {
    ReportQuery::new().dates("2024-01-01", "2024-01-02")
}

#[tokio::test]
async fn sdk_suppression_is_conjoined_with_the_caller_filter() {
    let http = ScriptedHttpClient::new([envelope(json!(12))]);
    let endpoint = endpoint(http.clone(), EndpointDefinition::actuals());

    let count = endpoint
        .count(&dated().filter("(publisher_id > 0)"))
        .await
        .expect("count succeeds");

    assert_eq!(count, 12);
    let urls = http.recorded_urls();
    assert!(urls[0].starts_with("https://reports.test/v2/advertiser/stats/count.json?api_key=test-key&"));
    assert_eq!(
        query_value(&urls[0], "filter").as_deref(),
        Some(
            "((publisher_id > 0)) AND ((debug_mode=0 OR debug_mode is NULL) AND (test_profile_id=0 OR test_profile_id IS NULL))"
        )
    );
}

#[test]
fn one_sided_filters_are_still_parenthesized() {
    let suppressing = EndpointDefinition::actuals().capabilities;
    let request = dated()
        .build(Action::Count, STATS, &suppressing)
        .expect("valid request");
    assert_eq!(
        request.params.text("filter"),
        Some("((debug_mode=0 OR debug_mode is NULL) AND (test_profile_id=0 OR test_profile_id IS NULL))")
    );

    let request = dated()
        .filter("publisher_id > 0")
        .build(Action::Count, STATS, &plain())
        .expect("valid request");
    assert_eq!(request.params.text("filter"), Some("(publisher_id > 0)"));

    let request = dated().build(Action::Count, STATS, &plain()).expect("valid request");
    assert!(!request.params.contains("filter"));
}

#[test]
fn dates_are_required_and_strictly_formatted() {
    let error = ReportQuery::new()
        .end_date("2024-01-02")
        .build(Action::Find, STATS, &plain())
        .expect_err("missing start");
    assert_eq!(error, ValidationError::MissingParameter { name: "start_date" });

    let error = ReportQuery::new()
        .dates("2024-01-01", "01/02/2024")
        .build(Action::Find, STATS, &plain())
        .expect_err("bad end");
    assert!(matches!(error, ValidationError::InvalidDate { field: "end_date", .. }));

    let request = ReportQuery::new()
        .dates("2024-01-01 00:00:00", "2024-01-01 23:59:59")
        .build(Action::Find, STATS, &plain())
        .expect("date-times are accepted");
    assert_eq!(request.params.text("end_date"), Some("2024-01-01 23:59:59"));
}

#[test]
fn field_lists_are_normalized() {
    let request = dated()
        .fields(" publisher_id , site.name,, clicks ")
        .group(FieldsInput::from(vec!["publisher_id", " site_id"]))
        .build(Action::Find, STATS, &plain())
        .expect("valid request");

    let pairs = query_pairs(&format!("?{}", request.params.to_query_string()));
    assert!(pairs.contains(&("fields".into(), "publisher_id,site.name,clicks".into())));
    assert!(pairs.contains(&("group".into(), "publisher_id,site_id".into())));

    let error = dated()
        .fields(" , ,")
        .build(Action::Find, STATS, &plain())
        .expect_err("empty list");
    assert_eq!(error, ValidationError::EmptyFieldList { param: "fields" });
}

#[test]
fn sort_limit_and_page_are_validated() {
    let request = dated()
        .sort("created", "desc")
        .sort("id", "ASC")
        .limit(50)
        .page(2)
        .build(Action::Find, STATS, &plain())
        .expect("valid request");

    let pairs = query_pairs(&format!("?{}", request.params.to_query_string()));
    let sort: Vec<_> = pairs
        .iter()
        .filter(|(name, _)| name.starts_with("sort["))
        .cloned()
        .collect();
    assert_eq!(
        sort,
        vec![
            ("sort[created]".to_owned(), "DESC".to_owned()),
            ("sort[id]".to_owned(), "ASC".to_owned()),
        ]
    );
    assert!(pairs.contains(&("limit".into(), "50".into())));
    assert!(pairs.contains(&("page".into(), "2".into())));

    let error = dated()
        .sort("created", "down")
        .build(Action::Find, STATS, &plain())
        .expect_err("bad direction");
    assert!(matches!(error, ValidationError::InvalidSortDirection { .. }));

    let error = dated()
        .limit(-1)
        .build(Action::Find, STATS, &plain())
        .expect_err("negative limit");
    assert_eq!(
        error,
        ValidationError::NegativeValue {
            field: "limit",
            value: -1
        }
    );
}

#[test]
fn timestamp_requires_endpoint_support() {
    let error = dated()
        .timestamp("hour")
        .build(Action::Find, "advertiser/stats/clicks", &plain())
        .expect_err("unsupported");
    assert!(matches!(
        error,
        ValidationError::UnsupportedParameter { name: "timestamp", .. }
    ));

    let supported = EndpointDefinition::actuals().capabilities;
    let request = dated()
        .timestamp("DateHour")
        .timezone("America/Los_Angeles")
        .build(Action::Find, STATS, &supported)
        .expect("supported");
    assert_eq!(request.params.text("timestamp"), Some("datehour"));
    assert_eq!(
        request.params.text("response_timezone"),
        Some("America/Los_Angeles")
    );

    let error = dated()
        .timestamp("minute")
        .build(Action::Find, STATS, &supported)
        .expect_err("bad granularity");
    assert!(matches!(error, ValidationError::InvalidTimestampGranularity { .. }));
}

#[test]
fn cohort_settings_follow_endpoint_capabilities() {
    let error = dated()
        .cohort_type("click")
        .build(Action::Find, STATS, &plain())
        .expect_err("not a cohort endpoint");
    assert!(matches!(
        error,
        ValidationError::UnsupportedParameter { name: "cohort_type", .. }
    ));

    let error = dated()
        .cohort_type("click")
        .build(Action::Find, "advertiser/stats/ltv", &cohort())
        .expect_err("interval missing");
    assert_eq!(
        error,
        ValidationError::MissingParameter {
            name: "cohort_interval"
        }
    );

    let request = dated()
        .cohort_type("install")
        .cohort_interval("year_week")
        .aggregation_type("cumulative")
        .build(Action::ExportEnqueue, "advertiser/stats/ltv", &cohort())
        .expect("valid cohort export");
    assert_eq!(request.params.text("cohort_type"), Some("install"));
    assert_eq!(request.params.text("cohort_interval"), Some("year_week"));
    assert_eq!(request.params.text("aggregation_type"), Some("cumulative"));
}

#[test]
fn status_requires_only_a_job_id() {
    let error = ReportQuery::new()
        .job_id("  ")
        .build(Action::Status, STATS, &plain())
        .expect_err("blank job id");
    assert_eq!(error, ValidationError::EmptyJobId);

    let request = ReportQuery::new()
        .job_id("job-9")
        .build(Action::Status, STATS, &plain())
        .expect("valid status");
    assert_eq!(request.params.len(), 1);
}

#[tokio::test]
async fn find_without_fields_uses_the_recommended_list() {
    let http = ScriptedHttpClient::new([envelope(json!([{"publisher_id": 1}]))]);
    let endpoint = endpoint(http.clone(), EndpointDefinition::clicks());

    let envelope = endpoint.find(&dated()).await.expect("find succeeds");

    assert_eq!(envelope.payload(), &json!([{"publisher_id": 1}]));
    let urls = http.recorded_urls();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].contains("/advertiser/stats/clicks/find.json?"));
    assert_eq!(
        query_value(&urls[0], "fields"),
        Some(EndpointDefinition::clicks().recommended_fields.join(","))
    );
}

#[tokio::test]
async fn find_without_fields_or_recommendations_uses_default_fields() {
    let describe = envelope(json!([{"modelName": "Install", "fields": [
        {"name": "id", "fieldDefault": true},
        {"name": "publisher_id", "fieldDefault": true},
        {"name": "installs", "fieldDefault": false},
    ]}]));
    let http = ScriptedHttpClient::new([describe, envelope(json!([]))]);
    let endpoint = endpoint(
        http.clone(),
        EndpointDefinition::new("advertiser/stats/installs", plain()),
    );

    endpoint.find(&dated()).await.expect("find succeeds");

    let urls = http.recorded_urls();
    assert_eq!(urls.len(), 2);
    assert!(urls[0].contains("/apidoc/get_controllers.json?"));
    assert_eq!(
        query_value(&urls[1], "fields").as_deref(),
        Some("id,publisher_id,publisher.name")
    );
}

#[tokio::test]
async fn invalid_input_never_reaches_the_network() {
    let http = ScriptedHttpClient::empty();
    let endpoint = endpoint(http.clone(), EndpointDefinition::actuals());

    let error = endpoint
        .export(&dated().filter("a = 1 ;"), ExportFormat::Json)
        .await
        .expect_err("invalid filter");

    assert!(matches!(error, ReportingError::InvalidArgument(_)));
    assert_eq!(http.request_count(), 0);
}

#[tokio::test]
async fn invalid_input_is_rejected_before_field_discovery() {
    let http = ScriptedHttpClient::empty();
    let endpoint = endpoint(
        http.clone(),
        EndpointDefinition::new("advertiser/stats/installs", plain()),
    );
    let bad = ReportQuery::new()
        .dates("2024/01/01", "2024-01-02")
        .filter("(a = 1");

    let error = endpoint.find(&bad).await.expect_err("invalid date");
    assert!(matches!(error, ReportingError::InvalidArgument(_)));

    let error = endpoint
        .export(&dated().filter("(a = 1"), ExportFormat::Csv)
        .await
        .expect_err("unbalanced filter");
    assert!(matches!(error, ReportingError::InvalidArgument(_)));

    assert_eq!(http.request_count(), 0);
}

#[tokio::test]
async fn service_errors_in_the_envelope_are_reported() {
    let failing = tunerep_core::HttpResponse::ok_json(
        json!({"status_code": 400, "data": null, "errors": [{"message": "Invalid field 'foo'"}]})
            .to_string(),
    );
    let http = ScriptedHttpClient::new([failing]);
    let endpoint = endpoint(http, EndpointDefinition::actuals());

    let error = endpoint
        .count(&dated().fields("foo"))
        .await
        .expect_err("service error");

    assert!(matches!(
        error,
        ReportingError::Service { status: 400, ref message, .. } if message == "Invalid field 'foo'"
    ));
}
