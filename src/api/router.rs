//! Intake API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::pipeline::IntakeContext;

/// Build the intake router: `POST /intake`, `GET /healthz`.
pub fn intake_router(intake: Arc<IntakeContext>) -> Router {
    let ctx = ApiContext::new(intake);

    Router::new()
        .route("/intake", post(endpoints::intake::submit))
        .route("/healthz", get(endpoints::health::check))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::pipeline::mapping::{MappedIntake, MapperError};
    use crate::pipeline::ParserRegistry;
    use crate::models::{Clinical, Gcim, Meta, Patient, Visit};

    const SAMPLE_BUNDLE: &str =
        include_str!("../pipeline/mapping/fixtures/epic_sample_bundle.json");

    fn test_router() -> Router {
        intake_router(Arc::new(IntakeContext::with_default_parsers()))
    }

    fn post_intake(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn healthz_returns_ok() {
        let request = Request::builder()
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(test_router(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn sample_bundle_accepted_with_default_query() {
        let (status, json) = send(test_router(), post_intake("/intake", SAMPLE_BUNDLE)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["gcim"]["patient"]["id"], "eAB3mDIBBcyUKviyzrxsnAw3");
        assert_eq!(json["gcim"]["intent"], "claim");
        assert_eq!(json["gcim"]["clinical"]["cpt_codes"], json!(["99396"]));
        assert_eq!(json["gcim"]["meta"]["source_ehr"], "Epic");
    }

    #[tokio::test]
    async fn explicit_query_is_case_insensitive() {
        let (status, _) = send(
            test_router(),
            post_intake("/intake?source_ehr=epic&content_type=fhir", SAMPLE_BUNDLE),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn body_without_json_content_type_accepted() {
        let request = Request::builder()
            .method("POST")
            .uri("/intake")
            .body(Body::from(SAMPLE_BUNDLE))
            .unwrap();
        let (status, _) = send(test_router(), request).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_source_returns_no_parser() {
        let (status, json) = send(
            test_router(),
            post_intake("/intake?source_ehr=Unknown&content_type=XYZ", "{}"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "NO_PARSER");
        assert_eq!(json["error"]["message"], "No parser for (Unknown, XYZ)");
    }

    #[tokio::test]
    async fn malformed_bundle_returns_parser_error() {
        let (status, json) =
            send(test_router(), post_intake("/intake", r#"{"entry": "oops"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "PARSER_ERROR");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Parser error: "));
    }

    #[tokio::test]
    async fn procedure_without_coding_entries_returns_parser_error() {
        let body = json!({"entry": [
            {"resource": {"resourceType": "Patient", "id": "p1"}},
            {"resource": {"resourceType": "Procedure", "code": {"coding": []}}}
        ]});
        let (status, json) =
            send(test_router(), post_intake("/intake", body.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "PARSER_ERROR");
    }

    #[tokio::test]
    async fn non_json_body_returns_bad_request() {
        let (status, json) = send(test_router(), post_intake("/intake", "not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn invalid_intake_returns_422_with_errors() {
        let (status, json) =
            send(test_router(), post_intake("/intake", r#"{"entry": []}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            json,
            json!({"errors": [
                "patient.id is required",
                "at least one ICD or CPT code is required"
            ]})
        );
    }

    fn future_visit_mapper(_: &Value) -> Result<MappedIntake, MapperError> {
        let gcim = Gcim::new(Patient::with_id("p"))
            .with_visit(Visit {
                date: chrono::NaiveDate::from_ymd_opt(2999, 1, 1),
                ..Visit::default()
            })
            .with_clinical(Clinical::from_codes(["I10"], ["9921"]))
            .with_meta(Meta::new("Test", "provider"));
        Ok(MappedIntake::new(gcim, None))
    }

    #[tokio::test]
    async fn registered_mapper_errors_reported_in_rule_order() {
        let mut registry = ParserRegistry::new();
        registry.register("Test", "JSON", future_visit_mapper);
        let app = intake_router(Arc::new(IntakeContext::new(registry)));

        let (status, json) = send(
            app,
            post_intake("/intake?source_ehr=Test&content_type=JSON", "null"),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            json["errors"],
            json!([
                "invalid ICD-10 code: I10",
                "invalid CPT code: 9921",
                "visit.date cannot be in the future"
            ])
        );
    }
}
