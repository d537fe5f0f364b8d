use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::reports::handlers::{
    comment_handler, handling_handler, image_handler, report_handler,
};
use crate::features::reports::services::{
    CommentService, HandlingService, ReportImageService, ReportService,
};

pub fn routes(
    reports: Arc<ReportService>,
    handling: Arc<HandlingService>,
    comments: Arc<CommentService>,
    images: Arc<ReportImageService>,
) -> Router {
    let report_routes = Router::new()
        .route("/api/reports", post(report_handler::create_report))
        .route("/api/reports/latest", get(report_handler::latest_reports))
        .route("/api/reports/mine", get(report_handler::my_reports))
        .route("/api/reports/user/{id}", get(report_handler::user_reports))
        .route(
            "/api/reports/handler/{id}",
            get(report_handler::handler_reports),
        )
        .route(
            "/api/reports/{id}",
            get(report_handler::get_report).put(report_handler::update_report),
        )
        .route(
            "/api/reports/{id}/categories",
            get(report_handler::list_categories).post(report_handler::assign_category),
        )
        .with_state(reports);

    let handling_routes = Router::new()
        .route(
            "/api/reports/{id}/verify",
            post(handling_handler::verify_report),
        )
        .route(
            "/api/reports/{id}/accept",
            post(handling_handler::accept_report),
        )
        .route(
            "/api/reports/{id}/resolve",
            post(handling_handler::resolve_report),
        )
        .route(
            "/api/reports/{id}/assignments",
            get(handling_handler::list_assignments),
        )
        .route(
            "/api/staff/assignments",
            get(handling_handler::my_assignments),
        )
        .route(
            "/api/staff/assignments/{id}",
            patch(handling_handler::update_progress),
        )
        .route(
            "/api/staff/resolutions",
            get(handling_handler::my_resolutions).post(handling_handler::create_resolution),
        )
        .route(
            "/api/staff/resolutions/{id}",
            get(handling_handler::get_resolution),
        )
        .with_state(handling);

    let comment_routes = Router::new()
        .route(
            "/api/reports/{id}/comments",
            get(comment_handler::list_comments).post(comment_handler::create_comment),
        )
        .with_state(comments);

    let image_routes = Router::new()
        .route(
            "/api/reports/{id}/images",
            get(image_handler::list_images).post(image_handler::upload_images),
        )
        .with_state(images);

    report_routes
        .merge(handling_routes)
        .merge(comment_routes)
        .merge(image_routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::{header, StatusCode};
    use axum_test::TestServer;
    use serde_json::json;
    use uuid::Uuid;

    use crate::core::error::Result;
    use crate::features::auth::Principal;
    use crate::features::reports::services::geocoding_service::{Coordinates, Geocoder};
    use crate::modules::storage::LocalStorage;
    use crate::shared::test_helpers::{guest, handler, lazy_pool, reporter, with_principal};

    struct NoGeocoder;

    #[async_trait]
    impl Geocoder for NoGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<Coordinates>> {
            Ok(None)
        }
    }

    fn server(principal: Principal) -> TestServer {
        let pool = lazy_pool();
        let router = routes(
            Arc::new(ReportService::new(pool.clone(), Arc::new(NoGeocoder))),
            Arc::new(HandlingService::new(pool.clone())),
            Arc::new(CommentService::new(pool.clone())),
            Arc::new(ReportImageService::new(
                pool,
                Arc::new(LocalStorage::new(1024)),
                std::env::temp_dir(),
            )),
        );
        TestServer::new(with_principal(router, principal)).unwrap()
    }

    fn report_body() -> serde_json::Value {
        json!({
            "location": "Gikomba market, Nairobi",
            "waste_type": "Plastic",
            "description": "Heap of plastic bags blocking the drainage",
            "severity": "high",
            "period_of_occurrence": "Last 1 week"
        })
    }

    #[tokio::test]
    async fn test_anonymous_submission_redirects_to_user_login() {
        let response = server(Principal::Anonymous)
            .post("/api/reports")
            .json(&report_body())
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        let location = response.header(header::LOCATION);
        assert_eq!(
            location.to_str().unwrap(),
            "/api/auth/user/login?next=%2Fapi%2Freports"
        );
    }

    #[tokio::test]
    async fn test_unconfirmed_citizen_cannot_submit() {
        server(guest())
            .post("/api/reports")
            .json(&report_body())
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_blank_location_is_rejected() {
        let mut body = report_body();
        body["location"] = json!("   ");

        let response = server(reporter()).post("/api/reports").json(&body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let payload: serde_json::Value = response.json();
        assert_eq!(payload["success"], json!(false));
    }

    #[tokio::test]
    async fn test_half_coordinates_are_rejected() {
        let mut body = report_body();
        body["latitude"] = json!(-1.28);

        server(reporter())
            .post("/api/reports")
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_citizen_cannot_verify() {
        server(reporter())
            .post(&format!("/api/reports/{}/verify", Uuid::new_v4()))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unapproved_handler_cannot_accept() {
        server(handler(false))
            .post(&format!("/api/reports/{}/accept", Uuid::new_v4()))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_resolve_requires_exactly_one_resolution_source() {
        server(handler(true))
            .post(&format!("/api/reports/{}/resolve", Uuid::new_v4()))
            .json(&json!({}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_progress_update_is_rejected() {
        server(handler(true))
            .patch(&format!("/api/staff/assignments/{}", Uuid::new_v4()))
            .json(&json!({}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_handlers_cannot_comment() {
        server(handler(true))
            .post(&format!("/api/reports/{}/comments", Uuid::new_v4()))
            .json(&json!({ "body": "On my way" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_anonymous_staff_dashboard_redirects_to_handler_login() {
        let response = server(Principal::Anonymous)
            .get("/api/staff/assignments")
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert!(response
            .header(header::LOCATION)
            .to_str()
            .unwrap()
            .starts_with("/api/auth/handler/login"));
    }
}
