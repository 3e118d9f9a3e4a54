use super::body_json;
use crate::errors::ServerError;
use crate::responses::error_to_response;
use serde_json::json;

#[test]
fn errors_map_to_status_and_json_body() {
    let resp = error_to_response(&ServerError::Validation("Document ID is required to delete a report.".into()));
    assert_eq!(resp.status(), 400);
    assert_eq!(
        body_json(resp),
        json!({ "error": "Document ID is required to delete a report." })
    );

    let resp = error_to_response(&ServerError::NotFound);
    assert_eq!(resp.status(), 404);

    let resp = error_to_response(&ServerError::InternalError);
    assert_eq!(resp.status(), 500);
}

#[test]
fn store_details_are_not_leaked() {
    let resp = error_to_response(&ServerError::DbError("no such table: documents".into()));
    assert_eq!(resp.status(), 500);
    assert_eq!(body_json(resp), json!({ "error": "Database Error" }));
}
