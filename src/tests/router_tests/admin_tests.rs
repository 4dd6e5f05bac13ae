use crate::db::accounts::Role;
use crate::db::complaints::get_complaint;
use crate::domain::{NewComplaint, Reporter, Status};
use crate::errors::ServerError;
use crate::intake::submit_complaint;
use crate::responses::error_response;
use crate::router::{handle, AppState};
use crate::tests::utils::{form_body, init_test_app, signed_in};
use astra::Body;
use http::{Method, Request};

fn seed(state: &AppState) -> i64 {
    let request = NewComplaint {
        reporter: Reporter::Anonymous {
            name: None,
            contact: "555-0100".into(),
        },
        title: "Flooded road".into(),
        description: "Water knee deep after the rain".into(),
        location: "Jalan Sudirman 12".into(),
        coordinates: None,
        media_ref: None,
    };
    submit_complaint(&state.db, request, 1_000).unwrap()
}

fn status_post(id: i64, pairs: &[(&str, &str)], cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(format!("/admin/complaints/{id}/status"))
        .header("Content-Type", "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header("Cookie", cookie);
    }
    builder.body(form_body(pairs)).unwrap()
}

fn stored_status(state: &AppState, id: i64) -> (Status, i64, Option<String>) {
    let c = state
        .db
        .with_conn(|conn| get_complaint(conn, id))
        .unwrap()
        .unwrap();
    (c.status, c.revision, c.admin_response)
}

#[test]
fn admin_moves_complaint_and_is_redirected() {
    let (_dir, state) = init_test_app();
    let id = seed(&state);
    let (_, cookie) = signed_in(&state.db, "siti", Role::Admin);

    let req = status_post(
        id,
        &[
            ("status", "processing"),
            ("admin_response", "Crew on the way"),
            ("revision", "0"),
        ],
        Some(cookie.as_str()),
    );
    let resp = handle(req, &state).expect("Handler failed");

    assert_eq!(resp.status(), 303);
    assert_eq!(
        resp.headers().get("Location").unwrap().to_str().unwrap(),
        format!("/complaints/{id}")
    );
    assert_eq!(
        stored_status(&state, id),
        (Status::Processing, 1, Some("Crew on the way".into()))
    );
}

#[test]
fn admin_can_complete_straight_from_received() {
    let (_dir, state) = init_test_app();
    let id = seed(&state);
    let (_, cookie) = signed_in(&state.db, "siti", Role::Admin);

    let req = status_post(id, &[("status", "Completed")], Some(cookie.as_str()));
    handle(req, &state).expect("Handler failed");
    assert_eq!(stored_status(&state, id).0, Status::Completed);
}

#[test]
fn stale_revision_is_a_conflict() {
    let (_dir, state) = init_test_app();
    let id = seed(&state);
    let (_, cookie) = signed_in(&state.db, "siti", Role::Admin);

    handle(
        status_post(id, &[("status", "Processing"), ("revision", "0")], Some(cookie.as_str())),
        &state,
    )
    .unwrap();

    let err = handle(
        status_post(id, &[("status", "Rejected"), ("revision", "0")], Some(cookie.as_str())),
        &state,
    )
    .unwrap_err();
    assert!(matches!(err, ServerError::Conflict(_)));
    assert_eq!(error_response(err).status(), 409);
    assert_eq!(stored_status(&state, id).0, Status::Processing);
}

#[test]
fn reopening_a_rejected_complaint_is_unprocessable() {
    let (_dir, state) = init_test_app();
    let id = seed(&state);
    let (_, cookie) = signed_in(&state.db, "siti", Role::Admin);

    handle(status_post(id, &[("status", "Rejected")], Some(cookie.as_str())), &state).unwrap();
    let err = handle(status_post(id, &[("status", "Processing")], Some(cookie.as_str())), &state)
        .unwrap_err();
    assert!(matches!(err, ServerError::Unprocessable(_)));
    assert_eq!(stored_status(&state, id).0, Status::Rejected);
}

#[test]
fn unknown_status_is_a_bad_request() {
    let (_dir, state) = init_test_app();
    let id = seed(&state);
    let (_, cookie) = signed_in(&state.db, "siti", Role::Admin);

    let err = handle(status_post(id, &[("status", "Archived")], Some(cookie.as_str())), &state)
        .unwrap_err();
    assert!(matches!(err, ServerError::BadRequest(_)));
}

#[test]
fn anonymous_visitor_is_unauthorized() {
    let (_dir, state) = init_test_app();
    let id = seed(&state);

    let err = handle(status_post(id, &[("status", "Processing")], None), &state).unwrap_err();
    assert!(matches!(err, ServerError::Unauthorized(_)));
    assert_eq!(stored_status(&state, id).0, Status::Received);
}

#[test]
fn citizen_is_forbidden() {
    let (_dir, state) = init_test_app();
    let id = seed(&state);
    let (_, cookie) = signed_in(&state.db, "budi", Role::Citizen);

    let err = handle(status_post(id, &[("status", "Processing")], Some(cookie.as_str())), &state)
        .unwrap_err();
    assert!(matches!(err, ServerError::Forbidden));
    assert_eq!(stored_status(&state, id).0, Status::Received);
}

#[test]
fn missing_complaint_is_not_found() {
    let (_dir, state) = init_test_app();
    let (_, cookie) = signed_in(&state.db, "siti", Role::Admin);

    let err = handle(status_post(42, &[("status", "Processing")], Some(cookie.as_str())), &state)
        .unwrap_err();
    assert!(matches!(err, ServerError::NotFound));
}
