use crate::admin::{update_complaint, AdminUpdate};
use crate::db::accounts::Role;
use crate::domain::{NewComplaint, Reporter, Status};
use crate::errors::ServerError;
use crate::intake::submit_complaint;
use crate::router::handle;
use crate::tests::utils::{body_string, init_test_app, signed_in};
use astra::Body;
use http::{Method, Request};

fn seed(state: &crate::router::AppState) -> i64 {
    let request = NewComplaint {
        reporter: Reporter::Anonymous {
            name: None,
            contact: "555-0100".into(),
        },
        title: "Broken <lamp>".into(),
        description: "Street lamp out since Monday".into(),
        location: "Jalan Merdeka 4".into(),
        coordinates: None,
        media_ref: None,
    };
    submit_complaint(&state.db, request, 1_700_000_000).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("Cookie", cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[test]
fn status_page_shows_progress_and_response() {
    let (_dir, state) = init_test_app();
    let id = seed(&state);
    let update = AdminUpdate {
        status: Some(Status::Processing),
        admin_response: Some(Some("Crew scheduled for Friday".into())),
        revision: None,
    };
    update_complaint(&state.db, id, &update, 1_700_000_600).unwrap();

    let resp = handle(get(&format!("/complaints/{id}"), None), &state).expect("Handler failed");
    assert_eq!(resp.status(), 200);

    let body = body_string(resp);
    assert!(body.contains("Broken &lt;lamp&gt;"));
    assert!(body.contains("Processing"));
    assert!(body.contains("Crew scheduled for Friday"));
    assert!(body.contains("2023-11-14"));
    // The public page never offers the staff form.
    assert!(!body.contains("/admin/complaints/"));
}

#[test]
fn admins_see_the_update_form_with_revision() {
    let (_dir, state) = init_test_app();
    let id = seed(&state);
    let (_, cookie) = signed_in(&state.db, "siti", Role::Admin);

    let body = body_string(handle(get(&format!("/complaints/{id}"), Some(cookie.as_str())), &state).unwrap());
    assert!(body.contains(&format!("action=\"/admin/complaints/{id}/status\"")));
    assert!(body.contains("name=\"revision\" value=\"0\""));
    assert!(body.contains("<option value=\"Completed\">"));
}

#[test]
fn missing_complaint_is_not_found() {
    let (_dir, state) = init_test_app();
    assert!(matches!(
        handle(get("/complaints/999", None), &state).unwrap_err(),
        ServerError::NotFound
    ));
    assert!(matches!(
        handle(get("/complaints/abc", None), &state).unwrap_err(),
        ServerError::NotFound
    ));
}
