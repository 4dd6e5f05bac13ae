use crate::db::accounts::Role;
use crate::db::complaints::get_complaint;
use crate::domain::{Reporter, Status};
use crate::errors::ServerError;
use crate::router::handle;
use crate::tests::utils::{body_string, form_body, init_test_app, signed_in};
use astra::Body;
use http::{Method, Request};

fn intake_request(pairs: &[(&str, &str)], cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/complaints")
        .header("Content-Type", "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header("Cookie", cookie);
    }
    builder.body(form_body(pairs)).unwrap()
}

#[test]
fn home_page_shows_the_form() {
    let (_dir, state) = init_test_app();
    let req = Request::builder()
        .method(Method::GET)
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let resp = handle(req, &state).expect("Handler failed");
    assert_eq!(resp.status(), 200);
    let body = body_string(resp);
    assert!(body.contains("action=\"/complaints\""));
    assert!(body.contains("reporter_contact"));
}

#[test]
fn anonymous_complaint_is_stored_as_received() {
    let (_dir, state) = init_test_app();
    let req = intake_request(
        &[
            ("title", "Pothole on Main"),
            ("description", "Deep hole next to the bus stop"),
            ("location", "Main Street 10"),
            ("latitude", "-6.2"),
            ("longitude", "106.8"),
            ("reporter_name", "Jane"),
            ("reporter_contact", "555-0100"),
        ],
        None,
    );

    let resp = handle(req, &state).expect("Handler failed");
    assert_eq!(resp.status(), 201);
    assert!(body_string(resp).contains("#1"));

    let c = state
        .db
        .with_conn(|conn| get_complaint(conn, 1))
        .unwrap()
        .expect("complaint stored");
    assert_eq!(c.status, Status::Received);
    assert!(!c.announced);
    assert_eq!(c.status_updated_at, c.created_at);
    assert_eq!(c.coordinates.map(|p| p.lat), Some(-6.2));
    assert_eq!(
        c.reporter,
        Reporter::Anonymous {
            name: Some("Jane".into()),
            contact: "555-0100".into()
        }
    );
}

#[test]
fn signed_in_citizen_reports_as_account() {
    let (_dir, state) = init_test_app();
    let (user_id, cookie) = signed_in(&state.db, "budi", Role::Citizen);

    let req = intake_request(
        &[
            ("title", "Fallen tree"),
            ("description", "Tree blocking the whole lane"),
            ("location", "Jalan Merdeka 4"),
            ("reporter_contact", "ignored"),
        ],
        Some(cookie.as_str()),
    );
    let resp = handle(req, &state).expect("Handler failed");
    assert_eq!(resp.status(), 201);

    let c = state
        .db
        .with_conn(|conn| get_complaint(conn, 1))
        .unwrap()
        .unwrap();
    assert_eq!(c.reporter, Reporter::Account(user_id));
}

#[test]
fn anonymous_without_contact_is_a_bad_request() {
    let (_dir, state) = init_test_app();
    let req = intake_request(
        &[
            ("title", "Pothole on Main"),
            ("description", "Deep hole next to the bus stop"),
            ("location", "Main Street 10"),
        ],
        None,
    );

    let err = handle(req, &state).unwrap_err();
    assert!(matches!(err, ServerError::BadRequest(msg) if msg.contains("contact")));

    let stored: i64 = state
        .db
        .with_conn(|conn| {
            conn.query_row("select count(*) from complaints", [], |r| r.get(0))
                .map_err(ServerError::from)
        })
        .unwrap();
    assert_eq!(stored, 0);
}

#[test]
fn half_coordinates_are_rejected() {
    let (_dir, state) = init_test_app();
    let req = intake_request(
        &[
            ("title", "Pothole on Main"),
            ("description", "Deep hole next to the bus stop"),
            ("location", "Main Street 10"),
            ("latitude", "-6.2"),
            ("reporter_contact", "555-0100"),
        ],
        None,
    );
    assert!(matches!(
        handle(req, &state).unwrap_err(),
        ServerError::BadRequest(_)
    ));
}

#[test]
fn unknown_route_is_not_found() {
    let (_dir, state) = init_test_app();
    let req = Request::builder()
        .method(Method::GET)
        .uri("/nowhere")
        .body(Body::empty())
        .unwrap();
    assert!(matches!(handle(req, &state).unwrap_err(), ServerError::NotFound));
}
