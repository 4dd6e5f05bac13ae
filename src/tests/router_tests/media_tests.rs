use crate::errors::ServerError;
use crate::media::{is_stored_name, MAX_UPLOAD_BYTES};
use crate::router::handle;
use crate::tests::utils::{body_string, init_test_app};
use astra::Body;
use http::{Method, Request};

fn upload(uri: &str, bytes: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/octet-stream")
        .body(Body::from(bytes))
        .unwrap()
}

#[test]
fn upload_returns_stored_name() {
    let (_dir, state) = init_test_app();

    let resp = handle(upload("/media?name=my%20photo.JPG", b"jpeg bytes".to_vec()), &state)
        .expect("Handler failed");
    assert_eq!(resp.status(), 201);

    let name = body_string(resp);
    assert!(is_stored_name(&name), "{name}");
    assert!(name.ends_with("_my_photo.JPG"));

    let path = state.media.resolve(&name).expect("file on disk");
    assert_eq!(std::fs::read(path).unwrap(), b"jpeg bytes");
}

#[test]
fn disallowed_extension_is_rejected() {
    let (_dir, state) = init_test_app();
    let err = handle(upload("/media?name=run.exe", b"MZ".to_vec()), &state).unwrap_err();
    assert!(matches!(err, ServerError::BadRequest(_)));
}

#[test]
fn missing_name_is_rejected() {
    let (_dir, state) = init_test_app();
    let err = handle(upload("/media", b"data".to_vec()), &state).unwrap_err();
    assert!(matches!(err, ServerError::BadRequest(msg) if msg.contains("name")));
}

#[test]
fn oversized_body_is_rejected() {
    let (_dir, state) = init_test_app();
    let err = handle(
        upload("/media?name=big.mp4", vec![0u8; MAX_UPLOAD_BYTES + 1]),
        &state,
    )
    .unwrap_err();
    assert!(matches!(err, ServerError::BadRequest(msg) if msg.contains("exceeds")));
}
