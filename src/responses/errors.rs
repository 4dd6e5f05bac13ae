use crate::errors::ServerError;
use crate::templates::components::error_page;
use astra::{Body, Response, ResponseBuilder};
use tracing::{error, warn};

pub type ResultResp = Result<Response, ServerError>;

pub fn status_of(err: &ServerError) -> u16 {
    match err {
        ServerError::NotFound => 404,
        ServerError::BadRequest(_) => 400,
        ServerError::Unauthorized(_) => 401,
        ServerError::Forbidden => 403,
        ServerError::Conflict(_) => 409,
        ServerError::Unprocessable(_) => 422,
        ServerError::DbError(_) | ServerError::InternalError => 500,
    }
}

/// Convert a ServerError into an HTML error page with the matching status.
/// Storage details are logged, not shown.
pub fn error_response(err: ServerError) -> Response {
    let status = status_of(&err);
    let message = match &err {
        ServerError::DbError(msg) => {
            error!(error = %msg, "request failed on storage");
            "Something went wrong on our side. Please try again later.".to_string()
        }
        ServerError::InternalError => {
            error!("request failed");
            "Internal Server Error".to_string()
        }
        other => {
            warn!(status, error = %other, "request rejected");
            other.to_string()
        }
    };

    let body = error_page(status, &message).into_string();
    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}
