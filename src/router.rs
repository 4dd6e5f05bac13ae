use crate::admin::{update_complaint, AdminUpdate};
use crate::auth::{load_account_from_session, session_cookie};
use crate::db::accounts::Account;
use crate::db::complaints::get_complaint;
use crate::db::Database;
use crate::domain::{Coordinates, NewComplaint, Reporter, Status};
use crate::errors::ServerError;
use crate::intake::submit_complaint;
use crate::media::{MediaStore, MAX_UPLOAD_BYTES};
use crate::now_unix;
use crate::responses::{
    html_response, html_response_with_status, redirect_see_other, text_response, ResultResp,
};
use crate::templates::pages;
use astra::Request;
use std::collections::HashMap;
use std::io::Read;
use url::form_urlencoded;

/// What every request handler gets to work with.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Database,
    pub media: MediaStore,
}

pub fn handle(req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method.as_str(), segments.as_slice()) {
        ("GET", [""]) => {
            let account = current_account(&req, &state.db)?;
            html_response(pages::home_page(account.as_ref()))
        }
        ("POST", ["complaints"]) => submit(req, state),
        ("POST", ["media"]) => upload(req, state),
        ("GET", ["complaints", id]) => show(&req, state, parse_id(id)?),
        ("POST", ["admin", "complaints", id, "status"]) => {
            let id = parse_id(id)?;
            admin_status(req, state, id)
        }
        _ => Err(ServerError::NotFound),
    }
}

fn parse_id(raw: &str) -> Result<i64, ServerError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(ServerError::NotFound)
}

fn current_account(req: &Request, db: &Database) -> Result<Option<Account>, ServerError> {
    let Some(token) = req
        .headers()
        .get("Cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(session_cookie)
    else {
        return Ok(None);
    };
    db.with_conn(|conn| load_account_from_session(conn, token, now_unix()))
}

fn read_body(req: Request, limit: usize) -> Result<Vec<u8>, ServerError> {
    let mut buf = Vec::new();
    req.into_body()
        .reader()
        .take(limit as u64 + 1)
        .read_to_end(&mut buf)
        .map_err(|e| ServerError::BadRequest(format!("could not read request body: {e}")))?;
    if buf.len() > limit {
        return Err(ServerError::BadRequest(format!(
            "request body exceeds {limit} bytes"
        )));
    }
    Ok(buf)
}

const MAX_FORM_BYTES: usize = 64 * 1024;

fn parse_form(bytes: &[u8]) -> HashMap<String, String> {
    form_urlencoded::parse(bytes).into_owned().collect()
}

fn parse_query(req: &Request) -> HashMap<String, String> {
    req.uri()
        .query()
        .map(|q| parse_form(q.as_bytes()))
        .unwrap_or_default()
}

/// Blank form fields count as absent.
fn field(form: &HashMap<String, String>, name: &str) -> Option<String> {
    form.get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_coordinates(form: &HashMap<String, String>) -> Result<Option<Coordinates>, ServerError> {
    let number = |name: &str| -> Result<Option<f64>, ServerError> {
        field(form, name)
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|_| ServerError::BadRequest(format!("{name} must be a number")))
            })
            .transpose()
    };

    match (number("latitude")?, number("longitude")?) {
        (Some(lat), Some(lon)) => Ok(Some(Coordinates::new(lat, lon)?)),
        (None, None) => Ok(None),
        _ => Err(ServerError::BadRequest(
            "latitude and longitude must be given together".into(),
        )),
    }
}

fn submit(req: Request, state: &AppState) -> ResultResp {
    let account = current_account(&req, &state.db)?;
    let form = parse_form(&read_body(req, MAX_FORM_BYTES)?);

    let reporter = match account {
        Some(a) => Reporter::Account(a.id),
        None => Reporter::Anonymous {
            name: field(&form, "reporter_name"),
            contact: field(&form, "reporter_contact").unwrap_or_default(),
        },
    };

    let request = NewComplaint {
        reporter,
        title: form.get("title").cloned().unwrap_or_default(),
        description: form.get("description").cloned().unwrap_or_default(),
        location: form.get("location").cloned().unwrap_or_default(),
        coordinates: parse_coordinates(&form)?,
        media_ref: field(&form, "media_ref"),
    };

    let id = submit_complaint(&state.db, request, now_unix())?;
    html_response_with_status(201, pages::submitted_page(id))
}

fn upload(req: Request, state: &AppState) -> ResultResp {
    let name = parse_query(&req)
        .remove("name")
        .ok_or_else(|| ServerError::BadRequest("missing ?name= for the upload".into()))?;
    let bytes = read_body(req, MAX_UPLOAD_BYTES)?;
    let stored = state.media.store(&name, &bytes)?;
    text_response(201, stored)
}

fn show(req: &Request, state: &AppState, id: i64) -> ResultResp {
    let complaint = state
        .db
        .with_conn(|conn| get_complaint(conn, id))?
        .ok_or(ServerError::NotFound)?;
    let is_admin = current_account(req, &state.db)?.is_some_and(|a| a.is_admin());
    html_response(pages::complaint_page(&complaint, is_admin))
}

fn admin_status(req: Request, state: &AppState, id: i64) -> ResultResp {
    match current_account(&req, &state.db)? {
        None => return Err(ServerError::Unauthorized("sign in as staff first".into())),
        Some(a) if !a.is_admin() => return Err(ServerError::Forbidden),
        Some(_) => {}
    }

    let form = parse_form(&read_body(req, MAX_FORM_BYTES)?);
    let update = AdminUpdate {
        status: field(&form, "status")
            .map(|s| s.parse::<Status>())
            .transpose()?,
        // Present but blank clears the response.
        admin_response: form.get("admin_response").map(|_| field(&form, "admin_response")),
        revision: field(&form, "revision")
            .map(|r| {
                r.parse::<i64>()
                    .map_err(|_| ServerError::BadRequest("revision must be a number".into()))
            })
            .transpose()?,
    };

    update_complaint(&state.db, id, &update, now_unix())?;

    redirect_see_other(&format!("/complaints/{id}"))
}
