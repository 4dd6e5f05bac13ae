// src/domain/complaint.rs

use chrono::{DateTime, Utc};

use crate::domain::status::Status;
use crate::errors::ComplaintError;
use crate::media;

/// Who filed the complaint. Either a signed-in account or free text,
/// never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Reporter {
    Account(i64),
    Anonymous {
        name: Option<String>,
        contact: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, ComplaintError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(ComplaintError::Validation(format!(
                "coordinates out of range: {lat}, {lon}"
            )));
        }
        Ok(Self { lat, lon })
    }
}

/// A complaint as stored. Only the store constructs these.
#[derive(Debug, Clone, PartialEq)]
pub struct Complaint {
    pub id: i64,
    pub reporter: Reporter,
    pub title: String,
    pub description: String,
    pub location: String,
    pub coordinates: Option<Coordinates>,
    pub media_ref: Option<String>,
    pub status: Status,
    pub admin_response: Option<String>,
    pub created_at: i64,
    pub status_updated_at: i64,
    pub revision: i64,
    pub announced: bool,
}

impl Complaint {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_at, 0)
    }

    pub fn status_updated_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.status_updated_at, 0)
    }
}

/// Intake request before validation.
#[derive(Debug, Clone)]
pub struct NewComplaint {
    pub reporter: Reporter,
    pub title: String,
    pub description: String,
    pub location: String,
    pub coordinates: Option<Coordinates>,
    pub media_ref: Option<String>,
}

const TITLE_LEN: (usize, usize) = (5, 100);
const DESCRIPTION_LEN: (usize, usize) = (10, 3000);
const LOCATION_LEN: (usize, usize) = (5, 200);
const REPORTER_NAME_MAX: usize = 100;
const CONTACT_MAX: usize = 200;

fn required(field: &str, value: &str, min: usize, max: Option<usize>) -> Result<String, ComplaintError> {
    let value = value.trim();
    let len = value.chars().count();
    if len == 0 {
        return Err(ComplaintError::Validation(format!("{field} is required")));
    }
    if len < min {
        return Err(ComplaintError::Validation(format!(
            "{field} must be at least {min} characters"
        )));
    }
    if let Some(max) = max {
        if len > max {
            return Err(ComplaintError::Validation(format!(
                "{field} must be at most {max} characters"
            )));
        }
    }
    Ok(value.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl NewComplaint {
    /// Trim and check every field. Account existence is checked by intake,
    /// which has the database at hand.
    pub fn validated(self) -> Result<Self, ComplaintError> {
        let title = required("title", &self.title, TITLE_LEN.0, Some(TITLE_LEN.1))?;
        let description = required(
            "description",
            &self.description,
            DESCRIPTION_LEN.0,
            Some(DESCRIPTION_LEN.1),
        )?;
        let location = required("location", &self.location, LOCATION_LEN.0, Some(LOCATION_LEN.1))?;

        let reporter = match self.reporter {
            Reporter::Account(id) => Reporter::Account(id),
            Reporter::Anonymous { name, contact } => {
                let contact = contact.trim().to_string();
                if contact.is_empty() {
                    return Err(ComplaintError::Validation(
                        "contact is required for anonymous reports".into(),
                    ));
                }
                if contact.chars().count() > CONTACT_MAX {
                    return Err(ComplaintError::Validation(format!(
                        "contact must be at most {CONTACT_MAX} characters"
                    )));
                }
                let name = optional_text(name);
                if name.as_ref().is_some_and(|n| n.chars().count() > REPORTER_NAME_MAX) {
                    return Err(ComplaintError::Validation(format!(
                        "name must be at most {REPORTER_NAME_MAX} characters"
                    )));
                }
                Reporter::Anonymous { name, contact }
            }
        };

        let media_ref = optional_text(self.media_ref);
        if let Some(name) = &media_ref {
            if !media::is_stored_name(name) {
                return Err(ComplaintError::Validation(format!(
                    "media reference '{name}' is not a stored upload"
                )));
            }
        }

        Ok(NewComplaint {
            reporter,
            title,
            description,
            location,
            coordinates: self.coordinates,
            media_ref,
        })
    }
}
