//! Patient route handlers.
//!
//! Registration arrives as `multipart/form-data`: four text fields plus the
//! `documentPhoto` JPEG. Every field is validated before the photo touches
//! disk, and a stored photo is removed again if the insert fails.

use axum::{
    Json,
    body::Bytes,
    extract::{
        Multipart, Path, Query, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
    },
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use patient_registry_core::{
    ListQuery, NewPatient, Page, Patient, PatientForm, SortField, SortOrder, ValidationErrors,
    fields,
};

use crate::error::AppError;
use crate::state::AppState;
use crate::storage::{UploadRejection, check_upload};

/// Query parameters for `GET /patients`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl ListParams {
    /// Apply defaults and fallbacks.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a zero `limit`.
    pub fn into_query(self) -> Result<ListQuery, AppError> {
        ListQuery::new(
            self.limit.unwrap_or(ListQuery::DEFAULT_LIMIT),
            self.offset.unwrap_or(0),
            self.search,
            SortField::parse_or_default(self.sort_by.as_deref()),
            SortOrder::parse_or_default(self.order.as_deref()),
        )
        .map_err(|e| {
            let mut errors = ValidationErrors::new();
            errors.add("limit", e.to_string());
            AppError::Validation(errors)
        })
    }
}

/// List patients with search, sorting and pagination.
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Page<Patient>>, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let query = params.into_query()?;

    Ok(Json(state.patients().list(&query).await?))
}

/// Fetch one patient.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, AppError> {
    Ok(Json(state.patients().find_one(&id).await?))
}

/// Register a patient from a multipart form.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Patient>), AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let (patient, photo) = validate(read_submission(&mut multipart).await?)?;

    let photo_url = state.photos().store(&photo).await?;

    match state.patients().create(patient, Some(photo_url.clone())).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(e) => {
            state.photos().discard(&photo_url).await;
            Err(e)
        }
    }
}

/// Delete a patient.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.patients().remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Raw multipart fields.
#[derive(Default)]
struct Submission {
    form: PatientForm,
    photo: Option<UploadedPhoto>,
    unknown: Vec<String>,
}

struct UploadedPhoto {
    content_type: Option<String>,
    bytes: Bytes,
}

async fn read_submission(multipart: &mut Multipart) -> Result<Submission, AppError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == fields::DOCUMENT_PHOTO {
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(multipart_error)?;
            submission.photo = Some(UploadedPhoto {
                content_type,
                bytes,
            });
        } else if fields::TEXT_FIELDS.contains(&name.as_str()) {
            let value = field.text().await.map_err(multipart_error)?;
            submission.form.set(&name, value);
        } else {
            submission.unknown.push(name);
        }
    }

    Ok(submission)
}

/// Validate every field, collecting all failures. An oversized photo
/// short-circuits with 413.
fn validate(submission: Submission) -> Result<(NewPatient, Bytes), AppError> {
    let Submission {
        form,
        photo,
        unknown,
    } = submission;
    let mut errors = ValidationErrors::new();

    for name in unknown {
        let message = format!("property {name} should not exist");
        errors.add(name, message);
    }

    let patient = NewPatient::parse(&form).map_err(|e| errors.extend(e)).ok();

    let photo = match photo {
        None => {
            errors.add(fields::DOCUMENT_PHOTO, "Document photo is required");
            None
        }
        Some(photo) => match check_upload(photo.content_type.as_deref(), photo.bytes.len()) {
            Ok(()) => Some(photo.bytes),
            Err(UploadRejection::NotJpeg) => {
                errors.add(fields::DOCUMENT_PHOTO, "Only JPEG images are allowed");
                None
            }
            Err(UploadRejection::TooLarge) => {
                return Err(AppError::PayloadTooLarge("File too large".to_string()));
            }
        },
    };

    match (patient, photo) {
        (Some(patient), Some(photo)) if errors.is_empty() => Ok((patient, photo)),
        _ => Err(AppError::Validation(errors)),
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File too large".to_string())
    } else {
        AppError::BadRequest(e.body_text())
    }
}
