//! Shared response types, multipart forms and the mapping from model errors to HTTP statuses.

use crate::model::core::ServiceError;
use log::warn;
use poem_openapi::payload::{Binary, Json};
use poem_openapi::types::multipart::Upload;
use poem_openapi::types::{ParseFromJSON, ToJSON};
use poem_openapi::{ApiResponse, Multipart, Object, Tags};
use serde::{Deserialize, Serialize};

#[derive(Tags)]
pub enum ApiTags {
    /// Registration, login and profiles.
    Accounts,
    /// Categories, classes, ticket tiers and participants.
    Catalog,
    /// Slides, page content, partners, team and contact.
    Content,
    /// Dashboard statistics and maintenance.
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Object)]
pub struct ErrorMessage {
    pub msg: String,
}

/// How a failed operation is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    BadRequest,
    Forbidden,
    NotFound,
}

pub fn classify(err: &anyhow::Error) -> Failure {
    if let Some(e) = err.downcast_ref::<ServiceError>() {
        return match e {
            ServiceError::NotFound { .. } => Failure::NotFound,
            ServiceError::Forbidden { .. } => Failure::Forbidden,
            ServiceError::Conflict { .. } | ServiceError::Invalid { .. } => Failure::BadRequest,
        };
    }

    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::RowNotFound) => Failure::NotFound,
        _ => Failure::BadRequest,
    }
}

/// Error constructors shared by every response enum.
pub trait ErrorResponse: Sized {
    fn bad_request(msg: String) -> Self;
    fn forbidden(msg: String) -> Self;
    fn not_found(msg: String) -> Self;

    /// Log the failure and pick the status from the error kind.
    fn from_error(context: &str, err: anyhow::Error) -> Self {
        let msg = format!("{}: {}", context, err);
        warn!("{}", msg);
        match classify(&err) {
            Failure::BadRequest => Self::bad_request(msg),
            Failure::Forbidden => Self::forbidden(msg),
            Failure::NotFound => Self::not_found(msg),
        }
    }
}

macro_rules! error_constructors {
    () => {
        fn bad_request(msg: String) -> Self {
            Self::BadRequest(Json(ErrorMessage { msg }))
        }

        fn forbidden(msg: String) -> Self {
            Self::Forbidden(Json(ErrorMessage { msg }))
        }

        fn not_found(msg: String) -> Self {
            Self::NotFound(Json(ErrorMessage { msg }))
        }
    };
}

#[derive(ApiResponse)]
pub enum GetRecordResponse<T: ParseFromJSON + ToJSON + Send + Sync> {
    #[oai(status = 200)]
    Ok(Json<T>),

    #[oai(status = 400)]
    BadRequest(Json<ErrorMessage>),

    #[oai(status = 403)]
    Forbidden(Json<ErrorMessage>),

    #[oai(status = 404)]
    NotFound(Json<ErrorMessage>),
}

impl<T: ParseFromJSON + ToJSON + Send + Sync> GetRecordResponse<T> {
    pub fn ok(t: T) -> Self {
        Self::Ok(Json(t))
    }
}

impl<T: ParseFromJSON + ToJSON + Send + Sync> ErrorResponse for GetRecordResponse<T> {
    error_constructors!();
}

#[derive(ApiResponse)]
pub enum PostResponse<T: ParseFromJSON + ToJSON + Send + Sync> {
    #[oai(status = 201)]
    Created(Json<T>),

    #[oai(status = 400)]
    BadRequest(Json<ErrorMessage>),

    #[oai(status = 403)]
    Forbidden(Json<ErrorMessage>),

    #[oai(status = 404)]
    NotFound(Json<ErrorMessage>),
}

impl<T: ParseFromJSON + ToJSON + Send + Sync> PostResponse<T> {
    pub fn created(t: T) -> Self {
        Self::Created(Json(t))
    }
}

impl<T: ParseFromJSON + ToJSON + Send + Sync> ErrorResponse for PostResponse<T> {
    error_constructors!();
}

#[derive(ApiResponse)]
pub enum DeleteResponse {
    #[oai(status = 204)]
    NoContent,

    #[oai(status = 400)]
    BadRequest(Json<ErrorMessage>),

    #[oai(status = 403)]
    Forbidden(Json<ErrorMessage>),

    #[oai(status = 404)]
    NotFound(Json<ErrorMessage>),
}

impl DeleteResponse {
    pub fn no_content() -> Self {
        Self::NoContent
    }
}

impl ErrorResponse for DeleteResponse {
    error_constructors!();
}

#[derive(ApiResponse)]
pub enum FileResponse {
    #[oai(status = 200)]
    Ok(Binary<Vec<u8>>, #[oai(header = "Content-Type")] String),

    #[oai(status = 400)]
    BadRequest(Json<ErrorMessage>),

    #[oai(status = 403)]
    Forbidden(Json<ErrorMessage>),

    #[oai(status = 404)]
    NotFound(Json<ErrorMessage>),
}

impl ErrorResponse for FileResponse {
    error_constructors!();
}

/// Reject a role violation before touching the database.
#[macro_export]
macro_rules! require_admin {
    ($token:expr, $resp:ty) => {
        if let Err(msg) = $token.admin() {
            return <$resp as $crate::api::schema::ErrorResponse>::forbidden(msg);
        }
    };
}

/// A file read fully into memory with what the client told us about it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ReceivedFile {
    pub async fn read(upload: Upload) -> Result<Self, anyhow::Error> {
        let file_name = upload.file_name().map(str::to_string);
        let content_type = upload.content_type().map(str::to_string);
        let bytes = upload.into_vec().await?;
        Ok(ReceivedFile {
            file_name,
            content_type,
            bytes,
        })
    }

    /// Read an optional upload, treating an empty file part as absent.
    pub async fn read_optional(upload: Option<Upload>) -> Result<Option<Self>, anyhow::Error> {
        match upload {
            Some(upload) => {
                let file = Self::read(upload).await?;
                if file.bytes.is_empty() && file.file_name.as_deref().unwrap_or("").is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(file))
                }
            }
            None => Ok(None),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Require an `image/*` content type and a size limit.
    pub fn check_image(&self, max_size: usize) -> Result<(), anyhow::Error> {
        if !crate::model::util::is_image_content_type(self.content_type.as_deref()) {
            return Err(ServiceError::invalid("The file must be an image."));
        }
        if self.size() > max_size {
            return Err(ServiceError::invalid(&format!(
                "The file must not exceed {}MB.",
                max_size / crate::model::util::MB
            )));
        }
        Ok(())
    }
}

/// Class form used by `POST /classes` and `POST /categories`.
#[derive(Debug, Multipart)]
pub struct ClassForm {
    pub name: String,
    pub category: String,
    pub description: String,
    pub schedule: String,
    pub venue: String,
    pub fee: f64,
    #[oai(default)]
    pub quota: i32,
    pub link_url: Option<String>,
    #[oai(default)]
    pub is_external_link: bool,
    pub photo: Option<Upload>,
    pub payment_qr: Option<Upload>,
    pub gallery: Vec<Upload>,
}

/// Class form used by `PUT /classes/:id`.
#[derive(Debug, Multipart)]
pub struct ClassUpdateForm {
    pub name: String,
    pub category: String,
    pub description: String,
    pub schedule: String,
    pub venue: String,
    pub fee: f64,
    #[oai(default)]
    pub quota: i32,
    pub link_url: Option<String>,
    #[oai(default)]
    pub is_external_link: bool,
    pub photo: Option<Upload>,
    #[oai(default)]
    pub remove_photo: bool,
    pub gallery: Vec<Upload>,
    #[oai(default)]
    pub remove_gallery: bool,
}

/// A single file under the `file` field.
#[derive(Debug, Multipart)]
pub struct FileForm {
    pub file: Upload,
}

#[derive(Debug, Multipart)]
pub struct SlideForm {
    pub file: Upload,
    pub description: Option<String>,
    #[oai(default)]
    pub order_position: i32,
    pub crop_mode: Option<String>,
}

#[derive(Debug, Multipart)]
pub struct PartnerLogoForm {
    pub image: Upload,
    pub partner_index: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(&ServiceError::not_found("Class 1")), Failure::NotFound);
        assert_eq!(classify(&ServiceError::forbidden("no")), Failure::Forbidden);
        assert_eq!(classify(&ServiceError::conflict("dup")), Failure::BadRequest);
        assert_eq!(classify(&ServiceError::invalid("bad")), Failure::BadRequest);
        assert_eq!(classify(&sqlx::Error::RowNotFound.into()), Failure::NotFound);
        assert_eq!(classify(&anyhow::anyhow!("boom")), Failure::BadRequest);
    }

    #[test]
    fn test_from_error_status() {
        let resp = DeleteResponse::from_error("Failed to delete class", ServiceError::not_found("Class 3"));
        match resp {
            DeleteResponse::NotFound(Json(e)) => {
                assert_eq!(e.msg, "Failed to delete class: Class 3 not found")
            }
            _ => panic!("expected 404"),
        }
    }

    #[test]
    fn test_check_image() {
        let file = ReceivedFile {
            file_name: Some("a.png".to_string()),
            content_type: Some("image/png".to_string()),
            bytes: vec![0; 10],
        };
        assert!(file.check_image(100).is_ok());
        assert!(file.check_image(5).is_err());

        let text = ReceivedFile {
            content_type: Some("text/plain".to_string()),
            ..file
        };
        assert!(text.check_image(100).is_err());
    }

    struct GalleryEcho;

    #[poem_openapi::OpenApi]
    impl GalleryEcho {
        #[oai(path = "/classes", method = "post")]
        async fn create(&self, form: ClassForm) -> poem_openapi::payload::PlainText<String> {
            poem_openapi::payload::PlainText(format!("{}:{}", form.name, form.gallery.len()))
        }
    }

    fn class_form() -> poem::test::TestForm {
        poem::test::TestForm::new()
            .text("name", "Trail 10K")
            .text("category", "Running")
            .text("description", "Weekend run")
            .text("schedule", "2024-07-01 06:00")
            .text("venue", "Senayan")
            .text("fee", "150000")
    }

    #[tokio::test]
    async fn test_class_form_gallery_is_optional() {
        let service = poem_openapi::OpenApiService::new(GalleryEcho, "test", "1.0");
        let cli = poem::test::TestClient::new(service);

        let resp = cli.post("/classes").multipart(class_form()).send().await;
        resp.assert_status_is_ok();
        resp.assert_text("Trail 10K:0").await;

        let form = class_form()
            .field(
                poem::test::TestFormField::bytes(b"a".to_vec())
                    .name("gallery")
                    .filename("a.jpg")
                    .content_type("image/jpeg"),
            )
            .field(
                poem::test::TestFormField::bytes(b"b".to_vec())
                    .name("gallery")
                    .filename("b.jpg")
                    .content_type("image/jpeg"),
            );
        let resp = cli.post("/classes").multipart(form).send().await;
        resp.assert_status_is_ok();
        resp.assert_text("Trail 10K:2").await;
    }
}
