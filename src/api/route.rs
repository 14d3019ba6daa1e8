//! This module defines the account and catalog routes of the API.

use super::auth::{issue_token, CustomSecurityScheme};
use super::schema::{
    ApiTags, ClassForm, ClassUpdateForm, DeleteResponse, ErrorResponse, FileForm, FileResponse,
    GetRecordResponse, PostResponse, ReceivedFile,
};
use crate::model::catalog::{
    ClassDetail, ClassInput, ClassRow, Category, FeaturedEvents, FeaturedEventsPayload,
    FeaturedEventsSaved, FileChange, Participant, PublicClass, TicketTier, TicketTierPayload,
    TicketTierUpdate, parse_event_ids,
};
use crate::model::core::{Message, ServiceError};
use crate::model::user::{
    LoginPayload, PasswordChange, Profile, ProfileUpdate, PublicProfile, RegisterPayload, User,
};
use crate::model::util::{content_type_for, extension_of, short_hex, UploadStore, MB};
use crate::require_admin;
use log::{info, warn};
use poem::web::Data;
use poem_openapi::payload::Binary;
use poem_openapi::{param::Path, param::Query, payload::Json, Object, OpenApi};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const PROFILE_PHOTO_SUBDIR: &str = "profile_pictures";
pub const PROFILE_PHOTO_EXTENSIONS: [&str; 4] = [".png", ".jpg", ".jpeg", ".gif"];
pub const PROFILE_PHOTO_MAX_SIZE: usize = 5 * MB;
pub const CLASS_PHOTO_SUBDIR: &str = "classes";
pub const GALLERY_SUBDIR: &str = "gallery";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct Registered {
    pub message: String,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct LoginResult {
    pub access_token: String,
    pub token_type: String,
    pub role: String,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub user_id: i64,
    pub profile_photo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct AuthCheck {
    pub authenticated: bool,
    pub user_id: i64,
    pub username: String,
    pub role: String,
}

/// Files saved for a class form, removed again when the database write fails.
#[derive(Debug, Default)]
struct SavedClassFiles {
    photo: Option<String>,
    payment_qr: Option<String>,
    gallery: Vec<String>,
}

impl SavedClassFiles {
    fn all(&self) -> Vec<String> {
        let mut files = self.gallery.clone();
        files.extend(self.photo.clone());
        files.extend(self.payment_qr.clone());
        files
    }

    fn discard(&self, store: &UploadStore) {
        for file in self.all() {
            store.delete_quietly(&file);
        }
    }
}

async fn save_upload(
    store: &UploadStore,
    subdir: &str,
    upload: Option<poem_openapi::types::multipart::Upload>,
) -> Result<Option<String>, anyhow::Error> {
    match ReceivedFile::read_optional(upload).await? {
        Some(file) => Ok(Some(store.save_image(
            subdir,
            file.file_name.as_deref(),
            &file.bytes,
        )?)),
        None => Ok(None),
    }
}

async fn save_gallery(
    store: &UploadStore,
    uploads: Vec<poem_openapi::types::multipart::Upload>,
    saved: &mut SavedClassFiles,
) -> Result<(), anyhow::Error> {
    for upload in uploads
        .into_iter()
        .take(crate::model::util::MAX_GALLERY_FILES)
    {
        if let Some(path) = save_upload(store, GALLERY_SUBDIR, Some(upload)).await? {
            saved.gallery.push(path);
        }
    }
    Ok(())
}

async fn save_class_form(
    store: &UploadStore,
    form: ClassForm,
) -> Result<(ClassInput, SavedClassFiles), anyhow::Error> {
    let input = ClassInput {
        name: form.name,
        category: form.category,
        description: form.description,
        schedule: form.schedule,
        venue: form.venue,
        fee: form.fee,
        quota: form.quota,
        link_url: form.link_url,
        is_external_link: form.is_external_link,
    }
    .checked()?;

    let (photo, payment_qr, gallery) = (form.photo, form.payment_qr, form.gallery);
    let mut saved = SavedClassFiles::default();
    let result = async {
        saved.photo = save_upload(store, CLASS_PHOTO_SUBDIR, photo).await?;
        saved.payment_qr = save_upload(store, CLASS_PHOTO_SUBDIR, payment_qr).await?;
        save_gallery(store, gallery, &mut saved).await
    }
    .await;

    match result {
        Ok(_) => Ok((input, saved)),
        Err(e) => {
            saved.discard(store);
            Err(e)
        }
    }
}

async fn create_class_from_form(
    pool: &sqlx::PgPool,
    store: &UploadStore,
    form: ClassForm,
) -> Result<ClassDetail, anyhow::Error> {
    let (input, saved) = save_class_form(store, form).await?;
    match ClassDetail::create(
        pool,
        input,
        saved.photo.clone(),
        saved.payment_qr.clone(),
        saved.gallery.clone(),
    )
    .await
    {
        Ok(detail) => Ok(detail),
        Err(e) => {
            saved.discard(store);
            Err(e)
        }
    }
}

async fn update_class_from_form(
    pool: &sqlx::PgPool,
    store: &UploadStore,
    id: i64,
    form: ClassUpdateForm,
) -> Result<ClassDetail, anyhow::Error> {
    let input = ClassInput {
        name: form.name,
        category: form.category,
        description: form.description,
        schedule: form.schedule,
        venue: form.venue,
        fee: form.fee,
        quota: form.quota,
        link_url: form.link_url,
        is_external_link: form.is_external_link,
    }
    .checked()?;
    ClassRow::get(pool, id).await?;

    let (photo, gallery) = (form.photo, form.gallery);
    let (remove_photo, remove_gallery) = (form.remove_photo, form.remove_gallery);
    let mut saved = SavedClassFiles::default();
    let stored = async {
        saved.photo = save_upload(store, CLASS_PHOTO_SUBDIR, photo).await?;
        save_gallery(store, gallery, &mut saved).await
    }
    .await;
    if let Err(e) = stored {
        saved.discard(store);
        return Err(e);
    }

    let photo = match (&saved.photo, remove_photo) {
        (Some(path), _) => FileChange::Replace(path.clone()),
        (None, true) => FileChange::Remove,
        (None, false) => FileChange::Keep,
    };
    let gallery = if !saved.gallery.is_empty() {
        Some(saved.gallery.clone())
    } else if remove_gallery {
        Some(vec![])
    } else {
        None
    };

    match ClassDetail::update(pool, id, input, photo, gallery).await {
        Ok((detail, obsolete)) => {
            for file in obsolete {
                store.delete_quietly(&file);
            }
            Ok(detail)
        }
        Err(e) => {
            saved.discard(store);
            Err(e)
        }
    }
}

fn profile_photo_filename(user_id: i64, original_name: Option<&str>) -> Result<String, anyhow::Error> {
    let ext = original_name.and_then(extension_of).unwrap_or_default();
    if !PROFILE_PHOTO_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ServiceError::invalid(&format!(
            "File type is not allowed, allowed types: {}",
            PROFILE_PHOTO_EXTENSIONS.join(", ")
        )));
    }
    Ok(format!("profile_{}_{}{}", user_id, short_hex(), ext))
}

async fn replace_profile_photo(
    pool: &sqlx::PgPool,
    store: &UploadStore,
    user_id: i64,
    upload: poem_openapi::types::multipart::Upload,
) -> Result<Profile, anyhow::Error> {
    let file = ReceivedFile::read(upload).await?;
    if file.size() > PROFILE_PHOTO_MAX_SIZE {
        return Err(ServiceError::invalid("The photo must not exceed 5MB."));
    }

    let filename = profile_photo_filename(user_id, file.file_name.as_deref())?;
    let path = store.save_as(PROFILE_PHOTO_SUBDIR, &filename, &file.bytes)?;

    match User::set_profile_photo(pool, user_id, Some(&path)).await {
        Ok((user, previous)) => {
            if let Some(previous) = previous {
                store.delete_quietly(&previous);
            }
            Ok(Profile::from(&user))
        }
        Err(e) => {
            store.delete_quietly(&path);
            Err(e)
        }
    }
}

pub struct EventhubApi;

#[OpenApi]
impl EventhubApi {
    /// Call `/api/v1/auth/register` with payload to create a user account.
    #[oai(
        path = "/api/v1/auth/register",
        method = "post",
        tag = "ApiTags::Accounts",
        operation_id = "register"
    )]
    async fn register(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        payload: Json<RegisterPayload>,
    ) -> PostResponse<Registered> {
        let pool_arc = pool.clone();
        let payload = payload.0;

        match User::register(&pool_arc, payload).await {
            Ok(user) => {
                info!("Registered user {}", user.username);
                PostResponse::created(Registered {
                    message: "Registration succeeded.".to_string(),
                    username: user.username,
                    role: user.role,
                })
            }
            Err(e) => PostResponse::from_error("Failed to register", e),
        }
    }

    /// Call `/api/v1/auth/login` with credentials to get an access token.
    #[oai(
        path = "/api/v1/auth/login",
        method = "post",
        tag = "ApiTags::Accounts",
        operation_id = "login"
    )]
    async fn login(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        payload: Json<LoginPayload>,
    ) -> GetRecordResponse<LoginResult> {
        let pool_arc = pool.clone();
        let payload = payload.0;

        let user = match User::authenticate(&pool_arc, &payload.username, &payload.password).await {
            Ok(user) => user,
            Err(e) => return GetRecordResponse::from_error("Failed to login", e),
        };

        match issue_token(&user) {
            Ok(access_token) => GetRecordResponse::ok(LoginResult {
                access_token,
                token_type: "bearer".to_string(),
                role: user.role,
                username: user.username,
                full_name: user.full_name,
                email: user.email,
                user_id: user.id,
                profile_photo: user.profile_photo,
            }),
            Err(e) => GetRecordResponse::from_error("Failed to issue a token", e),
        }
    }

    /// Call `/api/v1/auth/logout` to end the session on the client side.
    #[oai(
        path = "/api/v1/auth/logout",
        method = "post",
        tag = "ApiTags::Accounts",
        operation_id = "logout"
    )]
    async fn logout(&self, token: CustomSecurityScheme) -> GetRecordResponse<Message> {
        info!("User {} logged out", token.user().username);
        GetRecordResponse::ok(Message::new("Logged out."))
    }

    /// Call `/api/v1/auth/check` to verify the current token.
    #[oai(
        path = "/api/v1/auth/check",
        method = "get",
        tag = "ApiTags::Accounts",
        operation_id = "checkAuth"
    )]
    async fn check_auth(&self, token: CustomSecurityScheme) -> GetRecordResponse<AuthCheck> {
        let user = token.user();
        GetRecordResponse::ok(AuthCheck {
            authenticated: true,
            user_id: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
        })
    }

    /// Call `/api/v1/profile` to fetch the profile of the current user.
    #[oai(
        path = "/api/v1/profile",
        method = "get",
        tag = "ApiTags::Accounts",
        operation_id = "fetchProfile"
    )]
    async fn fetch_profile(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<Profile> {
        let pool_arc = pool.clone();

        match User::get(&pool_arc, token.user().id).await {
            Ok(user) => GetRecordResponse::ok(Profile::from(&user)),
            Err(e) => GetRecordResponse::from_error("Failed to fetch profile", e),
        }
    }

    /// Call `/api/v1/profile` with payload to update the profile of the current user.
    #[oai(
        path = "/api/v1/profile",
        method = "put",
        tag = "ApiTags::Accounts",
        operation_id = "updateProfile"
    )]
    async fn update_profile(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        payload: Json<ProfileUpdate>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<Profile> {
        let pool_arc = pool.clone();
        let payload = payload.0;

        match User::update_profile(&pool_arc, token.user().id, &payload).await {
            Ok(user) => GetRecordResponse::ok(Profile::from(&user)),
            Err(e) => GetRecordResponse::from_error("Failed to update profile", e),
        }
    }

    /// Call `/api/v1/profile/password` with the old and new password.
    #[oai(
        path = "/api/v1/profile/password",
        method = "put",
        tag = "ApiTags::Accounts",
        operation_id = "changePassword"
    )]
    async fn change_password(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        payload: Json<PasswordChange>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<Message> {
        let pool_arc = pool.clone();
        let payload = payload.0;

        match User::change_password(&pool_arc, token.user().id, &payload).await {
            Ok(_) => GetRecordResponse::ok(Message::new("Password changed.")),
            Err(e) => GetRecordResponse::from_error("Failed to change password", e),
        }
    }

    /// Call `/api/v1/profile/photo` with a multipart `file` to replace the profile photo.
    #[oai(
        path = "/api/v1/profile/photo",
        method = "post",
        tag = "ApiTags::Accounts",
        operation_id = "uploadProfilePhoto"
    )]
    async fn upload_profile_photo(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        form: FileForm,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<Profile> {
        let pool_arc = pool.clone();

        match replace_profile_photo(&pool_arc, &store, token.user().id, form.file).await {
            Ok(profile) => GetRecordResponse::ok(profile),
            Err(e) => GetRecordResponse::from_error("Failed to upload profile photo", e),
        }
    }

    /// Call `/api/v1/profile/photo` to remove the profile photo.
    #[oai(
        path = "/api/v1/profile/photo",
        method = "delete",
        tag = "ApiTags::Accounts",
        operation_id = "deleteProfilePhoto"
    )]
    async fn delete_profile_photo(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<Profile> {
        let pool_arc = pool.clone();

        match User::set_profile_photo(&pool_arc, token.user().id, None).await {
            Ok((user, previous)) => {
                if let Some(previous) = previous {
                    store.delete_quietly(&previous);
                }
                GetRecordResponse::ok(Profile::from(&user))
            }
            Err(e) => GetRecordResponse::from_error("Failed to delete profile photo", e),
        }
    }

    /// Call `/api/v1/users/:id/public` to fetch the public profile of a user.
    #[oai(
        path = "/api/v1/users/:id/public",
        method = "get",
        tag = "ApiTags::Accounts",
        operation_id = "fetchPublicProfile"
    )]
    async fn fetch_public_profile(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        id: Path<i64>,
    ) -> GetRecordResponse<PublicProfile> {
        let pool_arc = pool.clone();

        match User::get(&pool_arc, id.0).await {
            Ok(user) => GetRecordResponse::ok(PublicProfile::from(&user)),
            Err(e) => GetRecordResponse::from_error("Failed to fetch user", e),
        }
    }

    /// Call `/api/v1/categories` to fetch all category names.
    #[oai(
        path = "/api/v1/categories",
        method = "get",
        tag = "ApiTags::Catalog",
        operation_id = "fetchCategories"
    )]
    async fn fetch_categories(&self, pool: Data<&Arc<sqlx::PgPool>>) -> GetRecordResponse<Vec<String>> {
        let pool_arc = pool.clone();

        match Category::list(&pool_arc).await {
            Ok(categories) => GetRecordResponse::ok(categories.into_iter().map(|c| c.name).collect()),
            Err(e) => GetRecordResponse::from_error("Failed to fetch categories", e),
        }
    }

    /// Call `/api/v1/categories` with a class form to create a category together with its first class.
    #[oai(
        path = "/api/v1/categories",
        method = "post",
        tag = "ApiTags::Catalog",
        operation_id = "createCategory"
    )]
    async fn create_category(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        form: ClassForm,
        token: CustomSecurityScheme,
    ) -> PostResponse<ClassDetail> {
        require_admin!(token, PostResponse<ClassDetail>);
        let pool_arc = pool.clone();

        match create_class_from_form(&pool_arc, &store, form).await {
            Ok(detail) => PostResponse::created(detail),
            Err(e) => PostResponse::from_error("Failed to create category", e),
        }
    }

    /// Call `/api/v1/categories/:name` to delete an unused category.
    #[oai(
        path = "/api/v1/categories/:name",
        method = "delete",
        tag = "ApiTags::Catalog",
        operation_id = "deleteCategory"
    )]
    async fn delete_category(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        name: Path<String>,
        token: CustomSecurityScheme,
    ) -> DeleteResponse {
        require_admin!(token, DeleteResponse);
        let pool_arc = pool.clone();

        match Category::delete_by_name(&pool_arc, &name.0).await {
            Ok(_) => DeleteResponse::no_content(),
            Err(e) => DeleteResponse::from_error("Failed to delete category", e),
        }
    }

    /// Call `/api/v1/classes` to fetch all classes, newest first.
    #[oai(
        path = "/api/v1/classes",
        method = "get",
        tag = "ApiTags::Catalog",
        operation_id = "fetchClasses"
    )]
    async fn fetch_classes(&self, pool: Data<&Arc<sqlx::PgPool>>) -> GetRecordResponse<Vec<ClassDetail>> {
        let pool_arc = pool.clone();

        match ClassDetail::list(&pool_arc).await {
            Ok(classes) => GetRecordResponse::ok(classes),
            Err(e) => GetRecordResponse::from_error("Failed to fetch classes", e),
        }
    }

    /// Call `/api/v1/classes/:id` to fetch a class with its tiers and participants.
    #[oai(
        path = "/api/v1/classes/:id",
        method = "get",
        tag = "ApiTags::Catalog",
        operation_id = "fetchClass"
    )]
    async fn fetch_class(&self, pool: Data<&Arc<sqlx::PgPool>>, id: Path<i64>) -> GetRecordResponse<ClassDetail> {
        let pool_arc = pool.clone();

        match ClassDetail::get(&pool_arc, id.0).await {
            Ok(detail) => GetRecordResponse::ok(detail),
            Err(e) => GetRecordResponse::from_error("Failed to fetch class", e),
        }
    }

    /// Call `/api/v1/classes` with a multipart form to create a class.
    #[oai(
        path = "/api/v1/classes",
        method = "post",
        tag = "ApiTags::Catalog",
        operation_id = "createClass"
    )]
    async fn create_class(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        form: ClassForm,
        token: CustomSecurityScheme,
    ) -> PostResponse<ClassDetail> {
        require_admin!(token, PostResponse<ClassDetail>);
        let pool_arc = pool.clone();

        match create_class_from_form(&pool_arc, &store, form).await {
            Ok(detail) => PostResponse::created(detail),
            Err(e) => PostResponse::from_error("Failed to create class", e),
        }
    }

    /// Call `/api/v1/classes/:id` with a multipart form to update a class.
    #[oai(
        path = "/api/v1/classes/:id",
        method = "put",
        tag = "ApiTags::Catalog",
        operation_id = "updateClass"
    )]
    async fn update_class(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        id: Path<i64>,
        form: ClassUpdateForm,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<ClassDetail> {
        require_admin!(token, GetRecordResponse<ClassDetail>);
        let pool_arc = pool.clone();

        match update_class_from_form(&pool_arc, &store, id.0, form).await {
            Ok(detail) => GetRecordResponse::ok(detail),
            Err(e) => GetRecordResponse::from_error("Failed to update class", e),
        }
    }

    /// Call `/api/v1/classes/:id` to delete a class and its files.
    #[oai(
        path = "/api/v1/classes/:id",
        method = "delete",
        tag = "ApiTags::Catalog",
        operation_id = "deleteClass"
    )]
    async fn delete_class(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        id: Path<i64>,
        token: CustomSecurityScheme,
    ) -> DeleteResponse {
        require_admin!(token, DeleteResponse);
        let pool_arc = pool.clone();

        match ClassDetail::delete(&pool_arc, id.0).await {
            Ok(row) => {
                for file in row.files() {
                    store.delete_quietly(&file);
                }
                DeleteResponse::no_content()
            }
            Err(e) => DeleteResponse::from_error("Failed to delete class", e),
        }
    }

    /// Call `/api/v1/classes/:id/image` to stream the class photo.
    #[oai(
        path = "/api/v1/classes/:id/image",
        method = "get",
        tag = "ApiTags::Catalog",
        operation_id = "fetchClassImage"
    )]
    async fn fetch_class_image(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        id: Path<i64>,
    ) -> FileResponse {
        let pool_arc = pool.clone();

        let photo = match ClassRow::get(&pool_arc, id.0).await {
            Ok(row) => row.photo,
            Err(e) => return FileResponse::from_error("Failed to fetch class image", e),
        };

        let photo = match photo {
            Some(photo) => photo,
            None => {
                let err = format!("Class {} has no image", id.0);
                warn!("{}", err);
                return FileResponse::not_found(err);
            }
        };

        match store.read(&photo) {
            Ok(bytes) => FileResponse::Ok(Binary(bytes), content_type_for(&photo).to_string()),
            Err(e) => FileResponse::from_error("Failed to read class image", e),
        }
    }

    /// Call `/api/v1/classes/:id/tickets` to fetch the ticket tiers of a class.
    #[oai(
        path = "/api/v1/classes/:id/tickets",
        method = "get",
        tag = "ApiTags::Catalog",
        operation_id = "fetchClassTickets"
    )]
    async fn fetch_class_tickets(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        id: Path<i64>,
    ) -> GetRecordResponse<Vec<TicketTier>> {
        let pool_arc = pool.clone();

        match TicketTier::for_class(&pool_arc, id.0).await {
            Ok(tiers) => GetRecordResponse::ok(tiers),
            Err(e) => GetRecordResponse::from_error("Failed to fetch ticket tiers", e),
        }
    }

    /// Call `/api/v1/classes/:id/participants` to fetch the participants of a class.
    #[oai(
        path = "/api/v1/classes/:id/participants",
        method = "get",
        tag = "ApiTags::Catalog",
        operation_id = "fetchParticipants"
    )]
    async fn fetch_participants(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        id: Path<i64>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<Vec<Participant>> {
        require_admin!(token, GetRecordResponse<Vec<Participant>>);
        let pool_arc = pool.clone();

        match Participant::for_class(&pool_arc, id.0).await {
            Ok(participants) => GetRecordResponse::ok(participants),
            Err(e) => GetRecordResponse::from_error("Failed to fetch participants", e),
        }
    }

    /// Call `/api/v1/classes/:id/participants` to register the current user for a class.
    #[oai(
        path = "/api/v1/classes/:id/participants",
        method = "post",
        tag = "ApiTags::Catalog",
        operation_id = "registerParticipant"
    )]
    async fn register_participant(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        id: Path<i64>,
        token: CustomSecurityScheme,
    ) -> PostResponse<Participant> {
        let pool_arc = pool.clone();

        match Participant::register(&pool_arc, id.0, token.user().id).await {
            Ok(participant) => PostResponse::created(participant),
            Err(e) => PostResponse::from_error("Failed to register for class", e),
        }
    }

    /// Call `/api/v1/public/classes` with query params to fetch published classes.
    #[oai(
        path = "/api/v1/public/classes",
        method = "get",
        tag = "ApiTags::Catalog",
        operation_id = "fetchPublicClasses"
    )]
    async fn fetch_public_classes(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        category: Query<Option<String>>,
        limit: Query<Option<i64>>,
        offset: Query<Option<i64>>,
    ) -> GetRecordResponse<Vec<PublicClass>> {
        let pool_arc = pool.clone();
        let category = crate::model::core::non_blank(category.0);

        match PublicClass::list(&pool_arc, category.as_deref(), limit.0, offset.0).await {
            Ok(classes) => GetRecordResponse::ok(classes),
            Err(e) => GetRecordResponse::from_error("Failed to fetch classes", e),
        }
    }

    /// Call `/api/v1/public/classes/:id` to fetch a class for the event page.
    #[oai(
        path = "/api/v1/public/classes/:id",
        method = "get",
        tag = "ApiTags::Catalog",
        operation_id = "fetchPublicClass"
    )]
    async fn fetch_public_class(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        id: Path<i64>,
    ) -> GetRecordResponse<PublicClass> {
        let pool_arc = pool.clone();

        match PublicClass::get(&pool_arc, id.0).await {
            Ok(class) => GetRecordResponse::ok(class),
            Err(e) => GetRecordResponse::from_error("Failed to fetch class", e),
        }
    }

    /// Call `/api/v1/tickets` with payload to create a ticket tier.
    #[oai(
        path = "/api/v1/tickets",
        method = "post",
        tag = "ApiTags::Catalog",
        operation_id = "createTicket"
    )]
    async fn create_ticket(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        payload: Json<TicketTierPayload>,
        token: CustomSecurityScheme,
    ) -> PostResponse<TicketTier> {
        require_admin!(token, PostResponse<TicketTier>);
        let pool_arc = pool.clone();
        let payload = payload.0;

        match TicketTier::insert(&pool_arc, &payload).await {
            Ok(tier) => PostResponse::created(tier),
            Err(e) => PostResponse::from_error("Failed to create ticket tier", e),
        }
    }

    /// Call `/api/v1/tickets/:id` to fetch a ticket tier.
    #[oai(
        path = "/api/v1/tickets/:id",
        method = "get",
        tag = "ApiTags::Catalog",
        operation_id = "fetchTicket"
    )]
    async fn fetch_ticket(&self, pool: Data<&Arc<sqlx::PgPool>>, id: Path<i64>) -> GetRecordResponse<TicketTier> {
        let pool_arc = pool.clone();

        match TicketTier::get(&pool_arc, id.0).await {
            Ok(tier) => GetRecordResponse::ok(tier),
            Err(e) => GetRecordResponse::from_error("Failed to fetch ticket tier", e),
        }
    }

    /// Call `/api/v1/tickets/:id` with payload to update a ticket tier.
    #[oai(
        path = "/api/v1/tickets/:id",
        method = "put",
        tag = "ApiTags::Catalog",
        operation_id = "updateTicket"
    )]
    async fn update_ticket(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        id: Path<i64>,
        payload: Json<TicketTierUpdate>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<TicketTier> {
        require_admin!(token, GetRecordResponse<TicketTier>);
        let pool_arc = pool.clone();
        let payload = payload.0;

        match TicketTier::update(&pool_arc, id.0, &payload).await {
            Ok(tier) => GetRecordResponse::ok(tier),
            Err(e) => GetRecordResponse::from_error("Failed to update ticket tier", e),
        }
    }

    /// Call `/api/v1/tickets/:id` to delete a ticket tier.
    #[oai(
        path = "/api/v1/tickets/:id",
        method = "delete",
        tag = "ApiTags::Catalog",
        operation_id = "deleteTicket"
    )]
    async fn delete_ticket(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        id: Path<i64>,
        token: CustomSecurityScheme,
    ) -> DeleteResponse {
        require_admin!(token, DeleteResponse);
        let pool_arc = pool.clone();

        match TicketTier::delete(&pool_arc, id.0).await {
            Ok(_) => DeleteResponse::no_content(),
            Err(e) => DeleteResponse::from_error("Failed to delete ticket tier", e),
        }
    }

    /// Call `/api/v1/tickets/:id/toggle-active` to flip whether a tier is on sale.
    #[oai(
        path = "/api/v1/tickets/:id/toggle-active",
        method = "put",
        tag = "ApiTags::Catalog",
        operation_id = "toggleTicket"
    )]
    async fn toggle_ticket(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        id: Path<i64>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<TicketTier> {
        require_admin!(token, GetRecordResponse<TicketTier>);
        let pool_arc = pool.clone();

        match TicketTier::toggle_active(&pool_arc, id.0).await {
            Ok(tier) => GetRecordResponse::ok(tier),
            Err(e) => GetRecordResponse::from_error("Failed to toggle ticket tier", e),
        }
    }

    /// Call `/api/v1/public/featured-events` to fetch the featured class ids.
    #[oai(
        path = "/api/v1/public/featured-events",
        method = "get",
        tag = "ApiTags::Catalog",
        operation_id = "fetchPublicFeaturedEvents"
    )]
    async fn fetch_public_featured_events(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
    ) -> GetRecordResponse<FeaturedEvents> {
        let pool_arc = pool.clone();

        match FeaturedEvents::get(&pool_arc).await {
            Ok(featured) => GetRecordResponse::ok(featured),
            Err(e) => {
                warn!("Serving an empty featured list: {}", e);
                GetRecordResponse::ok(FeaturedEvents {
                    selected_events: vec![],
                })
            }
        }
    }

    /// Call `/api/v1/featured-events` to fetch the featured class ids.
    #[oai(
        path = "/api/v1/featured-events",
        method = "get",
        tag = "ApiTags::Catalog",
        operation_id = "fetchFeaturedEvents"
    )]
    async fn fetch_featured_events(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<FeaturedEvents> {
        require_admin!(token, GetRecordResponse<FeaturedEvents>);
        let pool_arc = pool.clone();

        match FeaturedEvents::get(&pool_arc).await {
            Ok(featured) => GetRecordResponse::ok(featured),
            Err(e) => GetRecordResponse::from_error("Failed to fetch featured events", e),
        }
    }

    /// Call `/api/v1/featured-events` with payload to replace the featured class ids.
    #[oai(
        path = "/api/v1/featured-events",
        method = "post",
        tag = "ApiTags::Catalog",
        operation_id = "saveFeaturedEvents"
    )]
    async fn save_featured_events(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        payload: Json<FeaturedEventsPayload>,
        token: CustomSecurityScheme,
    ) -> PostResponse<FeaturedEventsSaved> {
        require_admin!(token, PostResponse<FeaturedEventsSaved>);
        let pool_arc = pool.clone();
        let ids = parse_event_ids(&payload.0.selected_events);

        match FeaturedEvents::save(&pool_arc, ids).await {
            Ok(saved) => PostResponse::created(FeaturedEventsSaved {
                message: "Featured events saved.".to_string(),
                count: saved.selected_events.len() as u64,
                selected_events: saved.selected_events,
            }),
            Err(e) => PostResponse::from_error("Failed to save featured events", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_photo_filename() {
        let name = profile_photo_filename(12, Some("Me.PNG")).unwrap();
        assert!(name.starts_with("profile_12_"));
        assert!(name.ends_with(".png"));
        // profile_12_ + 8 hex chars + .png
        assert_eq!(name.len(), "profile_12_".len() + 8 + 4);

        assert!(profile_photo_filename(12, Some("me.webp")).is_err());
        assert!(profile_photo_filename(12, None).is_err());
    }

    #[test]
    fn test_saved_class_files() {
        let root = tempfile::tempdir().unwrap();
        let store = UploadStore::new(root.path().to_path_buf());
        let photo = store.save_as(CLASS_PHOTO_SUBDIR, "a.jpg", b"x").unwrap();
        let gallery = store.save_as(GALLERY_SUBDIR, "b.jpg", b"y").unwrap();

        let saved = SavedClassFiles {
            photo: Some(photo.clone()),
            payment_qr: None,
            gallery: vec![gallery.clone()],
        };
        assert_eq!(saved.all(), vec![gallery.clone(), photo.clone()]);

        saved.discard(&store);
        assert!(!store.exists(&photo));
        assert!(!store.exists(&gallery));
    }
}
