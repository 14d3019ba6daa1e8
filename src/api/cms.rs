//! Marketing content routes: slides, page sections, partner logos, team and contact.

use super::auth::CustomSecurityScheme;
use super::schema::{
    ApiTags, DeleteResponse, ErrorResponse, FileForm, GetRecordResponse, PartnerLogoForm,
    PostResponse, ReceivedFile, SlideForm,
};
use crate::model::contact::{
    ContactHero, ContactItem, ContactItemPayload, ContactItemUpdate, ContactPage, FooterContact,
    FooterContactSaved, FooterContactStats,
};
use crate::model::content::{
    self, BulkOperation, ContentReset, Page, PageStats, PartnerLogoListing, PartnerLogoUploaded,
    SectionUpdate, SectionUpdated, PARTNER_LOGO_MAX_SIZE,
};
use crate::model::slide::{Slide, SlideKind, SlideStats, SlideUpdate, SlideUploaded, SlideView};
use crate::model::team::{TeamMember, TeamMemberPayload, TeamMemberUpdate, TeamPhotoUploaded};
use crate::model::util::{UploadStore, MB};
use crate::require_admin;
use poem::web::Data;
use poem_openapi::{param::Path, param::Query, payload::Json, OpenApi};
use serde_json::Value;
use std::sync::Arc;

pub const SLIDE_MAX_SIZE: usize = 10 * MB;
pub const TEAM_PHOTO_MAX_SIZE: usize = 5 * MB;

async fn upload_slide(
    pool: &sqlx::PgPool,
    store: &UploadStore,
    kind: SlideKind,
    user_id: i64,
    form: SlideForm,
) -> Result<SlideUploaded, anyhow::Error> {
    let file = ReceivedFile::read(form.file).await?;
    file.check_image(SLIDE_MAX_SIZE)?;

    Slide::upload(
        pool,
        store,
        kind,
        user_id,
        file.file_name.as_deref(),
        &file.bytes,
        form.description,
        form.order_position,
        form.crop_mode.as_deref().unwrap_or(""),
    )
    .await
}

async fn upload_team_photo(
    pool: &sqlx::PgPool,
    store: &UploadStore,
    id: i64,
    form: FileForm,
) -> Result<TeamPhotoUploaded, anyhow::Error> {
    let file = ReceivedFile::read(form.file).await?;
    file.check_image(TEAM_PHOTO_MAX_SIZE)?;
    TeamMember::upload_photo(pool, store, id, file.file_name.as_deref(), &file.bytes).await
}

async fn upload_partner_logo(form: PartnerLogoForm) -> Result<PartnerLogoUploaded, anyhow::Error> {
    let file = ReceivedFile::read(form.image).await?;
    file.check_image(PARTNER_LOGO_MAX_SIZE)?;
    content::save_partner_logo(
        &UploadStore::statics(),
        file.file_name.as_deref(),
        &file.bytes,
        form.partner_index,
    )
}

pub struct CmsApi;

#[OpenApi]
impl CmsApi {
    /// Call `/api/v1/admin/slides/:kind` to fetch every slide of a gallery, processing pending ones.
    #[oai(
        path = "/api/v1/admin/slides/:kind",
        method = "get",
        tag = "ApiTags::Content",
        operation_id = "fetchSlides"
    )]
    async fn fetch_slides(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        kind: Path<SlideKind>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<Vec<SlideView>> {
        require_admin!(token, GetRecordResponse<Vec<SlideView>>);
        let pool_arc = pool.clone();

        match Slide::list_processed(&pool_arc, &store, kind.0).await {
            Ok(slides) => GetRecordResponse::ok(slides.into_iter().map(SlideView::from).collect()),
            Err(e) => GetRecordResponse::from_error("Failed to fetch slides", e),
        }
    }

    /// Call `/api/v1/admin/slides/:kind` with a multipart form to upload a slide.
    #[oai(
        path = "/api/v1/admin/slides/:kind",
        method = "post",
        tag = "ApiTags::Content",
        operation_id = "uploadSlide"
    )]
    async fn upload_slide(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        kind: Path<SlideKind>,
        form: SlideForm,
        token: CustomSecurityScheme,
    ) -> PostResponse<SlideUploaded> {
        require_admin!(token, PostResponse<SlideUploaded>);
        let pool_arc = pool.clone();

        match upload_slide(&pool_arc, &store, kind.0, token.user().id, form).await {
            Ok(uploaded) => PostResponse::created(uploaded),
            Err(e) => PostResponse::from_error("Failed to upload slide", e),
        }
    }

    /// Call `/api/v1/admin/slides/:kind/stats` to count slides by state and orientation.
    #[oai(
        path = "/api/v1/admin/slides/:kind/stats",
        method = "get",
        tag = "ApiTags::Content",
        operation_id = "fetchSlideStats"
    )]
    async fn fetch_slide_stats(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        kind: Path<SlideKind>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<SlideStats> {
        require_admin!(token, GetRecordResponse<SlideStats>);
        let pool_arc = pool.clone();

        match Slide::stats(&pool_arc, kind.0).await {
            Ok(stats) => GetRecordResponse::ok(stats),
            Err(e) => GetRecordResponse::from_error("Failed to fetch slide stats", e),
        }
    }

    /// Call `/api/v1/admin/slides/:kind/:id` with payload to update a slide.
    #[oai(
        path = "/api/v1/admin/slides/:kind/:id",
        method = "put",
        tag = "ApiTags::Content",
        operation_id = "updateSlide"
    )]
    async fn update_slide(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        kind: Path<SlideKind>,
        id: Path<i64>,
        payload: Json<SlideUpdate>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<SlideUploaded> {
        require_admin!(token, GetRecordResponse<SlideUploaded>);
        let pool_arc = pool.clone();
        let payload = payload.0;

        match Slide::update(&pool_arc, &store, kind.0, id.0, &payload).await {
            Ok(updated) => GetRecordResponse::ok(updated),
            Err(e) => GetRecordResponse::from_error("Failed to update slide", e),
        }
    }

    /// Call `/api/v1/admin/slides/:kind/:id/reprocess` to process the stored image again.
    #[oai(
        path = "/api/v1/admin/slides/:kind/:id/reprocess",
        method = "put",
        tag = "ApiTags::Content",
        operation_id = "reprocessSlide"
    )]
    async fn reprocess_slide(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        kind: Path<SlideKind>,
        id: Path<i64>,
        crop_mode: Query<Option<String>>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<SlideUploaded> {
        require_admin!(token, GetRecordResponse<SlideUploaded>);
        let pool_arc = pool.clone();

        match Slide::reprocess(&pool_arc, &store, kind.0, id.0, crop_mode.0.as_deref()).await {
            Ok(updated) => GetRecordResponse::ok(updated),
            Err(e) => GetRecordResponse::from_error("Failed to reprocess slide", e),
        }
    }

    /// Call `/api/v1/admin/slides/:kind/:id` to delete a slide and its file.
    #[oai(
        path = "/api/v1/admin/slides/:kind/:id",
        method = "delete",
        tag = "ApiTags::Content",
        operation_id = "deleteSlide"
    )]
    async fn delete_slide(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        kind: Path<SlideKind>,
        id: Path<i64>,
        token: CustomSecurityScheme,
    ) -> DeleteResponse {
        require_admin!(token, DeleteResponse);
        let pool_arc = pool.clone();

        match Slide::delete(&pool_arc, &store, kind.0, id.0).await {
            Ok(_) => DeleteResponse::no_content(),
            Err(e) => DeleteResponse::from_error("Failed to delete slide", e),
        }
    }

    /// Call `/api/v1/public/slides/:kind` to fetch the active slides of a gallery.
    #[oai(
        path = "/api/v1/public/slides/:kind",
        method = "get",
        tag = "ApiTags::Content",
        operation_id = "fetchPublicSlides"
    )]
    async fn fetch_public_slides(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        kind: Path<SlideKind>,
    ) -> GetRecordResponse<Vec<SlideView>> {
        let pool_arc = pool.clone();

        match Slide::list_active(&pool_arc, kind.0).await {
            Ok(slides) => GetRecordResponse::ok(slides.into_iter().map(SlideView::from).collect()),
            Err(e) => GetRecordResponse::from_error("Failed to fetch slides", e),
        }
    }

    /// Call `/api/v1/admin/pages/:page` to fetch the editable content of a page.
    #[oai(
        path = "/api/v1/admin/pages/:page",
        method = "get",
        tag = "ApiTags::Content",
        operation_id = "fetchPage"
    )]
    async fn fetch_page(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        page: Path<Page>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<Value> {
        require_admin!(token, GetRecordResponse<Value>);
        let pool_arc = pool.clone();

        match content::get_page(&pool_arc, page.0).await {
            Ok(content) => GetRecordResponse::ok(Value::Object(content)),
            Err(e) => GetRecordResponse::from_error("Failed to fetch page", e),
        }
    }

    /// Call `/api/v1/public/pages/:page` to fetch the content of a page for visitors.
    #[oai(
        path = "/api/v1/public/pages/:page",
        method = "get",
        tag = "ApiTags::Content",
        operation_id = "fetchPublicPage"
    )]
    async fn fetch_public_page(&self, pool: Data<&Arc<sqlx::PgPool>>, page: Path<Page>) -> GetRecordResponse<Value> {
        let pool_arc = pool.clone();

        match content::get_public_page(&pool_arc, page.0).await {
            Ok(content) => GetRecordResponse::ok(Value::Object(content)),
            Err(e) => GetRecordResponse::from_error("Failed to fetch page", e),
        }
    }

    /// Call `/api/v1/admin/pages/:page` with `{section, data}` to save one section.
    #[oai(
        path = "/api/v1/admin/pages/:page",
        method = "put",
        tag = "ApiTags::Content",
        operation_id = "updatePageSection"
    )]
    async fn update_page_section(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        page: Path<Page>,
        payload: Json<SectionUpdate>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<SectionUpdated> {
        require_admin!(token, GetRecordResponse<SectionUpdated>);
        let pool_arc = pool.clone();
        let payload = payload.0;

        match content::update_section(&pool_arc, page.0, &payload).await {
            Ok(updated) => GetRecordResponse::ok(updated),
            Err(e) => GetRecordResponse::from_error("Failed to update section", e),
        }
    }

    /// Call `/api/v1/admin/pages/:page/reset` to drop stored content of a page or one section.
    #[oai(
        path = "/api/v1/admin/pages/:page/reset",
        method = "delete",
        tag = "ApiTags::Content",
        operation_id = "resetPage"
    )]
    async fn reset_page(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        page: Path<Page>,
        section: Query<Option<String>>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<ContentReset> {
        require_admin!(token, GetRecordResponse<ContentReset>);
        let pool_arc = pool.clone();
        let section = crate::model::core::non_blank(section.0);

        match content::reset(&pool_arc, page.0, section.as_deref()).await {
            Ok(reset) => GetRecordResponse::ok(reset),
            Err(e) => GetRecordResponse::from_error("Failed to reset page", e),
        }
    }

    /// Call `/api/v1/admin/pages/:page/stats` to count stored content of a page.
    #[oai(
        path = "/api/v1/admin/pages/:page/stats",
        method = "get",
        tag = "ApiTags::Content",
        operation_id = "fetchPageStats"
    )]
    async fn fetch_page_stats(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        page: Path<Page>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<PageStats> {
        require_admin!(token, GetRecordResponse<PageStats>);
        let pool_arc = pool.clone();

        match content::stats(&pool_arc, page.0).await {
            Ok(stats) => GetRecordResponse::ok(stats),
            Err(e) => GetRecordResponse::from_error("Failed to fetch page stats", e),
        }
    }

    /// Call `/api/v1/admin/pages/:page/bulk?operation=export|import|validate`.
    /// The body is only read by `import`.
    #[oai(
        path = "/api/v1/admin/pages/:page/bulk",
        method = "post",
        tag = "ApiTags::Content",
        operation_id = "bulkPageContent"
    )]
    async fn bulk_page_content(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        page: Path<Page>,
        operation: Query<BulkOperation>,
        payload: Json<Value>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<Value> {
        require_admin!(token, GetRecordResponse<Value>);
        let pool_arc = pool.clone();

        match content::bulk(&pool_arc, page.0, operation.0, Some(payload.0)).await {
            Ok(result) => GetRecordResponse::ok(result),
            Err(e) => GetRecordResponse::from_error("Failed to run bulk operation", e),
        }
    }

    /// Call `/api/v1/admin/partners/logo` with a multipart `image` to upload a partner logo.
    #[oai(
        path = "/api/v1/admin/partners/logo",
        method = "post",
        tag = "ApiTags::Content",
        operation_id = "uploadPartnerLogo"
    )]
    async fn upload_partner_logo(
        &self,
        form: PartnerLogoForm,
        token: CustomSecurityScheme,
    ) -> PostResponse<PartnerLogoUploaded> {
        require_admin!(token, PostResponse<PartnerLogoUploaded>);

        match upload_partner_logo(form).await {
            Ok(uploaded) => PostResponse::created(uploaded),
            Err(e) => PostResponse::from_error("Failed to upload partner logo", e),
        }
    }

    /// Call `/api/v1/admin/partners/logos` to list the uploaded partner logos.
    #[oai(
        path = "/api/v1/admin/partners/logos",
        method = "get",
        tag = "ApiTags::Content",
        operation_id = "fetchPartnerLogos"
    )]
    async fn fetch_partner_logos(&self, token: CustomSecurityScheme) -> GetRecordResponse<PartnerLogoListing> {
        require_admin!(token, GetRecordResponse<PartnerLogoListing>);

        match content::list_partner_logos(&UploadStore::statics()) {
            Ok(listing) => GetRecordResponse::ok(listing),
            Err(e) => GetRecordResponse::from_error("Failed to list partner logos", e),
        }
    }

    /// Call `/api/v1/admin/team` to fetch all team members.
    #[oai(
        path = "/api/v1/admin/team",
        method = "get",
        tag = "ApiTags::Content",
        operation_id = "fetchTeam"
    )]
    async fn fetch_team(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<Vec<TeamMember>> {
        require_admin!(token, GetRecordResponse<Vec<TeamMember>>);
        let pool_arc = pool.clone();

        match TeamMember::list(&pool_arc, false).await {
            Ok(members) => GetRecordResponse::ok(members),
            Err(e) => GetRecordResponse::from_error("Failed to fetch team", e),
        }
    }

    /// Call `/api/v1/public/team` to fetch the active team members.
    #[oai(
        path = "/api/v1/public/team",
        method = "get",
        tag = "ApiTags::Content",
        operation_id = "fetchPublicTeam"
    )]
    async fn fetch_public_team(&self, pool: Data<&Arc<sqlx::PgPool>>) -> GetRecordResponse<Vec<TeamMember>> {
        let pool_arc = pool.clone();

        match TeamMember::list(&pool_arc, true).await {
            Ok(members) => GetRecordResponse::ok(members),
            Err(e) => GetRecordResponse::from_error("Failed to fetch team", e),
        }
    }

    /// Call `/api/v1/admin/team` with payload to add a team member.
    #[oai(
        path = "/api/v1/admin/team",
        method = "post",
        tag = "ApiTags::Content",
        operation_id = "createTeamMember"
    )]
    async fn create_team_member(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        payload: Json<TeamMemberPayload>,
        token: CustomSecurityScheme,
    ) -> PostResponse<TeamMember> {
        require_admin!(token, PostResponse<TeamMember>);
        let pool_arc = pool.clone();
        let payload = payload.0;

        match TeamMember::create(&pool_arc, &payload).await {
            Ok(member) => PostResponse::created(member),
            Err(e) => PostResponse::from_error("Failed to create team member", e),
        }
    }

    /// Call `/api/v1/admin/team/:id` with payload to update a team member.
    #[oai(
        path = "/api/v1/admin/team/:id",
        method = "put",
        tag = "ApiTags::Content",
        operation_id = "updateTeamMember"
    )]
    async fn update_team_member(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        id: Path<i64>,
        payload: Json<TeamMemberUpdate>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<TeamMember> {
        require_admin!(token, GetRecordResponse<TeamMember>);
        let pool_arc = pool.clone();
        let payload = payload.0;

        match TeamMember::update(&pool_arc, id.0, &payload).await {
            Ok(member) => GetRecordResponse::ok(member),
            Err(e) => GetRecordResponse::from_error("Failed to update team member", e),
        }
    }

    /// Call `/api/v1/admin/team/:id` to delete a team member and the photo.
    #[oai(
        path = "/api/v1/admin/team/:id",
        method = "delete",
        tag = "ApiTags::Content",
        operation_id = "deleteTeamMember"
    )]
    async fn delete_team_member(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        id: Path<i64>,
        token: CustomSecurityScheme,
    ) -> DeleteResponse {
        require_admin!(token, DeleteResponse);
        let pool_arc = pool.clone();

        match TeamMember::delete(&pool_arc, &store, id.0).await {
            Ok(_) => DeleteResponse::no_content(),
            Err(e) => DeleteResponse::from_error("Failed to delete team member", e),
        }
    }

    /// Call `/api/v1/admin/team/:id/photo` with a multipart `file` to set the portrait.
    #[oai(
        path = "/api/v1/admin/team/:id/photo",
        method = "post",
        tag = "ApiTags::Content",
        operation_id = "uploadTeamPhoto"
    )]
    async fn upload_team_photo(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        id: Path<i64>,
        form: FileForm,
        token: CustomSecurityScheme,
    ) -> PostResponse<TeamPhotoUploaded> {
        require_admin!(token, PostResponse<TeamPhotoUploaded>);
        let pool_arc = pool.clone();

        match upload_team_photo(&pool_arc, &store, id.0, form).await {
            Ok(uploaded) => PostResponse::created(uploaded),
            Err(e) => PostResponse::from_error("Failed to upload team photo", e),
        }
    }

    /// Call `/api/v1/admin/team/:id/photo` to remove the portrait.
    #[oai(
        path = "/api/v1/admin/team/:id/photo",
        method = "delete",
        tag = "ApiTags::Content",
        operation_id = "deleteTeamPhoto"
    )]
    async fn delete_team_photo(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        id: Path<i64>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<TeamMember> {
        require_admin!(token, GetRecordResponse<TeamMember>);
        let pool_arc = pool.clone();

        match TeamMember::delete_photo(&pool_arc, &store, id.0).await {
            Ok(member) => GetRecordResponse::ok(member),
            Err(e) => GetRecordResponse::from_error("Failed to delete team photo", e),
        }
    }

    /// Call `/api/v1/admin/contact` to fetch the contact page as stored.
    #[oai(
        path = "/api/v1/admin/contact",
        method = "get",
        tag = "ApiTags::Content",
        operation_id = "fetchContact"
    )]
    async fn fetch_contact(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<ContactPage> {
        require_admin!(token, GetRecordResponse<ContactPage>);
        let pool_arc = pool.clone();

        match ContactPage::get(&pool_arc).await {
            Ok(page) => GetRecordResponse::ok(page),
            Err(e) => GetRecordResponse::from_error("Failed to fetch contact page", e),
        }
    }

    /// Call `/api/v1/admin/contact/hero` with payload to update the contact hero.
    #[oai(
        path = "/api/v1/admin/contact/hero",
        method = "put",
        tag = "ApiTags::Content",
        operation_id = "updateContactHero"
    )]
    async fn update_contact_hero(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        payload: Json<ContactHero>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<ContactHero> {
        require_admin!(token, GetRecordResponse<ContactHero>);
        let pool_arc = pool.clone();

        match ContactHero::save(&pool_arc, payload.0).await {
            Ok(hero) => GetRecordResponse::ok(hero),
            Err(e) => GetRecordResponse::from_error("Failed to update contact hero", e),
        }
    }

    /// Call `/api/v1/admin/contact/items` to fetch all contact items.
    #[oai(
        path = "/api/v1/admin/contact/items",
        method = "get",
        tag = "ApiTags::Content",
        operation_id = "fetchContactItems"
    )]
    async fn fetch_contact_items(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<Vec<ContactItem>> {
        require_admin!(token, GetRecordResponse<Vec<ContactItem>>);
        let pool_arc = pool.clone();

        match ContactItem::list(&pool_arc).await {
            Ok(items) => GetRecordResponse::ok(items),
            Err(e) => GetRecordResponse::from_error("Failed to fetch contact items", e),
        }
    }

    /// Call `/api/v1/admin/contact/items` with payload to add a contact item.
    #[oai(
        path = "/api/v1/admin/contact/items",
        method = "post",
        tag = "ApiTags::Content",
        operation_id = "createContactItem"
    )]
    async fn create_contact_item(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        payload: Json<ContactItemPayload>,
        token: CustomSecurityScheme,
    ) -> PostResponse<ContactItem> {
        require_admin!(token, PostResponse<ContactItem>);
        let pool_arc = pool.clone();
        let payload = payload.0;

        match ContactItem::create(&pool_arc, &payload).await {
            Ok(item) => PostResponse::created(item),
            Err(e) => PostResponse::from_error("Failed to create contact item", e),
        }
    }

    /// Call `/api/v1/admin/contact/items/:id` with payload to update a contact item.
    #[oai(
        path = "/api/v1/admin/contact/items/:id",
        method = "put",
        tag = "ApiTags::Content",
        operation_id = "updateContactItem"
    )]
    async fn update_contact_item(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        id: Path<i64>,
        payload: Json<ContactItemUpdate>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<ContactItem> {
        require_admin!(token, GetRecordResponse<ContactItem>);
        let pool_arc = pool.clone();
        let payload = payload.0;

        match ContactItem::update(&pool_arc, id.0, &payload).await {
            Ok(item) => GetRecordResponse::ok(item),
            Err(e) => GetRecordResponse::from_error("Failed to update contact item", e),
        }
    }

    /// Call `/api/v1/admin/contact/items/:id` to delete a contact item.
    #[oai(
        path = "/api/v1/admin/contact/items/:id",
        method = "delete",
        tag = "ApiTags::Content",
        operation_id = "deleteContactItem"
    )]
    async fn delete_contact_item(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        id: Path<i64>,
        token: CustomSecurityScheme,
    ) -> DeleteResponse {
        require_admin!(token, DeleteResponse);
        let pool_arc = pool.clone();

        match ContactItem::delete(&pool_arc, id.0).await {
            Ok(_) => DeleteResponse::no_content(),
            Err(e) => DeleteResponse::from_error("Failed to delete contact item", e),
        }
    }

    /// Call `/api/v1/admin/contact/reset` to restore the default contact page.
    #[oai(
        path = "/api/v1/admin/contact/reset",
        method = "delete",
        tag = "ApiTags::Content",
        operation_id = "resetContact"
    )]
    async fn reset_contact(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<ContentReset> {
        require_admin!(token, GetRecordResponse<ContentReset>);
        let pool_arc = pool.clone();

        match ContactPage::reset(&pool_arc).await {
            Ok(reset) => GetRecordResponse::ok(reset),
            Err(e) => GetRecordResponse::from_error("Failed to reset contact page", e),
        }
    }

    /// Call `/api/v1/public/contact` to fetch the contact page, defaults included.
    #[oai(
        path = "/api/v1/public/contact",
        method = "get",
        tag = "ApiTags::Content",
        operation_id = "fetchPublicContact"
    )]
    async fn fetch_public_contact(&self, pool: Data<&Arc<sqlx::PgPool>>) -> GetRecordResponse<ContactPage> {
        let pool_arc = pool.clone();
        GetRecordResponse::ok(ContactPage::get_public(&pool_arc).await)
    }

    /// Call `/api/v1/admin/footer-contact` to fetch the footer contact block.
    #[oai(
        path = "/api/v1/admin/footer-contact",
        method = "get",
        tag = "ApiTags::Content",
        operation_id = "fetchFooterContact"
    )]
    async fn fetch_footer_contact(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<FooterContact> {
        require_admin!(token, GetRecordResponse<FooterContact>);
        let pool_arc = pool.clone();

        match FooterContact::get(&pool_arc).await {
            Ok(footer) => GetRecordResponse::ok(footer),
            Err(e) => GetRecordResponse::from_error("Failed to fetch footer contact", e),
        }
    }

    /// Call `/api/v1/admin/footer-contact` with payload to save the footer contact block.
    #[oai(
        path = "/api/v1/admin/footer-contact",
        method = "put",
        tag = "ApiTags::Content",
        operation_id = "saveFooterContact"
    )]
    async fn save_footer_contact(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        payload: Json<FooterContact>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<FooterContactSaved> {
        require_admin!(token, GetRecordResponse<FooterContactSaved>);
        let pool_arc = pool.clone();

        match FooterContact::save(&pool_arc, payload.0).await {
            Ok(saved) => GetRecordResponse::ok(saved),
            Err(e) => GetRecordResponse::from_error("Failed to save footer contact", e),
        }
    }

    /// Call `/api/v1/admin/footer-contact/reset` to fall back to the default footer.
    #[oai(
        path = "/api/v1/admin/footer-contact/reset",
        method = "delete",
        tag = "ApiTags::Content",
        operation_id = "resetFooterContact"
    )]
    async fn reset_footer_contact(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<ContentReset> {
        require_admin!(token, GetRecordResponse<ContentReset>);
        let pool_arc = pool.clone();

        match FooterContact::reset(&pool_arc).await {
            Ok(reset) => GetRecordResponse::ok(reset),
            Err(e) => GetRecordResponse::from_error("Failed to reset footer contact", e),
        }
    }

    /// Call `/api/v1/admin/footer-contact/stats` to summarise the footer contact block.
    #[oai(
        path = "/api/v1/admin/footer-contact/stats",
        method = "get",
        tag = "ApiTags::Content",
        operation_id = "fetchFooterContactStats"
    )]
    async fn fetch_footer_contact_stats(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<FooterContactStats> {
        require_admin!(token, GetRecordResponse<FooterContactStats>);
        let pool_arc = pool.clone();

        match FooterContact::stats(&pool_arc).await {
            Ok(stats) => GetRecordResponse::ok(stats),
            Err(e) => GetRecordResponse::from_error("Failed to fetch footer contact stats", e),
        }
    }

    /// Call `/api/v1/public/footer-contact` to fetch the footer contact block, defaults included.
    #[oai(
        path = "/api/v1/public/footer-contact",
        method = "get",
        tag = "ApiTags::Content",
        operation_id = "fetchPublicFooterContact"
    )]
    async fn fetch_public_footer_contact(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
    ) -> GetRecordResponse<FooterContact> {
        let pool_arc = pool.clone();
        GetRecordResponse::ok(FooterContact::get_public(&pool_arc).await)
    }
}
