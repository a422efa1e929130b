//! Catalogue endpoints.
//!
//! ```text
//! GET    /api/v1/titles
//! GET    /api/v1/titles/{titleId}
//! POST   /api/v1/titles        {"name":"Matilda","totalCopies":3}
//! PUT    /api/v1/titles/{titleId}
//! DELETE /api/v1/titles/{titleId}
//! ```
//!
//! Reads are public. Writes require the catalogue management capability.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{NewTitle, TitleUpdate};
use crate::domain::{
    Capability, Error, Title, TitleDetails, TitleDetailsDraft, TitleValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::require_capability;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, empty_name_error, parse_copy_count, parse_title_id,
};

const TITLE_ID_FIELD: FieldName = FieldName::new("titleId");
const NAME_FIELD: FieldName = FieldName::new("name");
const TOTAL_FIELD: FieldName = FieldName::new("totalCopies");

/// Request body for creating or replacing a title.
///
/// `totalCopies` is signed so that negative input reaches validation rather
/// than failing deserialisation.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TitlePayload {
    #[schema(example = "Matilda")]
    pub name: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[schema(example = 3)]
    pub total_copies: i64,
}

impl TitlePayload {
    fn into_parts(self) -> ApiResult<(TitleDetails, u32)> {
        let total = parse_copy_count(self.total_copies, TOTAL_FIELD)?;
        let details = TitleDetails::new(TitleDetailsDraft {
            name: self.name,
            author: self.author,
            publisher: self.publisher,
            isbn: self.isbn,
            category: self.category,
        })
        .map_err(map_title_validation_error)?;
        Ok((details, total))
    }
}

fn map_title_validation_error(err: TitleValidationError) -> Error {
    match err {
        TitleValidationError::EmptyName => empty_name_error(NAME_FIELD),
        other => Error::invalid_request(other.to_string()),
    }
}

/// Title as returned to clients.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TitleResponse {
    pub id: String,
    pub name: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    /// Copies owned.
    pub total_copies: u32,
    /// Copies on the shelf.
    pub available_copies: u32,
}

impl From<Title> for TitleResponse {
    fn from(title: Title) -> Self {
        let details = title.details();
        Self {
            id: title.id().to_string(),
            name: details.name().to_owned(),
            author: details.author().map(str::to_owned),
            publisher: details.publisher().map(str::to_owned),
            isbn: details.isbn().map(str::to_owned),
            category: details.category().map(str::to_owned),
            total_copies: title.copies().total(),
            available_copies: title.copies().available(),
        }
    }
}

/// List the catalogue ordered by name.
#[utoipa::path(
    get,
    path = "/api/v1/titles",
    responses(
        (status = 200, description = "Catalogue", body = [TitleResponse]),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["titles"],
    operation_id = "listTitles",
    security([])
)]
#[get("/titles")]
pub async fn list_titles(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<TitleResponse>>> {
    let titles = state.catalogue_query.list().await?;
    Ok(web::Json(
        titles.into_iter().map(TitleResponse::from).collect(),
    ))
}

/// Fetch a single title with its copy counters.
#[utoipa::path(
    get,
    path = "/api/v1/titles/{titleId}",
    params(("titleId" = String, Path, description = "Title identifier")),
    responses(
        (status = 200, description = "Title", body = TitleResponse),
        (status = 400, description = "Malformed title id", body = ErrorSchema),
        (status = 404, description = "Unknown title", body = ErrorSchema)
    ),
    tags = ["titles"],
    operation_id = "getTitle",
    security([])
)]
#[get("/titles/{title_id}")]
pub async fn get_title(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<TitleResponse>> {
    let title_id = parse_title_id(&path, TITLE_ID_FIELD)?;
    let title = state.catalogue_query.get(title_id).await?;
    Ok(web::Json(TitleResponse::from(title)))
}

/// Catalogue a new title; every copy starts on the shelf.
#[utoipa::path(
    post,
    path = "/api/v1/titles",
    request_body = TitlePayload,
    responses(
        (status = 201, description = "Title created", body = TitleResponse),
        (status = 400, description = "Invalid payload", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema)
    ),
    tags = ["titles"],
    operation_id = "createTitle",
    security(("SessionCookie" = []))
)]
#[post("/titles")]
pub async fn create_title(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<TitlePayload>,
) -> ApiResult<HttpResponse> {
    require_capability(&session, Capability::ManageCatalogue)?;
    let (details, total) = payload.into_inner().into_parts()?;
    let title = state.catalogue.create(NewTitle { details, total }).await?;
    Ok(HttpResponse::Created().json(TitleResponse::from(title)))
}

/// Replace a title's metadata and total.
///
/// Availability shifts by the change in total and is clamped to
/// `[0, totalCopies]`.
#[utoipa::path(
    put,
    path = "/api/v1/titles/{titleId}",
    params(("titleId" = String, Path, description = "Title identifier")),
    request_body = TitlePayload,
    responses(
        (status = 200, description = "Title updated", body = TitleResponse),
        (status = 400, description = "Invalid payload", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema),
        (status = 404, description = "Unknown title", body = ErrorSchema)
    ),
    tags = ["titles"],
    operation_id = "updateTitle",
    security(("SessionCookie" = []))
)]
#[put("/titles/{title_id}")]
pub async fn update_title(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<TitlePayload>,
) -> ApiResult<web::Json<TitleResponse>> {
    require_capability(&session, Capability::ManageCatalogue)?;
    let title_id = parse_title_id(&path, TITLE_ID_FIELD)?;
    let (details, total) = payload.into_inner().into_parts()?;
    let title = state
        .catalogue
        .update(title_id, TitleUpdate { details, total })
        .await?;
    Ok(web::Json(TitleResponse::from(title)))
}

/// Remove a title that has never been lent.
#[utoipa::path(
    delete,
    path = "/api/v1/titles/{titleId}",
    params(("titleId" = String, Path, description = "Title identifier")),
    responses(
        (status = 204, description = "Title removed"),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema),
        (status = 404, description = "Unknown title", body = ErrorSchema),
        (status = 409, description = "Title has loan history", body = ErrorSchema)
    ),
    tags = ["titles"],
    operation_id = "deleteTitle",
    security(("SessionCookie" = []))
)]
#[delete("/titles/{title_id}")]
pub async fn delete_title(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    require_capability(&session, Capability::ManageCatalogue)?;
    let title_id = parse_title_id(&path, TITLE_ID_FIELD)?;
    state.catalogue.delete(title_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests;
