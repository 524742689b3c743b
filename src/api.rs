//! JSON endpoints under `/api`.

use {
    crate::{
        email::notify_rsvp,
        error::Error,
        model::{AddGuestParams, StatsQuery, SubmitRsvpParams, UpdateRsvpParams},
        state::AppState,
        store::{
            ATTENDANCE_REQUIRED_MESSAGE, GUEST_NOT_FOUND_MESSAGE, INVALID_INVITE_MESSAGE,
            NAME_REQUIRED_MESSAGE, RSVP_NOT_FOUND_MESSAGE,
        },
    },
    actix_web::{web, HttpResponse},
    serde::de::DeserializeOwned,
    serde_json::{json, Value},
};

static UPDATE_FLAG_MESSAGE: &str = "isAttending must be a boolean";

pub fn config(config: &mut web::ServiceConfig) {
    config.service(
        web::scope("/api")
            .app_data(json_config())
            .service(
                web::resource("/guests")
                    .route(web::get().to(list_guests))
                    .route(web::post().to(create_guest))
                    .route(web::delete().to(clear_all)),
            )
            .service(web::resource("/guests/{id}").route(web::delete().to(delete_guest)))
            .service(
                web::resource("/rsvp")
                    .route(web::get().to(list_rsvps))
                    .route(web::post().to(legacy_rsvp)),
            )
            .service(
                web::resource("/rsvp/invite/{code}")
                    .route(web::get().to(invite_status))
                    .route(web::post().to(submit_invite)),
            )
            .service(
                web::resource("/rsvp/{id}")
                    .route(web::get().to(get_rsvp))
                    .route(web::put().to(update_rsvp))
                    .route(web::delete().to(delete_rsvp)),
            )
            .service(web::resource("/export/guests.csv").route(web::get().to(export_guests))),
    );
}

/// Body parse failures get the same `{error}` shape as everything else
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|error, _req| {
        Error::Validation(format!("Invalid request body: {}", error)).into()
    })
}

/// A field of the wrong type gets the handler's own message instead of a parse error
fn fields<T: DeserializeOwned>(body: Value, message: &str) -> Result<T, Error> {
    serde_json::from_value(body).map_err(|_| Error::Validation(message.to_string()))
}

fn required(value: String, what: &str) -> Result<String, Error> {
    let value = value.trim().to_string();
    if value.is_empty() {
        Err(Error::Validation(format!("{} is required", what)))
    } else {
        Ok(value)
    }
}

async fn list_guests(state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(state.store.list_guests().await?))
}

async fn create_guest(
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<HttpResponse, Error> {
    let params: AddGuestParams = fields(body.into_inner(), NAME_REQUIRED_MESSAGE)?;
    let name = params.name.unwrap_or_default();
    let guest = state.store.create_guest(&name).await?;
    Ok(HttpResponse::Created().json(guest))
}

async fn clear_all(state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    state.store.clear_all().await?;
    Ok(HttpResponse::Ok().json(json!({"message": "All guests and RSVPs cleared"})))
}

async fn delete_guest(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let id = required(id.into_inner(), "Guest ID")?;
    if !state.store.delete_guest(&id).await? {
        return Err(Error::NotFound(GUEST_NOT_FOUND_MESSAGE.to_string()));
    }
    Ok(HttpResponse::Ok().json(json!({"message": "Guest deleted successfully"})))
}

async fn list_rsvps(
    state: web::Data<AppState>,
    query: web::Query<StatsQuery>,
) -> Result<HttpResponse, Error> {
    if query.stats.as_deref() == Some("true") {
        return Ok(HttpResponse::Ok().json(state.store.stats().await?));
    }
    Ok(HttpResponse::Ok().json(state.store.list_rsvps().await?))
}

async fn legacy_rsvp() -> Result<HttpResponse, Error> {
    Err(Error::Deprecated)
}

async fn invite_status(
    state: web::Data<AppState>,
    code: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let code = required(code.into_inner(), "Invite code")?.to_uppercase();
    match state.store.invite_status(&code).await? {
        Some(status) => Ok(HttpResponse::Ok().json(status)),
        None => Err(Error::NotFound(INVALID_INVITE_MESSAGE.to_string())),
    }
}

async fn submit_invite(
    state: web::Data<AppState>,
    code: web::Path<String>,
    body: web::Json<Value>,
) -> Result<HttpResponse, Error> {
    let code = required(code.into_inner(), "Invite code")?.to_uppercase();
    let params: SubmitRsvpParams = fields(body.into_inner(), ATTENDANCE_REQUIRED_MESSAGE)?;
    let is_attending = params
        .is_attending
        .ok_or_else(|| Error::Validation(ATTENDANCE_REQUIRED_MESSAGE.to_string()))?;
    let rsvp = state.store.submit_invite_rsvp(&code, is_attending).await?;
    if let Some(email) = &state.email {
        notify_rsvp(email, &rsvp, state.store.export_csv().await).await;
    }
    Ok(HttpResponse::Created().json(rsvp))
}

async fn get_rsvp(state: web::Data<AppState>, id: web::Path<String>) -> Result<HttpResponse, Error> {
    let id = required(id.into_inner(), "RSVP ID")?;
    match state.store.get_rsvp_by_id(&id).await? {
        Some(rsvp) => Ok(HttpResponse::Ok().json(rsvp)),
        None => Err(Error::NotFound(RSVP_NOT_FOUND_MESSAGE.to_string())),
    }
}

async fn update_rsvp(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<Value>,
) -> Result<HttpResponse, Error> {
    let id = required(id.into_inner(), "RSVP ID")?;
    let body = body.into_inner();
    // present but null is not the same as absent
    if body.get("isAttending").map_or(false, Value::is_null) {
        return Err(Error::Validation(UPDATE_FLAG_MESSAGE.to_string()));
    }
    let params: UpdateRsvpParams = fields(body, UPDATE_FLAG_MESSAGE)?;
    match state.store.update_rsvp(&id, params.is_attending).await? {
        Some(rsvp) => Ok(HttpResponse::Ok().json(rsvp)),
        None => Err(Error::NotFound(RSVP_NOT_FOUND_MESSAGE.to_string())),
    }
}

async fn delete_rsvp(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let id = required(id.into_inner(), "RSVP ID")?;
    if !state.store.delete_rsvp(&id).await? {
        return Err(Error::NotFound(RSVP_NOT_FOUND_MESSAGE.to_string()));
    }
    Ok(HttpResponse::Ok().json(json!({"message": "RSVP deleted successfully"})))
}

async fn export_guests(state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let report = state.store.export_csv().await?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(("Content-Disposition", "attachment; filename=\"guests.csv\""))
        .body(report))
}
