//! Server-rendered pages for guests and the admin.

use {
    crate::{
        email::notify_rsvp,
        error::Error,
        model::{AttendParams, CodeParams, Database, NameParams},
        state::AppState,
        store::{ATTENDANCE_REQUIRED_MESSAGE, GUEST_NOT_FOUND_MESSAGE},
    },
    actix_web::{http::header, web, HttpResponse, ResponseError},
    log::error,
    serde_json::{json, Value},
};

static NOT_FOUND_MESSAGE: &str = "Your invite code was not found, sorry!";

pub fn config(config: &mut web::ServiceConfig) {
    config
        .service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/invite").route(web::get().to(find_invite)))
        .service(
            web::resource("/invite/{code}")
                .route(web::get().to(show_invite))
                .route(web::post().to(handle_rsvp)),
        )
        .service(web::resource("/admin").route(web::get().to(admin)))
        .service(web::resource("/admin/guests").route(web::post().to(admin_add_guest)))
        .service(
            web::resource("/admin/guests/{id}/delete").route(web::post().to(admin_delete_guest)),
        )
        .service(web::resource("/admin/clear").route(web::post().to(admin_clear)));
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type("text/html").body(body)
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Storage and rendering failures get a page instead of a JSON body
fn error_page(state: &AppState, error: Error) -> Result<HttpResponse, Error> {
    let status = error.status_code();
    error!("Page request failed: {}", error);
    let ctx = json!({"status": status.as_u16(), "error": error.public_message()});
    let body = state.render("error.html", &ctx)?;
    Ok(HttpResponse::build(status).content_type("text/html").body(body))
}

fn index_page(state: &AppState, error: Option<&str>) -> Result<HttpResponse, Error> {
    let ctx = json!({"has_error": error.is_some(), "error": error.unwrap_or_default()});
    Ok(html(state.render("index.html", &ctx)?))
}

/// Return the main page
async fn index(state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    index_page(&state, None)
}

async fn find_invite(params: web::Query<CodeParams>) -> HttpResponse {
    let code = params.code.trim().to_uppercase();
    if code.is_empty() {
        return see_other("/");
    }
    see_other(&format!("/invite/{}", code))
}

/// Invite page for `code`, or the index with an error when the code is unknown
async fn invite_page(
    state: &AppState,
    code: &str,
    error: Option<String>,
) -> Result<HttpResponse, Error> {
    let status = match state.store.invite_status(code).await {
        Ok(Some(status)) => status,
        Ok(None) => return index_page(state, Some(NOT_FOUND_MESSAGE)),
        Err(error) => return error_page(state, error),
    };
    let ctx = json!({
        "guest": status.guest,
        "has_rsvped": status.has_rsvped,
        "attending": status.rsvp.map(|rsvp| rsvp.is_attending).unwrap_or_default(),
        "has_error": error.is_some(),
        "error": error.unwrap_or_default(),
    });
    Ok(html(state.render("invite.html", &ctx)?))
}

async fn show_invite(
    state: web::Data<AppState>,
    code: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let code = code.into_inner().trim().to_uppercase();
    invite_page(&state, &code, None).await
}

/// Record the guest's answer and thank them
async fn handle_rsvp(
    state: web::Data<AppState>,
    code: web::Path<String>,
    params: web::Form<AttendParams>,
) -> Result<HttpResponse, Error> {
    let code = code.into_inner().trim().to_uppercase();
    let attending = match params.attending {
        Some(attending) => attending,
        None => {
            return invite_page(&state, &code, Some(ATTENDANCE_REQUIRED_MESSAGE.to_string())).await
        }
    };
    match state.store.submit_invite_rsvp(&code, attending).await {
        Ok(rsvp) => {
            if let Some(email) = &state.email {
                notify_rsvp(email, &rsvp, state.store.export_csv().await).await;
            }
            let ctx = json!({"name": rsvp.guest_name, "attending": rsvp.is_attending});
            Ok(html(state.render("confirm.html", &ctx)?))
        }
        Err(Error::NotFound(_)) => index_page(&state, Some(NOT_FOUND_MESSAGE)),
        Err(Error::AlreadySubmitted) => {
            invite_page(&state, &code, Some(Error::AlreadySubmitted.to_string())).await
        }
        Err(error) => error_page(&state, error),
    }
}

fn guest_rows(db: &Database) -> Vec<Value> {
    db.guests
        .iter()
        .map(|guest| {
            let status = match db.rsvp_for_guest(&guest.id) {
                Some(rsvp) if rsvp.is_attending => "Attending",
                Some(_) => "Not attending",
                None => "Pending",
            };
            json!({
                "id": guest.id,
                "name": guest.name,
                "inviteCode": guest.invite_code,
                "status": status,
            })
        })
        .collect()
}

async fn admin_page(state: &AppState, error: Option<String>) -> Result<HttpResponse, Error> {
    let db = match state.store.snapshot().await {
        Ok(db) => db,
        Err(error) => return error_page(state, error),
    };
    let ctx = json!({
        "has_error": error.is_some(),
        "error": error.unwrap_or_default(),
        "stats": db.stats(),
        "guests": guest_rows(&db),
        "rsvps": db.rsvps,
    });
    Ok(html(state.render("admin.html", &ctx)?))
}

async fn admin(state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    admin_page(&state, None).await
}

async fn admin_add_guest(
    state: web::Data<AppState>,
    params: web::Form<NameParams>,
) -> Result<HttpResponse, Error> {
    match state.store.create_guest(&params.name).await {
        Ok(_) => Ok(see_other("/admin")),
        Err(Error::Validation(message)) => admin_page(&state, Some(message)).await,
        Err(error) => error_page(&state, error),
    }
}

async fn admin_delete_guest(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, Error> {
    match state.store.delete_guest(&id.into_inner()).await {
        Ok(true) => Ok(see_other("/admin")),
        Ok(false) => admin_page(&state, Some(GUEST_NOT_FOUND_MESSAGE.to_string())).await,
        Err(error) => error_page(&state, error),
    }
}

async fn admin_clear(state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    match state.store.clear_all().await {
        Ok(()) => Ok(see_other("/admin")),
        Err(error) => error_page(&state, error),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::model::Guest,
        actix_web::{
            body::MessageBody,
            dev::ServiceResponse,
            http::{
                header::{HeaderValue, CONTENT_TYPE},
                StatusCode,
            },
            test, App,
        },
    };

    fn test_state() -> web::Data<AppState> {
        web::Data::new(AppState::default())
    }

    async fn body_string(resp: ServiceResponse<impl MessageBody>) -> String {
        let bytes = test::read_body(resp).await;
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn add_guest(state: &web::Data<AppState>, name: &str) -> Guest {
        state.store.create_guest(name).await.unwrap()
    }

    #[actix_rt::test]
    async fn index_renders() {
        let state = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).unwrap(),
            HeaderValue::from_static("text/html")
        );
        assert!(!body_string(resp).await.contains(NOT_FOUND_MESSAGE));
    }

    #[actix_rt::test]
    async fn find_invite_redirects_upper_case() {
        let state = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;
        let req = test::TestRequest::get()
            .uri("/invite?code=abcd1234")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/invite/ABCD1234"
        );
    }

    #[actix_rt::test]
    async fn unknown_invite_shows_error() {
        let state = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;
        let req = test::TestRequest::get().uri("/invite/NOPE0000").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains(NOT_FOUND_MESSAGE));
    }

    #[actix_rt::test]
    async fn rsvp_through_pages() {
        let state = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;
        let ana = add_guest(&state, "Ana").await;
        let uri = format!("/invite/{}", ana.invite_code.to_lowercase());

        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        let body = body_string(resp).await;
        assert!(body.contains("Hello, Ana!"));
        assert!(body.contains("name=\"attending\""));

        let req = test::TestRequest::post()
            .uri(&uri)
            .set_form(AttendParams {
                attending: Some(true),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains("Thank you, Ana!"));

        let req = test::TestRequest::post()
            .uri(&uri)
            .set_form(AttendParams {
                attending: Some(false),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body = body_string(resp).await;
        assert!(body.contains("RSVP already submitted for this guest"));
        assert!(body.contains("you will be there"));

        let rsvps = state.store.list_rsvps().await.unwrap();
        assert_eq!(rsvps.len(), 1);
        assert!(rsvps[0].is_attending);
    }

    #[actix_rt::test]
    async fn admin_manages_guests() {
        let state = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/admin/guests")
            .set_form(NameParams {
                name: "Bo".to_string(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let bo = state.store.list_guests().await.unwrap().remove(0);

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/admin").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_string(resp).await;
        assert!(body.contains(&bo.invite_code));
        assert!(body.contains("Pending"));

        let req = test::TestRequest::post()
            .uri("/admin/guests")
            .set_form(NameParams {
                name: "  ".to_string(),
            })
            .to_request();
        let body = body_string(test::call_service(&app, req).await).await;
        assert!(body.contains("Name is required"));

        let req = test::TestRequest::post()
            .uri(&format!("/admin/guests/{}/delete", bo.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert!(state.store.list_guests().await.unwrap().is_empty());

        add_guest(&state, "Cy").await;
        let req = test::TestRequest::post().uri("/admin/clear").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert!(state.store.list_guests().await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn rsvp_without_answer_is_rejected() {
        let state = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;
        let ana = add_guest(&state, "Ana").await;

        let req = test::TestRequest::post()
            .uri(&format!("/invite/{}", ana.invite_code))
            .insert_header((CONTENT_TYPE, "application/x-www-form-urlencoded"))
            .set_payload("")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_string(resp).await;
        assert!(body.contains("isAttending must be a boolean value"));
        assert!(body.contains("name=\"attending\""));
        assert!(state.store.list_rsvps().await.unwrap().is_empty());
    }
}
