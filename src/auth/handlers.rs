use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;
use rusqlite::TransactionBehavior;

use crate::auth::{cookies, password, session};
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::flash::{Flash, Notice};
use crate::forms::{self, LoginForm, RegisterForm};
use crate::routes::home::{Html, Layout};
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub form: RegisterForm,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub form: LoginForm,
    pub errors: Vec<String>,
}

// -- Helpers --

/// 303 to `location` that also hands the browser its signed session cookie.
fn signed_in_redirect(state: &AppState, signed: &str, location: &str) -> Response {
    let auth = &state.config.auth;
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, location.to_string()),
            (
                header::SET_COOKIE,
                cookies::session_cookie(&auth.cookie_name, signed, auth.session_hours),
            ),
        ],
    )
        .into_response()
}

fn sign_session(state: &AppState, user_id: i64, token: &str) -> AppResult<String> {
    state
        .signer
        .sign(user_id, token, state.config.auth.session_hours)
        .map_err(|e| AppError::Internal(format!("Failed to sign session: {}", e)))
}

// -- Registration --

/// GET /register
pub async fn register_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: Flash,
) -> Response {
    let template = RegisterTemplate {
        layout: Layout::new(&state.config, user, &flash),
        form: RegisterForm::default(),
        errors: Vec::new(),
    };
    (flash.consume(), Html(template)).into_response()
}

/// POST /register: create the account and sign it in
///
/// The user row and its first session commit together; a failure before the
/// commit leaves neither behind. The write lock is taken before the email
/// check so concurrent sign-ups for one address see each other.
pub async fn register(
    State(state): State<AppState>,
    MaybeUser(current): MaybeUser,
    flash: Flash,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let form = form.normalized();

    let errors = forms::check(&form);
    if !errors.is_empty() {
        let template = RegisterTemplate {
            layout: Layout::new(&state.config, current, &flash),
            form: RegisterForm {
                password: String::new(),
                ..form
            },
            errors,
        };
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            flash.consume(),
            Html(template),
        )
            .into_response());
    }

    let hash = password::hash_password(&form.password, state.config.auth.bcrypt_cost)?;

    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if users::email_exists(&tx, &form.email)? {
        tracing::info!("Registration refused, email already registered");
        return Ok(Notice::AlreadyRegistered.redirect("/login"));
    }

    let user = users::insert(&tx, &form.email, &hash, &form.name)?;
    let token = session::create_session(&tx, user.id, state.config.auth.session_hours)?;
    let signed = sign_session(&state, user.id, &token)?;
    tx.commit()?;

    tracing::info!("Registered user {} (admin: {})", user.id, user.is_admin);
    Ok(signed_in_redirect(&state, &signed, "/"))
}

// -- Login --

/// GET /login
pub async fn login_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: Flash,
) -> Response {
    let template = LoginTemplate {
        layout: Layout::new(&state.config, user, &flash),
        form: LoginForm::default(),
        errors: Vec::new(),
    };
    (flash.consume(), Html(template)).into_response()
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    MaybeUser(current): MaybeUser,
    flash: Flash,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let form = form.normalized();

    let errors = forms::check(&form);
    if !errors.is_empty() {
        let template = LoginTemplate {
            layout: Layout::new(&state.config, current, &flash),
            form: LoginForm {
                password: String::new(),
                ..form
            },
            errors,
        };
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            flash.consume(),
            Html(template),
        )
            .into_response());
    }

    let conn = state.db.get()?;

    let Some(user) = users::find_by_email(&conn, &form.email)? else {
        tracing::warn!("Login failed: unknown email");
        return Ok(Notice::EmailNotFound.redirect("/login"));
    };

    if !password::verify_password(&form.password, &user.password_hash)? {
        tracing::warn!("Login failed: wrong password for user {}", user.id);
        return Ok(Notice::WrongPassword.redirect("/login"));
    }

    let token = session::create_session(&conn, user.id, state.config.auth.session_hours)?;
    let signed = sign_session(&state, user.id, &token)?;

    tracing::info!("User {} logged in", user.id);
    Ok(signed_in_redirect(&state, &signed, "/"))
}

// -- Logout handler --

/// GET /logout: delete session and redirect
pub async fn logout(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    {
        let conn = state.db.get()?;
        session::delete_session(&conn, &user.session_token)?;
    }
    tracing::info!("User {} logged out", user.id);

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/".to_string()),
            (
                header::SET_COOKIE,
                cookies::clear_session_cookie(&state.config.auth.cookie_name),
            ),
        ],
    )
        .into_response())
}
