use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Datelike;

use crate::config::Config;
use crate::db::{self, models::Post};
use crate::error::AppResult;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::flash::Flash;
use crate::state::AppState;

/// Shared page chrome: navigation, notices and footer.
pub struct Layout {
    pub site_title: String,
    pub user: Option<CurrentUser>,
    pub flash: Option<&'static str>,
    pub year: i32,
}

impl Layout {
    pub fn new(config: &Config, user: Option<CurrentUser>, flash: &Flash) -> Self {
        Self {
            site_title: config.site.title.clone(),
            user,
            flash: flash.message(),
            year: chrono::Local::now().year(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(CurrentUser::can_manage_posts)
    }
}

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub layout: Layout,
    pub posts: Vec<Post>,
}

#[derive(Template)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub layout: Layout,
}

#[derive(Template)]
#[template(path = "pages/contact.html")]
pub struct ContactTemplate {
    pub layout: Layout,
    pub contact_email: Option<String>,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// GET /: every post, oldest first
pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: Flash,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let posts = db::posts::list(&conn)?;

    let layout = Layout::new(&state.config, user, &flash);
    Ok((flash.consume(), Html(IndexTemplate { layout, posts })).into_response())
}

pub async fn about(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: Flash,
) -> Response {
    let layout = Layout::new(&state.config, user, &flash);
    (flash.consume(), Html(AboutTemplate { layout })).into_response()
}

pub async fn contact(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: Flash,
) -> Response {
    let layout = Layout::new(&state.config, user, &flash);
    let contact_email = state.config.site.contact_email.clone();
    (
        flash.consume(),
        Html(ContactTemplate {
            layout,
            contact_email,
        }),
    )
        .into_response()
}
