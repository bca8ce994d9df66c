use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};

use crate::db::models::{Comment, Post};
use crate::db::{comments, posts};
use crate::error::{AppError, AppResult};
use crate::extractors::{Admin, CurrentUser, MaybeUser};
use crate::flash::{Flash, Notice};
use crate::forms::{self, CommentForm, PostForm};
use crate::routes::home::{Html, Layout};
use crate::state::AppState;

const DATE_FORMAT: &str = "%B %d, %Y";

#[derive(Template)]
#[template(path = "pages/post.html")]
pub struct PostTemplate {
    pub layout: Layout,
    pub post: Post,
    pub comments: Vec<Comment>,
    pub form: CommentForm,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "pages/make_post.html")]
pub struct MakePostTemplate {
    pub layout: Layout,
    pub form: PostForm,
    pub errors: Vec<String>,
    /// Set when editing; the form then submits to `/edit-post/{id}`.
    pub editing: Option<i64>,
}

impl MakePostTemplate {
    pub fn action(&self) -> String {
        match self.editing {
            Some(id) => format!("/edit-post/{}", id),
            None => "/new-post".to_string(),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/post/{id}", get(show_post).post(add_comment))
        .route("/new-post", get(new_post_page).post(create_post))
        .route(
            "/edit-post/{id}",
            get(edit_post_page).put(update_post).post(update_post),
        )
        .route("/delete/{id}", post(delete_post).delete(delete_post))
}

/// Render a post with its comments. `form` and `errors` carry a rejected comment back.
fn render_post(
    state: &AppState,
    user: Option<CurrentUser>,
    flash: &Flash,
    id: i64,
    form: CommentForm,
    errors: Vec<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let post = posts::find(&conn, id)?.ok_or(AppError::NotFound)?;
    let comments = comments::for_post(&conn, id)?;

    let status = if errors.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    let template = PostTemplate {
        layout: Layout::new(&state.config, user, flash),
        post,
        comments,
        form,
        errors,
    };
    Ok((status, flash.consume(), Html(template)).into_response())
}

/// GET /post/{id}
pub async fn show_post(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: Flash,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    render_post(&state, user, &flash, id, CommentForm::default(), Vec::new())
}

/// POST /post/{id}: add a comment as the signed-in user
pub async fn add_comment(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: Flash,
    Path(id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let Some(user) = user else {
        return Ok(Notice::LoginToComment.redirect("/login"));
    };

    let form = form.normalized();
    let errors = forms::check(&form);
    if !errors.is_empty() {
        return render_post(&state, Some(user), &flash, id, form, errors);
    }

    {
        let conn = state.db.get()?;
        if posts::find(&conn, id)?.is_none() {
            return Err(AppError::NotFound);
        }
        comments::insert(&conn, id, user.id, &form.content)?;
    }
    tracing::info!("User {} commented on post {}", user.id, id);

    render_post(&state, Some(user), &flash, id, CommentForm::default(), Vec::new())
}

/// GET /new-post
pub async fn new_post_page(
    State(state): State<AppState>,
    Admin(user): Admin,
    flash: Flash,
) -> Response {
    let template = MakePostTemplate {
        layout: Layout::new(&state.config, Some(user), &flash),
        form: PostForm::default(),
        errors: Vec::new(),
        editing: None,
    };
    (flash.consume(), Html(template)).into_response()
}

/// POST /new-post: stamp today's date and the admin as author
pub async fn create_post(
    State(state): State<AppState>,
    Admin(user): Admin,
    flash: Flash,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let form = form.normalized();

    let errors = forms::check(&form);
    if !errors.is_empty() {
        return Ok(invalid_post_form(&state, user, &flash, form, errors, None));
    }

    let conn = state.db.get()?;
    if posts::title_taken(&conn, &form.title, None)? {
        return Ok(duplicate_title(&state, user, &flash, form, None));
    }

    let date = chrono::Local::now().format(DATE_FORMAT).to_string();
    let id = posts::insert(&conn, user.id, &form.into_content(), &date)?;
    tracing::info!("Post {} created by user {}", id, user.id);

    Ok(Redirect::to("/").into_response())
}

/// GET /edit-post/{id}: form pre-populated with the current post
pub async fn edit_post_page(
    State(state): State<AppState>,
    Admin(user): Admin,
    flash: Flash,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let post = {
        let conn = state.db.get()?;
        posts::find(&conn, id)?.ok_or(AppError::NotFound)?
    };

    let template = MakePostTemplate {
        layout: Layout::new(&state.config, Some(user), &flash),
        form: PostForm::from(&post),
        errors: Vec::new(),
        editing: Some(id),
    };
    Ok((flash.consume(), Html(template)).into_response())
}

/// PUT (or POST) /edit-post/{id}: overwrite title, subtitle, image and body
pub async fn update_post(
    State(state): State<AppState>,
    Admin(user): Admin,
    flash: Flash,
    Path(id): Path<i64>,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let form = form.normalized();

    let conn = state.db.get()?;
    if posts::find(&conn, id)?.is_none() {
        return Err(AppError::NotFound);
    }

    let errors = forms::check(&form);
    if !errors.is_empty() {
        return Ok(invalid_post_form(&state, user, &flash, form, errors, Some(id)));
    }

    if posts::title_taken(&conn, &form.title, Some(id))? {
        return Ok(duplicate_title(&state, user, &flash, form, Some(id)));
    }

    posts::update(&conn, id, &form.into_content())?;
    tracing::info!("Post {} updated by user {}", id, user.id);

    Ok(Redirect::to(&format!("/post/{}", id)).into_response())
}

/// DELETE (or POST) /delete/{id}: remove the post and its comments
pub async fn delete_post(
    State(state): State<AppState>,
    Admin(user): Admin,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let mut conn = state.db.get()?;
    if !posts::delete(&mut conn, id)? {
        return Err(AppError::NotFound);
    }
    tracing::info!("Post {} deleted by user {}", id, user.id);

    Ok(Redirect::to("/").into_response())
}

fn invalid_post_form(
    state: &AppState,
    user: CurrentUser,
    flash: &Flash,
    form: PostForm,
    errors: Vec<String>,
    editing: Option<i64>,
) -> Response {
    rejected_post_form(
        state,
        user,
        flash,
        form,
        errors,
        editing,
        StatusCode::UNPROCESSABLE_ENTITY,
    )
}

fn duplicate_title(
    state: &AppState,
    user: CurrentUser,
    flash: &Flash,
    form: PostForm,
    editing: Option<i64>,
) -> Response {
    rejected_post_form(
        state,
        user,
        flash,
        form,
        vec!["A post with that title already exists.".to_string()],
        editing,
        StatusCode::CONFLICT,
    )
}

fn rejected_post_form(
    state: &AppState,
    user: CurrentUser,
    flash: &Flash,
    form: PostForm,
    errors: Vec<String>,
    editing: Option<i64>,
    status: StatusCode,
) -> Response {
    let template = MakePostTemplate {
        layout: Layout::new(&state.config, Some(user), flash),
        form,
        errors,
        editing,
    };
    (status, flash.consume(), Html(template)).into_response()
}
