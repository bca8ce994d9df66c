//! One-shot notices carried across a redirect.
//!
//! A redirect sets `penwell_flash=<code>`; the next page that renders reads the
//! code through the [`Flash`] extractor, shows the message, and clears the cookie.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};

use crate::auth::cookies;

pub const FLASH_COOKIE: &str = "penwell_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    AlreadyRegistered,
    EmailNotFound,
    WrongPassword,
    LoginToComment,
    LoginRequired,
}

impl Notice {
    pub fn code(self) -> &'static str {
        match self {
            Notice::AlreadyRegistered => "already_registered",
            Notice::EmailNotFound => "email_not_found",
            Notice::WrongPassword => "wrong_password",
            Notice::LoginToComment => "login_to_comment",
            Notice::LoginRequired => "login_required",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "already_registered" => Some(Notice::AlreadyRegistered),
            "email_not_found" => Some(Notice::EmailNotFound),
            "wrong_password" => Some(Notice::WrongPassword),
            "login_to_comment" => Some(Notice::LoginToComment),
            "login_required" => Some(Notice::LoginRequired),
            _ => None,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Notice::AlreadyRegistered => "You've already signed up with that email, log in instead!",
            Notice::EmailNotFound => "That email does not exist, please try again.",
            Notice::WrongPassword => "Password incorrect, please try again.",
            Notice::LoginToComment => "You need to login or register to comment.",
            Notice::LoginRequired => "Please log in to access this page.",
        }
    }

    /// 303 redirect to `location` carrying this notice.
    pub fn redirect(self, location: &str) -> Response {
        (
            StatusCode::SEE_OTHER,
            [
                (header::LOCATION, location.to_string()),
                (header::SET_COOKIE, flash_cookie(self)),
            ],
        )
            .into_response()
    }
}

fn flash_cookie(notice: Notice) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age=60",
        FLASH_COOKIE,
        notice.code()
    )
}

fn clear_flash_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", FLASH_COOKIE)
}

/// The pending notice for this request, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flash(pub Option<Notice>);

impl Flash {
    pub fn message(&self) -> Option<&'static str> {
        self.0.map(Notice::message)
    }

    /// Header part that clears the cookie once the notice has been shown.
    pub fn consume(&self) -> Option<AppendHeaders<[(HeaderName, String); 1]>> {
        self.0
            .map(|_| AppendHeaders([(header::SET_COOKIE, clear_flash_cookie())]))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Flash {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let notice = cookies::get_cookie_value(&parts.headers, FLASH_COOKIE)
            .and_then(Notice::from_code);
        Ok(Flash(notice))
    }
}
