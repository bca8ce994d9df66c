use std::borrow::Cow;

use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::db::models::{Post, PostContent};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterForm {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
    #[validate(length(min = 1, max = 1000, message = "Name is required."))]
    pub name: String,
}

impl RegisterForm {
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_string();
        self.name = self.name.trim().to_string();
        clear_if_blank(&mut self.password);
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

impl LoginForm {
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_string();
        clear_if_blank(&mut self.password);
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PostForm {
    #[validate(length(min = 1, max = 250, message = "Title is required (250 characters max)."))]
    pub title: String,
    #[validate(length(min = 1, max = 250, message = "Subtitle is required (250 characters max)."))]
    pub subtitle: String,
    #[validate(custom = "http_url")]
    pub img_url: String,
    #[validate(length(min = 1, message = "Content is required."))]
    pub body: String,
}

impl PostForm {
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.subtitle = self.subtitle.trim().to_string();
        self.img_url = self.img_url.trim().to_string();
        // Body HTML is stored as written unless there is nothing in it
        clear_if_blank(&mut self.body);
        self
    }

    pub fn into_content(self) -> PostContent {
        PostContent {
            title: self.title,
            subtitle: self.subtitle,
            body: self.body,
            img_url: self.img_url,
        }
    }
}

impl From<&Post> for PostForm {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            img_url: post.img_url.clone(),
            body: post.body.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CommentForm {
    #[validate(length(min = 1, message = "Comment cannot be empty."))]
    pub content: String,
}

impl CommentForm {
    pub fn normalized(mut self) -> Self {
        self.content = self.content.trim().to_string();
        self
    }
}

/// Whitespace-only input counts as missing for the required-field rules.
fn clear_if_blank(value: &mut String) {
    if value.trim().is_empty() {
        value.clear();
    }
}

/// Absolute `http`/`https` URL. Other schemes such as `javascript:` are refused.
fn http_url(value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => {
            let mut err = ValidationError::new("url");
            err.message = Some(Cow::from("Image URL must be a valid URL."));
            Err(err)
        }
    }
}

/// Flatten validation failures into display messages, ordered by field name.
pub fn error_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid.", field),
            })
        })
        .collect()
}

/// Run the form's rules and return display messages for any failures.
pub fn check<T: Validate>(form: &T) -> Vec<String> {
    match form.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => error_messages(&errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_registration_passes() {
        let form = RegisterForm {
            email: "a@x.com".into(),
            password: "pw".into(),
            name: "A".into(),
        };
        assert!(check(&form).is_empty());
    }

    #[test]
    fn empty_registration_reports_every_field() {
        let errors = check(&RegisterForm::default());
        assert_eq!(
            errors,
            vec![
                "Enter a valid email address.".to_string(),
                "Name is required.".to_string(),
                "Password is required.".to_string(),
            ]
        );
    }

    #[test]
    fn normalized_trims_email_and_name() {
        let form = RegisterForm {
            email: "  a@x.com ".into(),
            password: " pw ".into(),
            name: " A ".into(),
        }
        .normalized();
        assert_eq!(form.email, "a@x.com");
        assert_eq!(form.name, "A");
        assert_eq!(form.password, " pw ");
    }

    #[test]
    fn post_form_requires_url_for_image() {
        let form = PostForm {
            title: "T".into(),
            subtitle: "S".into(),
            img_url: "not a url".into(),
            body: "B".into(),
        };
        assert_eq!(check(&form), vec!["Image URL must be a valid URL.".to_string()]);
    }

    #[test]
    fn post_form_only_accepts_web_image_urls() {
        let with_image = |img_url: &str| PostForm {
            title: "T".into(),
            subtitle: "S".into(),
            img_url: img_url.into(),
            body: "B".into(),
        };
        assert!(check(&with_image("http://example.com/a.jpg")).is_empty());
        assert!(check(&with_image("https://example.com/a.jpg")).is_empty());
        for rejected in ["javascript:alert(1)", "data:image/png;base64,AAAA", "/relative.jpg"] {
            assert_eq!(
                check(&with_image(rejected)),
                vec!["Image URL must be a valid URL.".to_string()],
                "{}",
                rejected
            );
        }
    }

    #[test]
    fn blank_post_body_is_missing_but_real_body_is_untouched() {
        let form = PostForm {
            title: "T".into(),
            subtitle: "S".into(),
            img_url: "https://example.com/a.jpg".into(),
            body: " \n\t ".into(),
        }
        .normalized();
        assert_eq!(check(&form), vec!["Content is required.".to_string()]);

        let form = PostForm {
            body: "  <p>Hi</p>\n".into(),
            ..form
        }
        .normalized();
        assert_eq!(form.body, "  <p>Hi</p>\n");
        assert!(check(&form).is_empty());
    }

    #[test]
    fn blank_passwords_are_missing() {
        let register = RegisterForm {
            email: "a@x.com".into(),
            password: "   ".into(),
            name: "A".into(),
        }
        .normalized();
        assert_eq!(check(&register), vec!["Password is required.".to_string()]);

        let login = LoginForm {
            email: "a@x.com".into(),
            password: "\t".into(),
        }
        .normalized();
        assert_eq!(check(&login), vec!["Password is required.".to_string()]);
    }

    #[test]
    fn post_form_rejects_overlong_title() {
        let form = PostForm {
            title: "x".repeat(251),
            subtitle: "S".into(),
            img_url: "https://example.com/a.jpg".into(),
            body: "B".into(),
        };
        assert_eq!(check(&form).len(), 1);
    }

    #[test]
    fn empty_comment_is_rejected() {
        assert_eq!(
            check(&CommentForm::default()),
            vec!["Comment cannot be empty.".to_string()]
        );
        assert!(check(&CommentForm {
            content: "Nice post".into()
        })
        .is_empty());
    }

    #[test]
    fn whitespace_comment_is_rejected_after_normalizing() {
        let form = CommentForm {
            content: "  \n ".into(),
        }
        .normalized();
        assert_eq!(check(&form), vec!["Comment cannot be empty.".to_string()]);

        let form = CommentForm {
            content: "  Nice post \n".into(),
        }
        .normalized();
        assert_eq!(form.content, "Nice post");
    }
}
