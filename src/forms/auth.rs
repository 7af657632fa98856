use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::{choice, optional_text, required_text, FieldErrors};
use crate::models::choices::UserRole;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email pattern"));
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username pattern"));

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RegisterData {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

impl RegisterInput {
    pub fn validate(&self) -> Result<RegisterData, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = required_text(&mut errors, "username", self.username.as_deref(), Some(150));
        if !username.is_empty() && !USERNAME_RE.is_match(&username) {
            errors.add(
                "username",
                "Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        let email = required_text(&mut errors, "email", self.email.as_deref(), Some(254));
        check_email(&mut errors, &email);

        let password = self.password.clone().unwrap_or_default();
        check_password(&mut errors, "password", &password);

        let first_name = optional_text(&mut errors, "first_name", self.first_name.as_deref(), Some(150));
        let last_name = optional_text(&mut errors, "last_name", self.last_name.as_deref(), Some(150));
        let role = choice(
            &mut errors,
            "role",
            self.role.as_deref(),
            UserRole::Developer,
            UserRole::parse,
            UserRole::expected,
        );

        errors.into_result(RegisterData {
            username,
            email: email.to_lowercase(),
            password,
            first_name,
            last_name,
            role,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileInput {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub github_username: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProfileData {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub github_username: String,
    pub role: UserRole,
}

impl ProfileInput {
    pub fn validate(&self) -> Result<ProfileData, FieldErrors> {
        let mut errors = FieldErrors::new();

        let email = required_text(&mut errors, "email", self.email.as_deref(), Some(254));
        check_email(&mut errors, &email);
        let first_name = required_text(&mut errors, "first_name", self.first_name.as_deref(), Some(150));
        let last_name = required_text(&mut errors, "last_name", self.last_name.as_deref(), Some(150));
        let bio = optional_text(&mut errors, "bio", self.bio.as_deref(), Some(500));
        let github_username =
            optional_text(&mut errors, "github_username", self.github_username.as_deref(), Some(100));
        let role = choice(
            &mut errors,
            "role",
            self.role.as_deref(),
            UserRole::Developer,
            UserRole::parse,
            UserRole::expected,
        );

        errors.into_result(ProfileData {
            email: email.to_lowercase(),
            first_name,
            last_name,
            bio,
            github_username,
            role,
        })
    }
}

pub fn check_password(errors: &mut FieldErrors, field: &str, password: &str) {
    if password.is_empty() {
        errors.add(field, "This field is required.");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            field,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters."),
        );
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if !email.is_empty() && !EMAIL_RE.is_match(email) {
        errors.add("email", "Enter a valid email address.");
    }
}
