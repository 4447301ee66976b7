use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::UserStore,
        repo_types::NewUser,
    },
    error::{AppError, AppResult},
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn validate_email(email: &str) -> AppResult<()> {
    if !is_valid_email(email) {
        return Err(AppError::validation("invalid email"));
    }
    Ok(())
}

pub(crate) fn validate_username(username: &str) -> AppResult<()> {
    let len = username.chars().count();
    if !(3..=50).contains(&len) {
        return Err(AppError::validation(
            "username must be between 3 and 50 characters",
        ));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::validation(
            "username may only contain letters and digits",
        ));
    }
    Ok(())
}

pub(crate) fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation("password too short"));
    }
    Ok(())
}

pub async fn register(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: RegisterRequest,
) -> AppResult<AuthResponse> {
    let username = req.username.trim().to_string();
    let email = normalize_email(&req.email);
    validate_username(&username)?;
    validate_email(&email)?;
    validate_password(&req.password)?;

    match users.get_by_email(&email).await {
        Ok(_) => return Err(AppError::Conflict("email already registered".into())),
        Err(AppError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }

    let password_hash = hash_password(&req.password)?;
    let user = users
        .create(NewUser {
            username,
            email,
            password_hash,
        })
        .await?;

    let token = keys.issue(user.id, &user.email, &user.username)?;
    info!(user_id = %user.id, "user registered");
    Ok(AuthResponse {
        user: PublicUser::from(user),
        token,
    })
}

pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> AppResult<AuthResponse> {
    let email = normalize_email(&req.email);
    validate_email(&email)?;

    let invalid = || AppError::Unauthenticated("invalid credentials".into());
    let user = match users.get_by_email(&email).await {
        Ok(u) => u,
        Err(AppError::NotFound(_)) => return Err(invalid()),
        Err(e) => return Err(e),
    };
    if !verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    let token = keys.issue(user.id, &user.email, &user.username)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse {
        user: PublicUser::from(user),
        token,
    })
}
