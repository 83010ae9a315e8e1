use reqwest::multipart::{Form, Part};
use tracing::info;

use alcove_types::api::{LoginRequest, LoginResponse, RegisterRequest};

use crate::error::ApiError;

/// Create an account. Unauthenticated; the body goes up as multipart form
/// data so the optional profile photo can ride along as a file part.
pub async fn register(
    http: &reqwest::Client,
    base_url: &str,
    req: RegisterRequest,
) -> Result<(), ApiError> {
    validate_registration(&req)?;

    let mut form = Form::new()
        .text("email", req.email.clone())
        .text("full_name", req.full_name)
        .text("password", req.password);

    if let Some(path) = &req.profile_photo {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());
        form = form.part("profile_photo", Part::bytes(bytes).file_name(file_name));
    }

    let resp = http
        .post(format!("{}/auth/register/", base_url.trim_end_matches('/')))
        .multipart(form)
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(ApiError::status(resp.status()));
    }

    info!("account created for {}", req.email);
    Ok(())
}

/// Exchange credentials for an access/refresh pair and the current-user
/// record.
pub async fn login(
    http: &reqwest::Client,
    base_url: &str,
    req: LoginRequest,
) -> Result<LoginResponse, ApiError> {
    validate_login(&req)?;

    let resp = http
        .post(format!("{}/auth/login/", base_url.trim_end_matches('/')))
        .json(&req)
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(ApiError::status(resp.status()));
    }

    Ok(resp.json().await?)
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    if !looks_like_email(&req.email) {
        return Err(ApiError::Invalid("invalid email address".into()));
    }
    if req.full_name.trim().chars().count() < 3 {
        return Err(ApiError::Invalid(
            "full name must be at least 3 characters".into(),
        ));
    }
    if req.password.chars().count() < 6 {
        return Err(ApiError::Invalid(
            "password must be at least 6 characters".into(),
        ));
    }
    Ok(())
}

fn validate_login(req: &LoginRequest) -> Result<(), ApiError> {
    if !looks_like_email(&req.email) {
        return Err(ApiError::Invalid("invalid email address".into()));
    }
    if req.password.is_empty() {
        return Err(ApiError::Invalid("password is required".into()));
    }
    Ok(())
}

fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !s.contains(char::is_whitespace)
}
