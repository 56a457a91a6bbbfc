//! Account lifecycle: registration, login, email verification, profile
//! changes and password recovery.
//!
//! Mail failures are handled differently per flow. Registration keeps the
//! account and degrades to a warning, an email change is rolled back, a
//! resend reports the failure and forgot-password hides it.

use std::time::Duration;

use axum::extract::FromRef;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use super::{
    dto::{
        ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, ProfileResponse,
        RegisterRequest, RegisterResponse, ResetPasswordRequest, UpdateProfileRequest,
        UpdateProfileResponse, VerifyEmailResponse,
    },
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    tokens::{self, RESET_TTL, VERIFICATION_TTL},
    validate::{check_email, check_password, check_username, normalize_email},
};
use crate::{
    db::{NewUser, StoreResult, UniqueField, User},
    error::{AppError, AppResult},
    mail::{self, Notification},
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const FORGOT_PASSWORD_REPLY: &str =
    "If an account with that email exists, a password reset link has been sent.";
const MAIL_UNAVAILABLE: &str = "Could not send verification email. Please try again later.";

fn mail_timeout(state: &AppState) -> Duration {
    Duration::from_secs(state.config.mail.timeout_secs)
}

fn required<'a>(value: &'a str, field: &str) -> AppResult<&'a str> {
    if value.trim().is_empty() {
        Err(AppError::BadRequest(format!("{field} is required")))
    } else {
        Ok(value)
    }
}

fn conflict(field: UniqueField) -> AppError {
    AppError::Conflict(field.conflict_message().into())
}

/// Outcome of an email change whose confirmation mail failed. A failed
/// restore is logged; the caller still gets the delivery error.
fn email_change_failed(user: &User, restore: StoreResult<()>) -> AppError {
    if let Err(e) = restore {
        error!(error = %e, user_id = %user.id, "profile not restored after failed email change");
    }
    AppError::Delivery(MAIL_UNAVAILABLE.into())
}

#[instrument(skip(state, req), fields(username = %req.username))]
pub async fn register(state: &AppState, req: RegisterRequest) -> AppResult<RegisterResponse> {
    let username = required(&req.username, "Username")?.trim().to_string();
    let email = normalize_email(required(&req.email, "Email")?);
    let password = required(&req.password, "Password")?;
    check_username(&username)?;
    check_email(&email)?;
    check_password(password)?;

    if state.store.user_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(conflict(UniqueField::Email));
    }
    if state.store.user_by_username(&username).await?.is_some() {
        warn!(%username, "username already taken");
        return Err(conflict(UniqueField::Username));
    }

    let password_hash = hash_password(password)?;
    let (verify_token, verify_expires) = tokens::issue(VERIFICATION_TTL);

    // The unique constraints still catch a concurrent registration.
    let user = state
        .store
        .insert_user(NewUser {
            username,
            email,
            password_hash,
            email_verification_token: Some(verify_token.clone()),
            email_verification_expires: Some(verify_expires),
            created_at: OffsetDateTime::now_utc(),
        })
        .await?;

    let token = JwtKeys::from_ref(state).sign(user.id)?;

    let notification =
        Notification::verify_account(&user.username, &state.config.client_url, &verify_token);
    let message = match mail::deliver(
        state.mailer.as_ref(),
        mail_timeout(state),
        &user.email,
        &notification,
    )
    .await
    {
        Ok(()) => "Registration successful! Please check your email to verify your account.",
        Err(e) => {
            warn!(error = %e, user_id = %user.id, "verification email not sent at registration");
            "Registration successful, but we could not send a verification email. \
             Please try requesting a new verification email from your profile page."
        }
    };

    info!(user_id = %user.id, "user registered");
    Ok(RegisterResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        is_email_verified: user.is_email_verified,
        token,
        message: message.to_string(),
    })
}

#[instrument(skip(state, req))]
pub async fn login(state: &AppState, req: LoginRequest) -> AppResult<LoginResponse> {
    let email = normalize_email(required(&req.email, "Email")?);
    let password = required(&req.password, "Password")?;

    let Some(mut user) = state.store.user_by_email(&email).await? else {
        warn!("login for unknown email");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    user.last_login = Some(OffsetDateTime::now_utc());
    state.store.save_user(&user).await?;

    let token = JwtKeys::from_ref(state).sign(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(LoginResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        is_email_verified: user.is_email_verified,
        token,
    })
}

/// Consumes a verification token. Confirms either the initial address or a
/// pending email change.
#[instrument(skip(state, token))]
pub async fn verify_email(state: &AppState, token: &str) -> AppResult<VerifyEmailResponse> {
    let now = OffsetDateTime::now_utc();
    let Some(mut user) = state.store.user_by_verification_token(token, now).await? else {
        warn!("verification token unknown or expired");
        return Err(AppError::InvalidOrExpiredToken(
            "Invalid or expired verification token".into(),
        ));
    };

    let message = match user.pending_email.take() {
        Some(new_email) => {
            info!(user_id = %user.id, "email change confirmed");
            user.email = new_email;
            "Email address updated and verified successfully"
        }
        None => {
            info!(user_id = %user.id, "email verified");
            "Email verified successfully"
        }
    };
    user.is_email_verified = true;
    user.email_verification_token = None;
    user.email_verification_expires = None;
    state.store.save_user(&user).await?;

    Ok(VerifyEmailResponse {
        success: true,
        message: message.into(),
    })
}

pub fn profile(user: &User) -> ProfileResponse {
    ProfileResponse::from(user)
}

/// Applies username, password and email changes together. A new email is
/// only staged in `pending_email`; if its confirmation mail cannot be sent,
/// the whole update is undone.
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn update_profile(
    state: &AppState,
    user: User,
    req: UpdateProfileRequest,
) -> AppResult<UpdateProfileResponse> {
    let original = user.clone();
    let mut updated = user;

    let new_username = req
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty() && *u != original.username);
    let new_email = req
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty() && *e != original.email);
    let new_password = req.new_password.as_deref().filter(|p| !p.is_empty());

    if let Some(username) = new_username {
        check_username(username)?;
        if state.store.user_by_username(username).await?.is_some() {
            return Err(conflict(UniqueField::Username));
        }
    }
    if let Some(email) = new_email.as_deref() {
        check_email(email)?;
        if state.store.user_by_email(email).await?.is_some() {
            return Err(conflict(UniqueField::Email));
        }
    }
    if let Some(password) = new_password {
        let current = req
            .current_password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::BadRequest("Current password is required".into()))?;
        check_password(password)?;
        if !verify_password(current, &original.password_hash)? {
            warn!("wrong current password on profile update");
            return Err(AppError::Unauthorized("Current password is incorrect".into()));
        }
        updated.password_hash = hash_password(password)?;
    }

    if let Some(username) = new_username {
        updated.username = username.to_string();
    }

    let staged_token = match new_email.as_deref() {
        Some(email) => {
            let (token, expires) = tokens::issue(VERIFICATION_TTL);
            updated.pending_email = Some(email.to_string());
            updated.email_verification_token = Some(token.clone());
            updated.email_verification_expires = Some(expires);
            Some(token)
        }
        None => None,
    };

    state.store.save_user(&updated).await?;

    let message = match (staged_token, new_email.as_deref()) {
        (Some(token), Some(email)) => {
            let notification = Notification::confirm_email_change(
                &updated.username,
                &state.config.client_url,
                &token,
                email,
            );
            if let Err(e) =
                mail::deliver(state.mailer.as_ref(), mail_timeout(state), email, &notification)
                    .await
            {
                error!(error = %e, "email change confirmation not sent; rolling back");
                let restore = state.store.save_user(&original).await;
                return Err(email_change_failed(&original, restore));
            }
            "Verification email sent to your new email address. Please verify to complete the update."
        }
        _ => "Profile updated successfully",
    };

    info!("profile updated");
    Ok(UpdateProfileResponse {
        profile: ProfileResponse::from(&updated),
        message: message.into(),
    })
}

#[instrument(skip(state, req))]
pub async fn forgot_password(
    state: &AppState,
    req: ForgotPasswordRequest,
) -> AppResult<MessageResponse> {
    let email = normalize_email(required(&req.email, "Email")?);

    let Some(mut user) = state.store.user_by_email(&email).await? else {
        info!("password reset requested for unknown email");
        return Ok(MessageResponse::new(FORGOT_PASSWORD_REPLY));
    };

    let (token, expires) = tokens::issue(RESET_TTL);
    user.password_reset_token = Some(token.clone());
    user.password_reset_expires = Some(expires);
    state.store.save_user(&user).await?;

    let notification =
        Notification::password_reset(&user.username, &state.config.client_url, &token);
    if let Err(e) =
        mail::deliver(state.mailer.as_ref(), mail_timeout(state), &user.email, &notification).await
    {
        error!(error = %e, user_id = %user.id, "password reset email not sent; clearing token");
        user.password_reset_token = None;
        user.password_reset_expires = None;
        state.store.save_user(&user).await?;
    } else {
        info!(user_id = %user.id, "password reset email sent");
    }

    Ok(MessageResponse::new(FORGOT_PASSWORD_REPLY))
}

#[instrument(skip(state, token, req))]
pub async fn reset_password(
    state: &AppState,
    token: &str,
    req: ResetPasswordRequest,
) -> AppResult<MessageResponse> {
    let password = required(&req.password, "New password")?;
    check_password(password)?;

    let now = OffsetDateTime::now_utc();
    let Some(mut user) = state.store.user_by_reset_token(token, now).await? else {
        warn!("reset token unknown or expired");
        return Err(AppError::InvalidOrExpiredToken(
            "Invalid or expired password reset token".into(),
        ));
    };

    user.password_hash = hash_password(password)?;
    user.password_reset_token = None;
    user.password_reset_expires = None;
    state.store.save_user(&user).await?;

    info!(user_id = %user.id, "password reset");
    Ok(MessageResponse::new(
        "Password has been reset successfully. You can now log in with your new password.",
    ))
}

/// Reissues the verification token, addressed to the pending email if one is
/// staged. The new token is kept even when sending fails.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn resend_verification(state: &AppState, mut user: User) -> AppResult<MessageResponse> {
    let (token, expires) = tokens::issue(VERIFICATION_TTL);
    user.email_verification_token = Some(token.clone());
    user.email_verification_expires = Some(expires);
    state.store.save_user(&user).await?;

    let notification = match user.pending_email.as_deref() {
        Some(pending) => Notification::confirm_email_change(
            &user.username,
            &state.config.client_url,
            &token,
            pending,
        ),
        None => Notification::verify_account(&user.username, &state.config.client_url, &token),
    };
    let target = user.pending_email.as_deref().unwrap_or(&user.email);

    mail::deliver(state.mailer.as_ref(), mail_timeout(state), target, &notification)
        .await
        .map_err(|e| {
            error!(error = %e, "verification email resend failed");
            AppError::Delivery(MAIL_UNAVAILABLE.into())
        })?;

    info!("verification email resent");
    Ok(MessageResponse::new("Verification email has been sent"))
}
