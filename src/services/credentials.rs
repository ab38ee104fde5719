//! Local input validation for auth forms.
//!
//! Everything here runs before any remote call; a rejected value never
//! reaches the identity service.

use std::fmt;

use zeroize::Zeroizing;

use crate::remote::ServiceError;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const CODE_LEN: usize = 6;

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_lowercase();
    if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
        return None;
    }
    let parts = normalized.split('@').collect::<Vec<_>>();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }
    Some(normalized)
}

/// Accept a numeric one-time code, ignoring surrounding and inner spaces.
#[must_use]
pub fn normalize_code(code: &str) -> Option<String> {
    let normalized: String = code.chars().filter(|c| !c.is_whitespace()).collect();
    if normalized.len() != CODE_LEN || !normalized.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(normalized)
}

/// Enforce the minimum password length.
///
/// # Errors
///
/// Returns a validation error when the password is too short.
pub fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Validated email/password pair.
///
/// ## Invariants
/// - `email` is trimmed, lower-cased, and has a single `@` with both sides
///   non-empty.
/// - `password` has at least [`MIN_PASSWORD_LEN`] characters and keeps
///   caller-provided whitespace.
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: Zeroizing<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("email", &self.email).field("password", &"<redacted>").finish()
    }
}

impl Credentials {
    /// Construct credentials from raw form inputs.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed email or short password.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, ServiceError> {
        let email = normalize_email(email).ok_or_else(|| ServiceError::validation("enter a valid email address"))?;
        validate_password(password)?;
        Ok(Self { email, password: Zeroizing::new(password.to_owned()) })
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;
