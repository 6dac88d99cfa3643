//! Leader and admin login.
//!
//! Passwords are compared in constant time to mitigate timing attacks.

use subtle::ConstantTimeEq;

use crate::errors::RosterError;
use crate::models::{Identity, Leader};

/// Log a leader in by username (case-insensitive) or display name.
///
/// Both inputs are trimmed. Usernames compare case-insensitively, names exactly.
pub fn login_leader(leaders: &[Leader], user: &str, password: &str) -> Result<Identity, RosterError> {
    let trimmed_user = user.trim();
    let clean_user = trimmed_user.to_lowercase();
    let clean_password = password.trim();

    leaders
        .iter()
        .find(|leader| {
            (leader.username.to_lowercase() == clean_user || leader.name == trimmed_user)
                && constant_time_compare(&leader.password, clean_password)
        })
        .map(|leader| {
            tracing::info!("Leader {} logged in for {}", leader.id, leader.bus_id);
            Identity::Leader(leader.clone())
        })
        .ok_or_else(|| {
            RosterError::Unauthorized("Wrong account or password, please try again".to_string())
        })
}

/// Log the admin in. The input is trimmed and lower-cased.
pub fn login_admin(password: &str, expected: &str) -> Result<Identity, RosterError> {
    if constant_time_compare(&password.trim().to_lowercase(), expected) {
        tracing::info!("Admin logged in");
        Ok(Identity::Admin)
    } else {
        Err(RosterError::Unauthorized("Wrong password".to_string()))
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    a_bytes.ct_eq(b_bytes).into()
}
