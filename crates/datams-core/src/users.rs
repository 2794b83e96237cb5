use crate::error::Error;
use crate::requests::{restricted_characters, UserRequest};
use crate::storage::queries;
use crate::storage::{QueryExecutor, Statement};
use crate::update::{apply_update, EntityUpdate, UserFields};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::ErrorCode;
use tracing::{info, warn};

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const ROLE_ADMIN: i64 = 0;
pub const ROLE_STANDARD: i64 = 1;

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"^\S+@\S+\.\S+$").unwrap();
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub admin: bool,
}

/// Check a new account before any statement is built.
pub fn validate_new_user(user: &NewUser) -> Result<(), Error> {
    let restricted = restricted_characters(&user.username);
    if !restricted.is_empty() {
        let listed: Vec<String> = restricted.iter().map(|c| format!("'{}'", c)).collect();
        return Err(Error::Validation(format!(
            "Failed to create user `{}`: it contains the following restricted characters: [{}]. \
             Only letters, numbers, dashes and underscores are allowed",
            user.username,
            listed.join(", ")
        )));
    }
    if user.username.is_empty() {
        return Err(Error::Validation("Failed to create user: username is empty".to_string()));
    }
    if !EMAIL.is_match(&user.email) {
        return Err(Error::Validation(format!(
            "Failed to create user `{}`: email address `{}` is invalid",
            user.username, user.email
        )));
    }
    if user.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::Validation(format!(
            "Failed to create user `{}`: password must be at least {} characters",
            user.username, MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Insert a new account with an expired password. Returns the new id.
///
/// A uniqueness violation is reported by naming whichever of username or email
/// is already taken.
pub fn create_user<Q: QueryExecutor + ?Sized>(db: &Q, user: &NewUser) -> Result<i64, Error> {
    validate_new_user(user)?;
    let email = user.email.to_lowercase();
    let role = if user.admin { ROLE_ADMIN } else { ROLE_STANDARD };
    let statement = Statement::new(
        "INSERT INTO app_user (username, email, password, role, password_expired) \
         VALUES (?1, ?2, ?3, ?4, 1)",
        vec![
            Value::Text(user.username.clone()),
            Value::Text(email.clone()),
            Value::Text(hash_password(&user.password)?),
            Value::Integer(role),
        ],
    );

    match db.execute_all(&[statement]) {
        Ok(_) => {}
        Err(Error::Database(rusqlite::Error::SqliteFailure(e, _)))
            if e.code == ErrorCode::ConstraintViolation =>
        {
            let mut reasons = Vec::new();
            if queries::user_id_by_username(db, &user.username)?.is_some() {
                reasons.push(format!("Username: `{}` is already taken", user.username));
            }
            if queries::user_id_by_email(db, &email)?.is_some() {
                reasons.push(format!("Email: `{}` is already taken", email));
            }
            return Err(Error::Integrity(format!(
                "Failed to create user `{}`: {}",
                user.username,
                reasons.join("; ")
            )));
        }
        Err(e) => return Err(e),
    }

    let id = queries::user_id_by_username(db, &user.username)?
        .ok_or_else(|| Error::Integrity(format!("user `{}` vanished after insert", user.username)))?;
    info!("Created user {} (id {})", user.username, id);
    Ok(id)
}

/// Delete an account by username. Returns false when no such user exists.
pub fn delete_user<Q: QueryExecutor + ?Sized>(db: &Q, username: &str) -> Result<bool, Error> {
    if queries::user_id_by_username(db, username)?.is_none() {
        return Ok(false);
    }
    db.execute_all(&[Statement::new(
        "DELETE FROM app_user WHERE username = ?1",
        vec![Value::Text(username.to_string())],
    )])?;
    info!("Deleted user {}", username);
    Ok(true)
}

/// Replace a user's password after checking the current one, clearing the expiry flag.
pub fn reset_password<Q: QueryExecutor + ?Sized>(db: &Q, request: &UserRequest) -> Result<(), Error> {
    let UserRequest::PasswordReset {
        username,
        current_password,
        new_password,
    } = request
    else {
        return Err(Error::Validation("expected a password reset request".to_string()));
    };

    let account = queries::user_by_username(db, username)?
        .ok_or_else(|| Error::Validation(format!("No user found with username: `{}`", username)))?;
    let stored = db.query_first(&Statement::new(
        "SELECT password FROM app_user WHERE id = ?1",
        vec![Value::Integer(account.id)],
    ))?;
    let verified = matches!(&stored, Some(Value::Text(hash)) if verify_password(current_password, hash));
    if !verified {
        return Err(Error::Validation("Current password is incorrect".to_string()));
    }

    let update = EntityUpdate::User {
        id: account.id,
        fields: UserFields {
            password_hash: Some(hash_password(new_password)?),
            password_expired: Some(false),
            ..Default::default()
        },
    };
    apply_update(db, &update)?;
    Ok(())
}
