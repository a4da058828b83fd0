use std::pin::Pin;

use actix_web::{web, FromRequest};
use argon2::{
	password_hash::{rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString},
	Argon2, PasswordHash,
};
use futures_util::Future;
use time::OffsetDateTime;

use crate::{config::Config, error::ApiError, model::User, store};

pub const TOKEN_COOKIE: &str = "token";

// 7 days in seconds
const DEFAULT_EXPIRY: i64 = 60 * 60 * 24 * 7;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
	let argon2 = Argon2::default();
	let salt = SaltString::generate(&mut OsRng);

	let hash = argon2
		.hash_password(password.as_bytes(), &salt)?
		.to_string();

	// Verify hash immediately after creation
	argon2.verify_password(password.as_bytes(), &PasswordHash::new(&hash)?)?;

	Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> Result<(), argon2::password_hash::Error> {
	Argon2::default().verify_password(password.as_bytes(), &PasswordHash::new(hash)?)
}

/// The logged in user. Take `Result<Session, ApiError>` to handle a missing
/// login yourself, so a failed lookup is not mistaken for a logged out user.
pub struct Session {
	pub user: User,
	pub token: String,
}

impl FromRequest for Session {
	type Error = ApiError;
	type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

	fn from_request(
		req: &actix_web::HttpRequest,
		_payload: &mut actix_web::dev::Payload,
	) -> Self::Future {
		let req = req.clone();
		Box::pin(async move {
			let sql = if let Some(x) = req.app_data::<web::Data<store::Db>>() {
				x
			} else {
				return Err(ApiError::Internal("unable to retrieve db".into()));
			};

			let expiry = req
				.app_data::<web::Data<Config>>()
				.map(|x| x.session_expiry)
				.unwrap_or(DEFAULT_EXPIRY);

			let token = if let Some(x) = req.cookie(TOKEN_COOKIE) {
				x.value().to_owned()
			} else {
				return Err(ApiError::Unauthorized);
			};

			let not_before = OffsetDateTime::now_utc().unix_timestamp() - expiry;

			let user = store::session_user(&***sql, &token, not_before)
				.await?
				.ok_or(ApiError::Unauthorized)?;

			Ok(Session { user, token })
		})
	}
}

#[test]
fn password_round_trip() {
	let hash = hash_password("correct horse").unwrap();

	assert!(hash.starts_with("$argon2"));
	verify_password("correct horse", &hash).unwrap();
	verify_password("wrong horse", &hash).unwrap_err();
	verify_password("correct horse", "not a hash").unwrap_err();
}
