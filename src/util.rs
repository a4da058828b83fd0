use std::path::Path;

use mime::Mime;
use serde::Serializer;
use time::{macros::format_description, OffsetDateTime, UtcOffset};

const TOKEN_CHARSET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn generate_token() -> String {
	// generate a unique 128-char token identifier.
	random_string::generate(128, TOKEN_CHARSET)
}

/// Picks the on-disk name for an upload. The client's name only contributes its extension.
pub fn generate_file_name(original: &str, filetype: &Mime) -> String {
	let stem = random_string::generate(32, TOKEN_CHARSET);

	let from_name = Path::new(original)
		.extension()
		.and_then(|x| x.to_str())
		.filter(|x| (1..=8).contains(&x.len()) && x.chars().all(|c| c.is_ascii_alphanumeric()))
		.map(|x| x.to_ascii_lowercase());

	let extension = from_name.unwrap_or_else(|| {
		filetype
			.subtype()
			.as_str()
			.chars()
			.take_while(|c| c.is_ascii_alphanumeric())
			.collect()
	});

	if extension.is_empty() {
		stem
	} else {
		format!("{stem}.{extension}")
	}
}

/// Only names we handed out ourselves may be served or deleted.
pub fn is_safe_file_name(name: &str) -> bool {
	!name.is_empty()
		&& !name.starts_with('.')
		&& name.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
}

pub fn format_time(time: OffsetDateTime) -> Result<String, time::error::Format> {
	time.to_offset(UtcOffset::UTC)
		.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
}

pub fn human_time<S: Serializer>(time: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
	let text = format_time(*time).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&text)
}

#[test]
fn token_shape() {
	let token = generate_token();

	assert_eq!(token.len(), 128);
	assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
	assert_ne!(token, generate_token());
}

#[test]
fn file_names() {
	let name = generate_file_name("holiday.JPG", &mime::IMAGE_JPEG);
	assert!(name.ends_with(".jpg"));
	assert_eq!(name.len(), 32 + 4);
	assert!(is_safe_file_name(&name));

	let name = generate_file_name("no_extension", &mime::IMAGE_PNG);
	assert!(name.ends_with(".png"));

	let name = generate_file_name("../../etc/passwd.$$", &mime::IMAGE_SVG);
	assert!(name.ends_with(".svg"));
	assert!(is_safe_file_name(&name));
}

#[test]
fn unsafe_file_names() {
	assert!(!is_safe_file_name(""));
	assert!(!is_safe_file_name("../secret"));
	assert!(!is_safe_file_name(".env"));
	assert!(!is_safe_file_name("a/b.png"));
	assert!(is_safe_file_name("abc123.png"));
}

#[test]
fn time_format() {
	let time = time::macros::datetime!(2024-03-09 07:05:01 +02:00);

	assert_eq!(format_time(time).unwrap(), "2024-03-09 05:05:01");
}
