//! Conversions between caller-facing header maps and the native [`HeaderMap`].

// self
use crate::{_prelude::*, adapter::RequestOptions, error::InvalidHeaderError};

/// Builds a native header collection from the caller's options.
///
/// Missing options or a missing header map yield an empty collection. Entries are appended, so
/// a name that normalizes to one already present (header names are case-insensitive) becomes a
/// second value instead of replacing the first.
pub fn build_headers(
	options: Option<&RequestOptions>,
) -> Result<HeaderMap, InvalidHeaderError> {
	let mut headers = HeaderMap::new();
	let Some(entries) = options.and_then(|options| options.headers.as_ref()) else {
		return Ok(headers);
	};

	for (key, value) in entries {
		append_header(&mut headers, key, value)?;
	}

	Ok(headers)
}

/// Validates and appends a single header.
pub fn append_header(
	headers: &mut HeaderMap,
	name: &str,
	value: &str,
) -> Result<(), InvalidHeaderError> {
	let header_name =
		HeaderName::from_bytes(name.as_bytes()).map_err(|e| InvalidHeaderError::new(name, e))?;
	let header_value =
		HeaderValue::from_str(value).map_err(|e| InvalidHeaderError::new(name, e))?;

	headers.append(header_name, header_value);

	Ok(())
}

/// Flattens a native header collection into a plain map keyed by lowercase header name.
///
/// Multi-valued headers are lossy here: when a name repeats, the last value wins. Values that
/// are not valid UTF-8 are decoded lossily.
pub fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
	let mut flat = HashMap::with_capacity(headers.keys_len());

	for (name, value) in headers {
		let value = String::from_utf8_lossy(value.as_bytes()).into_owned();

		flat.insert(name.as_str().to_owned(), value);
	}

	flat
}
