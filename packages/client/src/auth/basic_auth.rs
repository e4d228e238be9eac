//! Basic authentication header encoding

use std::io::Write;

use base64::prelude::BASE64_STANDARD;
use base64::{Engine, write::EncoderWriter};
use http::HeaderValue;

/// `Basic base64(user:password)` marked sensitive so it never shows in
/// header debug output. A missing password encodes as `user:`.
pub fn basic_auth<U, P>(
    username: U,
    password: Option<P>,
) -> Result<HeaderValue, crate::error::HttpError>
where
    U: std::fmt::Display,
    P: std::fmt::Display,
{
    let mut buf = b"Basic ".to_vec();
    {
        let mut encoder = EncoderWriter::new(&mut buf, &BASE64_STANDARD);
        let _ = write!(encoder, "{username}:");
        if let Some(password) = password {
            let _ = write!(encoder, "{password}");
        }
    }
    let mut header = HeaderValue::from_bytes(&buf)
        .map_err(|_e| crate::error::invalid_header("invalid authorization header"))?;
    header.set_sensitive(true);
    Ok(header)
}

/// Split a base64 `user:password` token back into its parts.
pub fn decode_basic_auth(encoded: &str) -> Result<(String, String), crate::error::HttpError> {
    let encoded = encoded.strip_prefix("Basic ").unwrap_or(encoded);
    let decoded = BASE64_STANDARD.decode(encoded).map_err(|_| {
        crate::error::invalid_header("Invalid base64 encoding in authorization header")
    })?;

    let credentials = String::from_utf8(decoded)
        .map_err(|_| crate::error::invalid_header("Invalid UTF-8 in authorization header"))?;

    let Some((user, password)) = credentials.split_once(':') else {
        return Err(crate::error::invalid_header(
            "Invalid format in authorization header",
        ));
    };

    Ok((user.to_string(), password.to_string()))
}
