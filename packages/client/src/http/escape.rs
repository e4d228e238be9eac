//! Percent-encoding for userinfo components

/// Percent-encode one userinfo component so `@`, `:`, `\` and spaces
/// survive being embedded in a URI.
pub fn url_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Percent-decode one userinfo component. Invalid UTF-8 falls back to the
/// raw input.
pub fn url_decode(input: &str) -> String {
    urlencoding::decode(input)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| input.to_string())
}
