//! Secret extraction from request headers.

const BEARER: &str = "bearer ";

/// First non-empty secret found under `header_names`, searched in order.
///
/// Header names compare case-insensitively. With `extract_bearer`, a
/// leading `Bearer ` scheme (any case) is stripped.
pub fn extract_secret(
    headers: &[(String, String)],
    header_names: &[String],
    extract_bearer: bool,
) -> Option<String> {
    header_names.iter().find_map(|wanted| {
        headers
            .iter()
            .filter(|(name, _)| name.trim().eq_ignore_ascii_case(wanted.trim()))
            .find_map(|(_, value)| secret_from_value(value, extract_bearer))
    })
}

fn secret_from_value(value: &str, extract_bearer: bool) -> Option<String> {
    let mut value = value.trim_start();
    if extract_bearer
        && value.len() >= BEARER.len()
        && value.is_char_boundary(BEARER.len())
        && value[..BEARER.len()].eq_ignore_ascii_case(BEARER)
    {
        value = &value[BEARER.len()..];
    }
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
