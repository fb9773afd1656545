use anyhow::Context;
use url::Url;

use super::StoredTokens;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCallback {
    pub tokens: StoredTokens,
    /// The callback URL with its query and fragment removed.
    pub visible_url: String,
}

/// Extracts the token pair handed over by the OAuth redirect.
///
/// Both `access_token` and `refresh_token` must be present and non-empty,
/// otherwise the URL is not a callback and `None` is returned.
pub fn parse_oauth_callback(raw: &str) -> anyhow::Result<Option<OAuthCallback>> {
    let parsed = Url::parse(raw.trim()).with_context(|| format!("invalid callback url: {raw}"))?;

    let mut access_token: Option<String> = None;
    let mut refresh_token: Option<String> = None;
    for (key, value) in parsed.query_pairs() {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            "access_token" => access_token = Some(value.to_string()),
            "refresh_token" => refresh_token = Some(value.to_string()),
            _ => {}
        }
    }

    let (Some(access_token), Some(refresh_token)) = (access_token, refresh_token) else {
        return Ok(None);
    };

    let mut visible = parsed;
    visible.set_query(None);
    visible.set_fragment(None);

    Ok(Some(OAuthCallback {
        tokens: StoredTokens {
            auth_token: Some(access_token),
            refresh_token: Some(refresh_token),
        },
        visible_url: visible.to_string(),
    }))
}
