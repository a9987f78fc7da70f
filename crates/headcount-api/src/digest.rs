// HTTP digest authentication
//
// Cameras answer an unauthenticated request with `401` and a
// `WWW-Authenticate: Digest ...` challenge. We answer it once per request;
// credentials are per device and never leave the owning client.

use reqwest::header::{HeaderMap, WWW_AUTHENTICATE};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::Error;

/// Pick the digest challenge out of the response headers.
///
/// Devices may offer several schemes (`Basic` and `Digest`); only the
/// digest one is usable.
pub(crate) fn digest_challenge(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| {
            v.trim_start()
                .get(..6)
                .is_some_and(|scheme| scheme.eq_ignore_ascii_case("digest"))
        })
        .map(str::to_owned)
}

/// Compute the `Authorization` header value answering `challenge` for a
/// GET of `url`.
pub(crate) fn authorization(
    challenge: &str,
    url: &Url,
    username: &str,
    password: &SecretString,
) -> Result<String, Error> {
    let mut prompt =
        digest_auth::parse(challenge).map_err(|e| Error::DigestChallenge(e.to_string()))?;

    let uri = match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_owned(),
    };
    let context = digest_auth::AuthContext::new(username, password.expose_secret(), uri);

    let answer = prompt
        .respond(&context)
        .map_err(|e| Error::DigestChallenge(e.to_string()))?;
    Ok(answer.to_header_string())
}
