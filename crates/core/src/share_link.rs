use thiserror::Error;
use url::Url;

use crate::model::{ParseIdError, SessionId};

/// Query parameter carrying the session id.
pub const SESSION_PARAM: &str = "session";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ShareLinkError {
    #[error("invalid share link: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("share link has no `session` parameter")]
    MissingSession,

    #[error(transparent)]
    InvalidSession(#[from] ParseIdError),
}

/// Link a host hands to the partner: `<base_url>?session=<session_id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    url: Url,
    session_id: SessionId,
}

impl ShareLink {
    /// Build a link on top of `base`. Existing query pairs are kept; an older
    /// `session` pair is replaced.
    #[must_use]
    pub fn new(base: &Url, session_id: SessionId) -> Self {
        let mut url = base.clone();
        let kept: Vec<(String, String)> = base
            .query_pairs()
            .filter(|(k, _)| k != SESSION_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (k, v) in &kept {
                pairs.append_pair(k, v);
            }
            pairs.append_pair(SESSION_PARAM, &session_id.to_string());
        }
        Self { url, session_id }
    }

    /// Parse a link received on page load.
    ///
    /// # Errors
    ///
    /// Returns `ShareLinkError` when the URL is malformed, has no `session`
    /// parameter, or the parameter is not a valid session id.
    pub fn parse(raw: &str) -> Result<Self, ShareLinkError> {
        let url = Url::parse(raw.trim())?;
        let session_id = session_id_from(&url)?;
        Ok(Self { url, session_id })
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

fn session_id_from(url: &Url) -> Result<SessionId, ShareLinkError> {
    let raw = url
        .query_pairs()
        .find(|(k, _)| k == SESSION_PARAM)
        .map(|(_, v)| v.into_owned())
        .ok_or(ShareLinkError::MissingSession)?;
    Ok(raw.parse::<SessionId>()?)
}

impl std::fmt::Display for ShareLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://budget.example/quiz").unwrap()
    }

    #[test]
    fn link_carries_session_param() {
        let id = SessionId::generate();
        let link = ShareLink::new(&base(), id);
        assert_eq!(
            link.as_str(),
            format!("https://budget.example/quiz?session={id}")
        );
        assert_eq!(ShareLink::parse(link.as_str()).unwrap().session_id(), id);
    }

    #[test]
    fn existing_query_is_preserved() {
        let id = SessionId::generate();
        let base = Url::parse("https://budget.example/quiz?lang=en&session=old").unwrap();
        let link = ShareLink::new(&base, id);
        assert_eq!(
            link.as_str(),
            format!("https://budget.example/quiz?lang=en&session={id}")
        );
    }

    #[test]
    fn missing_param_is_reported() {
        let err = ShareLink::parse("https://budget.example/quiz?lang=en").unwrap_err();
        assert_eq!(err, ShareLinkError::MissingSession);
    }

    #[test]
    fn malformed_id_is_reported() {
        let err = ShareLink::parse("https://budget.example/quiz?session=42").unwrap_err();
        assert!(matches!(err, ShareLinkError::InvalidSession(_)));
    }

    #[test]
    fn malformed_url_is_reported() {
        let err = ShareLink::parse("not a url").unwrap_err();
        assert!(matches!(err, ShareLinkError::InvalidUrl(_)));
    }
}
