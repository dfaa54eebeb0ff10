//! Resolve where the Rai relinker redirects to.
//!
//! The relinker answers a GET with a redirect to the actual media file. Which
//! file depends on the request: without a `User-Agent` it points to an MP4,
//! with one it points to an M3U8 playlist. That is server behaviour, nothing
//! here relies on the kind of target.

use std::time::Duration;

use ureq::http::header::{ACCEPT, HOST, LOCATION, ToStrError, USER_AGENT};
use ureq::http::{HeaderName, HeaderValue, Uri};

use crate::http;

pub const RELINKER_HOST: &str = "mediapolisvod.rai.it";
pub const RELINKER_URL: &str = "http://mediapolisvod.rai.it/relinker/relinkerServlet.htm?cont=mlvVsVxXVmco7ouKF7CFTgeeqqEEqualeeqqEEqual";
const RELINKER_URL_WITHOUT_CONTENT_ID: &str =
    "http://mediapolisvod.rai.it/relinker/relinkerServlet.htm?cont=";

const ACCEPT_ANY: HeaderValue = HeaderValue::from_static("*/*");

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("relinker URL `{0}` is not valid")]
    InvalidUrl(String),
    #[error("relinker request failed")]
    Network(#[from] ureq::Error),
    #[error("relinker responded with HTTP {status} without a location header")]
    MissingHeader { status: u16 },
    #[error("relinker location header is not a printable string")]
    InvalidHeader(#[from] ToStrError),
}

/// Shape of the request sent to the relinker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    #[default]
    WithoutUserAgent,
    /// `User-Agent` is set to the relinker hostname.
    WithUserAgent,
}

impl Variant {
    pub const ALL: [Self; 2] = [Self::WithoutUserAgent, Self::WithUserAgent];
}

impl From<bool> for Variant {
    fn from(without_user_agent: bool) -> Self {
        if without_user_agent {
            Self::WithoutUserAgent
        } else {
            Self::WithUserAgent
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestHeader {
    Accept,
    Host,
    UserAgent,
}

impl RequestHeader {
    pub const ALL: [Self; 3] = [Self::Accept, Self::Host, Self::UserAgent];

    pub const fn name(self) -> HeaderName {
        match self {
            Self::Accept => ACCEPT,
            Self::Host => HOST,
            Self::UserAgent => USER_AGENT,
        }
    }
}

/// The only headers a relinker request ever carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeaders {
    accept: HeaderValue,
    host: HeaderValue,
    user_agent: Option<HeaderValue>,
}

impl RequestHeaders {
    fn new(host: &HeaderValue, variant: Variant) -> Self {
        let user_agent = match variant {
            Variant::WithoutUserAgent => None,
            Variant::WithUserAgent => Some(host.clone()),
        };
        Self {
            accept: ACCEPT_ANY,
            host: host.clone(),
            user_agent,
        }
    }

    pub const fn get(&self, header: RequestHeader) -> Option<&HeaderValue> {
        match header {
            RequestHeader::Accept => Some(&self.accept),
            RequestHeader::Host => Some(&self.host),
            RequestHeader::UserAgent => self.user_agent.as_ref(),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (HeaderName, HeaderValue)> {
        RequestHeader::ALL.into_iter().filter_map(|header| {
            self.get(header)
                .map(|value| (header.name(), value.clone()))
        })
    }
}

#[derive(Debug, Clone)]
pub struct Relinker {
    url: String,
    host: HeaderValue,
    timeout: Duration,
}

impl Default for Relinker {
    fn default() -> Self {
        Self {
            url: RELINKER_URL.to_owned(),
            host: HeaderValue::from_static(RELINKER_HOST),
            timeout: http::DEFAULT_TIMEOUT,
        }
    }
}

impl Relinker {
    /// Relinker at `url`, using the host of the URL as hostname.
    pub fn new(url: &str) -> Result<Self, ResolveError> {
        let invalid = || ResolveError::InvalidUrl(url.to_owned());
        let uri = url.parse::<Uri>().map_err(|_| invalid())?;
        if uri.scheme().is_none() {
            return Err(invalid());
        }
        let host = uri.host().ok_or_else(invalid)?;
        let host = HeaderValue::from_str(host).map_err(|_| invalid())?;
        Ok(Self {
            url: url.to_owned(),
            host,
            timeout: http::DEFAULT_TIMEOUT,
        })
    }

    /// The default relinker endpoint with another content id.
    pub fn for_content_id(content_id: &str) -> Result<Self, ResolveError> {
        if content_id.is_empty() {
            return Err(ResolveError::InvalidUrl(
                RELINKER_URL_WITHOUT_CONTENT_ID.to_owned(),
            ));
        }
        Self::new(&format!("{RELINKER_URL_WITHOUT_CONTENT_ID}{content_id}"))
    }

    /// Override the hostname sent as `Host` and `User-Agent`.
    #[cfg(test)]
    pub fn with_host(mut self, host: &str) -> Result<Self, ResolveError> {
        self.host =
            HeaderValue::from_str(host).map_err(|_| ResolveError::InvalidUrl(host.to_owned()))?;
        Ok(self)
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub const fn host(&self) -> &HeaderValue {
        &self.host
    }

    pub fn headers(&self, variant: Variant) -> RequestHeaders {
        RequestHeaders::new(&self.host, variant)
    }

    /// Send a single GET and return the `Location` it answers with.
    pub fn resolve(&self, variant: Variant) -> Result<String, ResolveError> {
        tracing::debug!(?variant, url = %self.url, "resolve relinker");
        let agent = http::relinker_agent(self.timeout);
        let mut request = agent.get(&self.url);
        for (name, value) in self.headers(variant).entries() {
            request = request.header(name, value);
        }
        let response = request.call()?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .ok_or(ResolveError::MissingHeader {
                status: status.as_u16(),
            })?
            .to_str()?
            .to_owned();
        tracing::debug!(%status, %location, "relinker responded");
        Ok(location)
    }
}
