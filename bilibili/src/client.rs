use crate::{
    error::{Error, Result},
    session::Credential,
};
use log::debug;
use reqwest::{
    StatusCode,
    blocking::Response,
    header::{COOKIE, REFERER},
};
use serde::{Deserialize, de::DeserializeOwned};
use std::io::Read;

pub(crate) const API_BASE: &str = "https://api.bilibili.com";
pub(crate) const PASSPORT_BASE: &str = "https://passport.bilibili.com";

/// Media hosts reject requests that do not present the site as referer.
pub(crate) const SITE_REFERER: &str = "https://www.bilibili.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Response envelope shared by every endpoint. Rest apis answer under
/// `data`, pgc apis under `result`.
#[derive(Deserialize)]
pub(crate) struct Envelope<T> {
    pub(crate) code: i64,
    #[serde(default)]
    pub(crate) message: String,
    #[serde(alias = "result")]
    pub(crate) data: Option<T>,
}

impl<T> Envelope<T> {
    pub(crate) fn into_data(self) -> Result<T> {
        if self.code != 0 {
            return Err(Error::status(self.code, self.message));
        }

        self.data.ok_or(Error::EmptyPayload)
    }
}

/// Session scoped api client. Construct once, optionally attach a
/// [`Credential`], then issue calls; the underlying connection pool is
/// reused across them.
pub struct Client {
    http: reqwest::blocking::Client,
    credential: Option<Credential>,
}

impl Client {
    pub fn new() -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            credential: None,
        })
    }

    /// Attaches authentication tokens; every later request carries them as
    /// a `Cookie` header.
    pub fn set_credential(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub(crate) fn http(&self) -> &reqwest::blocking::Client {
        &self.http
    }

    /// Issues a GET, attaching the session cookie when one is set, and
    /// rejects anything but a 200 answer.
    pub(crate) fn get(&self, url: &str, referer: bool) -> Result<Response> {
        debug!("GET {url}");

        let mut request = self.http.get(url);

        if let Some(credential) = &self.credential {
            if !credential.is_empty() {
                request = request.header(COOKIE, credential.cookie_header());
            }
        }

        if referer {
            request = request.header(REFERER, SITE_REFERER);
        }

        let response = request.send()?;

        if response.status() != StatusCode::OK {
            return Err(Error::UnexpectedStatus(response.status()));
        }

        Ok(response)
    }

    /// GET returning the unwrapped `data` / `result` payload of the json
    /// envelope.
    pub(crate) fn get_json<T: DeserializeOwned>(&self, url: &str, referer: bool) -> Result<T> {
        let body = self.get(url, referer)?.text()?;
        let envelope = serde_json::from_str::<Envelope<T>>(&body)?;
        envelope.into_data()
    }

    /// Current account state, from the site wide identity endpoint. Fails
    /// with a platform [`Error::Status`] when no valid session cookie was
    /// attached.
    pub fn nav(&self) -> Result<NavInfo> {
        self.get_json(&format!("{API_BASE}/x/web-interface/nav"), false)
    }

    /// Whether the attached credential maps to a live account. Transport
    /// and decode failures count as logged out.
    pub fn is_authenticated(&self) -> bool {
        self.nav().map(|nav| nav.is_login).unwrap_or(false)
    }

    /// Opens a media url for streaming.
    pub fn open_media(&self, url: &str) -> Result<MediaStream> {
        let response = self.get(url, true)?;
        Ok(MediaStream::new(response.content_length(), response))
    }
}

/// Subset of the identity endpoint payload.
#[derive(Debug, Deserialize)]
pub struct NavInfo {
    #[serde(rename = "isLogin")]
    pub is_login: bool,
    #[serde(default)]
    pub uname: String,
}

/// An open media download, readable to end, plus its advertised length
/// when the host sent one.
pub struct MediaStream {
    pub content_length: Option<u64>,
    reader: Box<dyn Read + Send>,
}

impl MediaStream {
    pub fn new(content_length: Option<u64>, reader: impl Read + Send + 'static) -> Self {
        Self {
            content_length,
            reader: Box::new(reader),
        }
    }
}

impl Read for MediaStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_unwraps_data() {
        let envelope =
            serde_json::from_str::<Envelope<Vec<i64>>>(r#"{"code":0,"data":[1,2]}"#).unwrap();
        assert_eq!(envelope.into_data().unwrap(), [1, 2]);
    }

    #[test]
    fn envelope_accepts_result_alias() {
        let envelope = serde_json::from_str::<Envelope<Vec<i64>>>(
            r#"{"code":0,"message":"success","result":[3]}"#,
        )
        .unwrap();
        assert_eq!(envelope.into_data().unwrap(), [3]);
    }

    #[test]
    fn envelope_surfaces_platform_code() {
        let envelope =
            serde_json::from_str::<Envelope<Vec<i64>>>(r#"{"code":-400,"message":"请求错误"}"#)
                .unwrap();
        match envelope.into_data() {
            Err(Error::Status { code, message }) => {
                assert_eq!(code, -400);
                assert_eq!(message, "请求错误");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn envelope_rejects_missing_payload() {
        let envelope = serde_json::from_str::<Envelope<Vec<i64>>>(r#"{"code":0}"#).unwrap();
        assert!(matches!(envelope.into_data(), Err(Error::EmptyPayload)));
    }
}
