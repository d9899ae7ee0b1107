//! Cloud-storage API client.
//!
//! Async HTTP client using `reqwest`. Every call carries the account's
//! access token as a query parameter and a User-Agent picked at random from
//! [`USER_AGENTS`].

use std::path::Path;
use std::time::Duration;

use panxfer_protocol::constants::{
    CHUNK_FORM_FIELD, CHUNK_UPLOAD_TYPE, CHUNK_UPLOAD_URI, CREATE_URI, FILE_METAS_URI,
    OPEN_API_DOMAIN, PCS_API_DOMAIN, PCS_DATA_DOMAIN, PCS_DOWNLOAD_URI, PRECREATE_URI,
    USER_AGENTS, USER_INFO_URI,
};
use panxfer_protocol::messages::{CommitRequest, PrecreateRequest};
use panxfer_protocol::{
    ChunkUploadResponse, FileInfo, FileMetasResponse, PrecreateResponse, ResponseStatus,
    UserInfoResponse,
};
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, RANGE, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the cloud-storage client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API error {code}: {message} (request {request_id})")]
    Api {
        code: i64,
        message: String,
        request_id: u64,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("probe failed: {0}")]
    Probe(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("no download link for fs_id {0}")]
    NotFound(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid access token")]
    InvalidToken,
}

/// Base URLs of the three service hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub open_api: String,
    pub pcs_data: String,
    pub pcs_api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            open_api: OPEN_API_DOMAIN.to_string(),
            pcs_data: PCS_DATA_DOMAIN.to_string(),
            pcs_api: PCS_API_DOMAIN.to_string(),
        }
    }
}

/// Result of a HEAD probe on a download link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeProbe {
    pub accepts_ranges: bool,
    pub content_length: u64,
}

/// Cloud-storage API client.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    access_token: String,
    endpoints: Endpoints,
}

impl Client {
    /// Creates a new client authenticated with `access_token`.
    pub fn new(access_token: &str) -> Result<Self, Error> {
        if access_token.trim().is_empty() {
            return Err(Error::InvalidToken);
        }

        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            access_token: access_token.to_string(),
            endpoints: Endpoints::default(),
        })
    }

    /// Points the client at alternative hosts.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn request(&self, method: reqwest::Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(USER_AGENT, random_user_agent())
    }

    fn authed(&self, method: reqwest::Method, base: &str, uri: &str) -> RequestBuilder {
        self.request(method, &format!("{base}{uri}"))
            .query(&[("access_token", self.access_token.as_str())])
    }

    // -----------------------------------------------------------------------
    // Downloads
    // -----------------------------------------------------------------------

    /// Issues a HEAD request and reports range support and total length.
    pub async fn probe(&self, url: &str) -> Result<RangeProbe, Error> {
        let resp = self.request(reqwest::Method::HEAD, url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Probe(format!("status {}", status.as_u16())));
        }

        let headers = resp.headers();
        let accepts_ranges = headers
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("bytes"));
        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .ok_or_else(|| Error::Probe("missing or invalid Content-Length".into()))?;

        debug!(url, accepts_ranges, content_length, "probed download link");
        Ok(RangeProbe {
            accepts_ranges,
            content_length,
        })
    }

    /// Fetches the inclusive byte range `[from, to]` of `url`.
    ///
    /// The body is returned as received; callers verify its length.
    pub async fn fetch_range(&self, url: &str, from: u64, to: u64) -> Result<Vec<u8>, Error> {
        let resp = self
            .request(reqwest::Method::GET, url)
            .header(RANGE, format!("bytes={from}-{to}"))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }

    /// Streams the whole body of `url` into `dest`. Returns bytes written.
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, Error> {
        let mut resp = self.request(reqwest::Method::GET, url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }

    /// Appends the access token to a download link.
    ///
    /// A link that already carries an `access_token` is returned unchanged.
    pub fn authorize_link(&self, link: &str) -> Result<String, Error> {
        let mut url = Url::parse(link).map_err(|e| Error::InvalidUrl(format!("{link}: {e}")))?;
        if !url.query_pairs().any(|(key, _)| key == "access_token") {
            url.query_pairs_mut()
                .append_pair("access_token", &self.access_token);
        }
        Ok(url.to_string())
    }

    /// Resolves the authorized download link of a stored file by id.
    pub async fn download_link(&self, fs_id: u64) -> Result<String, Error> {
        let metas = self.file_metas(&[fs_id]).await?;
        let link = metas
            .list
            .into_iter()
            .find(|m| m.fs_id == fs_id && !m.dlink.is_empty())
            .map(|m| m.dlink)
            .ok_or(Error::NotFound(fs_id))?;
        self.authorize_link(&link)
    }

    /// Builds the authorized PCS download URL of a stored file by path.
    pub fn path_download_url(&self, path: &str) -> Result<String, Error> {
        let base = format!("{}{}", self.endpoints.pcs_api, PCS_DOWNLOAD_URI);
        let url = Url::parse_with_params(
            &base,
            &[("path", path), ("access_token", self.access_token.as_str())],
        )
        .map_err(|e| Error::InvalidUrl(format!("{base}: {e}")))?;
        Ok(url.to_string())
    }

    // -----------------------------------------------------------------------
    // Metadata
    // -----------------------------------------------------------------------

    /// Returns the account's profile, including its VIP level.
    pub async fn user_info(&self) -> Result<UserInfoResponse, Error> {
        let resp = self
            .authed(reqwest::Method::GET, &self.endpoints.open_api, USER_INFO_URI)
            .send()
            .await?;
        decode(resp).await
    }

    /// Looks up stored files by id, requesting their download links.
    pub async fn file_metas(&self, fs_ids: &[u64]) -> Result<FileMetasResponse, Error> {
        let fsids = serde_json::to_string(fs_ids)?;
        let resp = self
            .authed(reqwest::Method::GET, &self.endpoints.open_api, FILE_METAS_URI)
            .query(&[("fsids", fsids.as_str()), ("dlink", "1")])
            .send()
            .await?;
        decode(resp).await
    }

    // -----------------------------------------------------------------------
    // Uploads
    // -----------------------------------------------------------------------

    /// Opens an upload session, or reports that the content already exists.
    pub async fn precreate(&self, req: &PrecreateRequest) -> Result<PrecreateResponse, Error> {
        let form = req.to_form()?;
        let resp = self
            .authed(reqwest::Method::POST, &self.endpoints.open_api, PRECREATE_URI)
            .form(&form)
            .send()
            .await?;
        decode(resp).await
    }

    /// Uploads chunk `seq` of session `upload_id` as a multipart body.
    pub async fn upload_chunk(
        &self,
        path: &str,
        upload_id: &str,
        seq: u32,
        data: Vec<u8>,
    ) -> Result<ChunkUploadResponse, Error> {
        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        let form = Form::new().part(CHUNK_FORM_FIELD, Part::bytes(data).file_name(file_name));
        let seq = seq.to_string();

        let resp = self
            .authed(reqwest::Method::POST, &self.endpoints.pcs_data, CHUNK_UPLOAD_URI)
            .query(&[
                ("path", path),
                ("type", CHUNK_UPLOAD_TYPE),
                ("uploadid", upload_id),
                ("partseq", seq.as_str()),
            ])
            .multipart(form)
            .send()
            .await?;
        decode(resp).await
    }

    /// Commits an upload session into a stored file.
    pub async fn create(&self, req: &CommitRequest) -> Result<FileInfo, Error> {
        let form = req.to_form()?;
        let resp = self
            .authed(reqwest::Method::POST, &self.endpoints.open_api, CREATE_URI)
            .form(&form)
            .send()
            .await?;
        decode(resp).await
    }
}

fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
}

/// Decodes a JSON response, surfacing the service's error envelope first.
///
/// The service often reports failures with a JSON body on a non-2xx status,
/// so the body is parsed before the status is checked.
async fn decode<T>(resp: reqwest::Response) -> Result<T, Error>
where
    T: DeserializeOwned + ResponseStatus,
{
    let status = resp.status();
    let body = resp.bytes().await?;
    let parsed = serde_json::from_slice::<T>(&body);

    if let Ok(value) = &parsed
        && !value.is_ok()
    {
        return Err(Error::Api {
            code: value.code(),
            message: value.message().to_string(),
            request_id: value.request_id(),
        });
    }
    if !status.is_success() {
        return Err(Error::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    Ok(parsed?)
}
