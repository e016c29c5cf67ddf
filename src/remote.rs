//! HTTP interface to the annotation backend.
//!
//! The backend serves rendered frames and crops, persists circle edits
//! addressed by flattened grid index, toggles removal flags and accepts
//! telemetry batches:
//!
//! - `GET  image/{imageIndex}[?crop&centerX&centerY&radius&scale&width&height]`
//! - `POST annotation/{index}` with the full [`CircleRecord`] as body
//! - `POST annotation/{index}/toggle-removed`
//! - `POST telemetry/{sessionId}` with a JSON array of events

use std::time::Duration;

use ballcurator_ui::Size;
use image::GenericImageView;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::annotation::{Circle, CircleRecord};
use crate::coords::CropTransform;
use crate::telemetry::SessionId;

/// Errors talking to the backend.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Transport-level failure (connection, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be built
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The server answered with a non-success status
    #[error("{url} answered with status {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Response body was not the expected JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field was absent from the response body
    #[error("{url} response lacks '{field}'")]
    MissingField {
        /// Requested URL
        url: String,
        /// Name of the missing field
        field: &'static str,
    },

    /// Image bytes could not be decoded
    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),
}

/// Crop parameters for a thumbnail request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropParams {
    pub center_x: f32,
    pub center_y: f32,
    pub radius: f32,
    pub scale: f32,
    pub width: u32,
    pub height: u32,
}

/// One image fetch: a whole frame, or a crop of it around a circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageRequest {
    pub image_index: usize,
    pub crop: Option<CropParams>,
}

impl ImageRequest {
    /// The full-resolution frame.
    pub fn full(image_index: usize) -> Self {
        Self {
            image_index,
            crop: None,
        }
    }

    /// A square thumbnail cropped around `circle`. Circles below the
    /// transform's crop floor request the floored crop.
    pub fn cropped(image_index: usize, circle: &Circle, transform: &CropTransform) -> Self {
        let side = transform.render_size.round().max(1.0) as u32;
        Self {
            image_index,
            crop: Some(CropParams {
                center_x: circle.center.x,
                center_y: circle.center.y,
                radius: transform.crop_radius(circle),
                scale: transform.scale_factor,
                width: side,
                height: side,
            }),
        }
    }

    pub fn is_full(&self) -> bool {
        self.crop.is_none()
    }
}

/// Backend answer to a persistence call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistResponse {
    /// Authoritative removal flag, for endpoints that report it
    #[serde(default)]
    pub removed: Option<bool>,
}

/// Backend URL construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// Parse the backend base URL. A missing trailing slash is added so that
    /// relative endpoint paths resolve below it.
    pub fn new(base: &str) -> Result<Self, RemoteError> {
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn image_url(&self, request: &ImageRequest) -> Result<Url, RemoteError> {
        let mut url = self.base.join(&format!("image/{}", request.image_index))?;
        if let Some(crop) = request.crop {
            url.query_pairs_mut()
                .append_key_only("crop")
                .append_pair("centerX", &crop.center_x.to_string())
                .append_pair("centerY", &crop.center_y.to_string())
                .append_pair("radius", &crop.radius.to_string())
                .append_pair("scale", &crop.scale.to_string())
                .append_pair("width", &crop.width.to_string())
                .append_pair("height", &crop.height.to_string());
        }
        Ok(url)
    }

    pub fn persist_url(&self, index: usize) -> Result<Url, RemoteError> {
        Ok(self.base.join(&format!("annotation/{}", index))?)
    }

    pub fn toggle_removed_url(&self, index: usize) -> Result<Url, RemoteError> {
        Ok(self
            .base
            .join(&format!("annotation/{}/toggle-removed", index))?)
    }

    pub fn telemetry_url(&self, session: &SessionId) -> Result<Url, RemoteError> {
        Ok(self.base.join(&format!("telemetry/{}", session))?)
    }
}

/// Operations the curation session needs from the backend.
pub trait AnnotationBackend {
    /// Fetch encoded image bytes.
    fn fetch_image(&self, request: &ImageRequest) -> Result<Vec<u8>, RemoteError>;

    /// Store the full record at grid position `index`.
    fn persist(&self, index: usize, record: &CircleRecord) -> Result<PersistResponse, RemoteError>;

    /// Flip the removal flag at `index`, returning the stored value.
    fn toggle_removed(&self, index: usize) -> Result<bool, RemoteError>;
}

/// Pixel dimensions of an encoded image.
pub fn decode_dimensions(bytes: &[u8]) -> Result<Size, RemoteError> {
    let (width, height) = image::load_from_memory(bytes)?.dimensions();
    Ok(Size::new(width as f32, height as f32))
}

/// Blocking `reqwest` implementation of [`AnnotationBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    endpoints: Endpoints,
}

impl HttpBackend {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ballcurator/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, endpoints })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn check(url: &Url, resp: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, RemoteError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            Err(RemoteError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

impl AnnotationBackend for HttpBackend {
    fn fetch_image(&self, request: &ImageRequest) -> Result<Vec<u8>, RemoteError> {
        let url = self.endpoints.image_url(request)?;
        log::debug!("GET {}", url);
        let resp = self.client.get(url.clone()).send()?;
        let bytes = Self::check(&url, resp)?.bytes()?;
        Ok(bytes.to_vec())
    }

    fn persist(&self, index: usize, record: &CircleRecord) -> Result<PersistResponse, RemoteError> {
        let url = self.endpoints.persist_url(index)?;
        log::debug!("POST {} {:?}", url, record);
        let resp = self.client.post(url.clone()).json(record).send()?;
        let body = Self::check(&url, resp)?.text()?;
        if body.trim().is_empty() {
            return Ok(PersistResponse::default());
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn toggle_removed(&self, index: usize) -> Result<bool, RemoteError> {
        let url = self.endpoints.toggle_removed_url(index)?;
        log::debug!("POST {}", url);
        let resp = self.client.post(url.clone()).send()?;
        let body = Self::check(&url, resp)?.text()?;
        let response: PersistResponse = serde_json::from_str(&body)?;
        response
            .removed
            .ok_or_else(|| RemoteError::MissingField { url: url.to_string(), field: "removed" })
    }
}
