// Device API HTTP client
//
// Wraps `reqwest::Client` with device-specific URL construction, Basic
// Auth header handling, and status-code mapping. The schedule endpoints
// are gated behind a capability flag because the current firmware does
// not define them -- see `supports_schedule`.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{DeviceStatus, TimeSlot};
use crate::transport::TransportConfig;

/// Raw HTTP client for the relay device's REST surface.
///
/// Every request carries the same `Authorization: Basic` header; the
/// device holds no session state. Credentials are captured once at
/// construction.
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    /// Whether the firmware exposes schedule endpoints. No shipped
    /// firmware does today, so this is always constructed `false`.
    schedule_supported: bool,
}

impl DeviceClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` should be the device root (e.g. `http://192.168.4.1`).
    pub fn new(
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            username: username.into(),
            password,
            schedule_supported: false,
        })
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether this firmware exposes schedule read/write endpoints.
    ///
    /// Always `false` for current firmware; callers must degrade
    /// gracefully (empty list, local-only save) rather than guess a
    /// wire format.
    pub fn supports_schedule(&self) -> bool {
        self.schedule_supported
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build a full URL for a device path (e.g. `api/status`, `toggle`).
    fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/status` -- the current relay status snapshot.
    ///
    /// Also serves as the credential probe at login time: a 401 here
    /// means the Basic Auth pair was rejected.
    pub async fn status(&self) -> Result<DeviceStatus, Error> {
        self.get_json(self.url("api/status")?).await
    }

    /// `GET /toggle` -- flip the manual relay state.
    ///
    /// Legacy firmware answers with plain-text `"ON"`/`"OFF"`; newer
    /// builds return an empty body. The parsed state is advisory only --
    /// callers should re-poll `status()` rather than trust it.
    pub async fn toggle(&self) -> Result<Option<bool>, Error> {
        let url = self.url("toggle")?;
        debug!(%url, "GET toggle");

        let resp = self.authed(self.http.get(url)).send().await?;
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "invalid credentials".into(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        let body = resp.text().await.unwrap_or_default();
        Ok(match body.trim() {
            "ON" => Some(true),
            "OFF" => Some(false),
            _ => None,
        })
    }

    /// Read the configured time slots from the device.
    ///
    /// No firmware endpoint exists yet; fails with
    /// [`Error::UnsupportedOperation`] without touching the network.
    pub async fn list_slots(&self) -> Result<Vec<TimeSlot>, Error> {
        if !self.supports_schedule() {
            return Err(Error::UnsupportedOperation("time slot listing"));
        }
        self.get_json(self.url("api/slots")?).await
    }

    /// Replace the device's time slots with the given set.
    ///
    /// No firmware endpoint exists yet; fails with
    /// [`Error::UnsupportedOperation`] without touching the network.
    /// The wire format stays undefined until the firmware ships one.
    #[allow(clippy::unused_async)] // signature parity with the read side
    pub async fn replace_slots(&self, _slots: &[TimeSlot]) -> Result<(), Error> {
        Err(Error::UnsupportedOperation("time slot replacement"))
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Attach the Basic Auth header to a request builder.
    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.basic_auth(&self.username, Some(self.password.expose_secret()))
    }

    /// Send an authenticated GET and decode a JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!(%url, "GET");

        let resp = self.authed(self.http.get(url)).send().await?;
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "invalid credentials".into(),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        let body = resp.text().await?;
        trace!(len = body.len(), "response body received");

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", truncate(&body)),
            body,
        })
    }
}

/// Cap error bodies so log lines stay readable.
fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}
