use log::{debug, error, info};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

mod strava_structs;

pub use crate::strava_structs::StravaActivity;

pub const STRAVA_API_HOST: &str = "https://www.strava.com";
const ACTIVITIES_ROUTE: &str = "api/v3/athlete/activities";

#[derive(Debug, Error)]
pub enum StravaError {
    #[error("Strava rejected the access token (HTTP {status})")]
    Unauthorized { status: StatusCode },
    #[error("Strava request failed with HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Unable to reach Strava: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Unexpected activity payload from Strava: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("Invalid Strava base url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Access token is not a valid header value")]
    InvalidToken,
}

/// Basic set of public functions required to page through activities.
pub trait ClientTraits {
    fn list_activities(
        &self,
        auth_token: &str,
        page: u32,
        per_page: u32,
        after: i64,
    ) -> Result<Vec<StravaActivity>, StravaError>;
}

/// Blocking client for the Strava v3 athlete activity list. Strava
/// uses short-lived bearer tokens; obtaining one is left to the caller,
/// this client only sends it along with every request.
pub struct StravaClient {
    client: Client,
    api_host: Url,
}

impl StravaClient {
    pub fn new() -> Result<StravaClient, StravaError> {
        StravaClient::with_base_url(STRAVA_API_HOST)
    }

    /// Points the client at a different host, e.g. a local mock server.
    pub fn with_base_url(base_url: &str) -> Result<StravaClient, StravaError> {
        let mut api_host = Url::parse(base_url)?;
        if !api_host.path().ends_with('/') {
            let path = format!("{}/", api_host.path());
            api_host.set_path(&path);
        }
        Ok(StravaClient {
            client: Client::builder().build()?,
            api_host,
        })
    }

    fn build_api_url(&self, route: &str) -> Result<Url, StravaError> {
        Ok(self.api_host.join(route)?)
    }
}

impl ClientTraits for StravaClient {
    /// Requests a single page of the athlete's activities that started
    /// after the `after` epoch timestamp. An empty vector means there
    /// are no more pages.
    fn list_activities(
        &self,
        auth_token: &str,
        page: u32,
        per_page: u32,
        after: i64,
    ) -> Result<Vec<StravaActivity>, StravaError> {
        let url = self.build_api_url(ACTIVITIES_ROUTE)?;

        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", auth_token))
            .map_err(|_| StravaError::InvalidToken)?;
        headers.insert(AUTHORIZATION, bearer);

        debug!("Requesting activity page {} from: {}", page, url);

        let response = self
            .client
            .get(url)
            .headers(headers)
            .query(&[
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
                ("after", after.to_string()),
            ])
            .send()?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            error!("Strava refused the access token, HTTP {}", status);
            return Err(StravaError::Unauthorized { status });
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            error!("Strava returned HTTP {} for page {}", status, page);
            return Err(StravaError::Status { status, body });
        }

        let body = response.text()?;
        let activities: Vec<StravaActivity> = serde_json::from_str(&body)?;
        info!("Got {} activities on page {}", activities.len(), page);
        Ok(activities)
    }
}
