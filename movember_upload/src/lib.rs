
use log::{debug, error, info};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue};
pub use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use strava_download::NormalizedActivity;

mod movember_structs;

use crate::movember_structs::{AuthRequest, AuthResponse};
pub use crate::movember_structs::{MoveData, NewsfeedPost};

pub const MOVEMBER_API_HOST: &str = "https://api.movember.com";
const AUTH_ROUTE: &str = "v18/auth/";
const NEWSFEED_ROUTE: &str = "v18/newsfeed/";

const AUTH_TOKEN_HEADER: &str = "x-member-auth-token";
const AUTH_ID_HEADER: &str = "x-member-auth-id";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Movember authentication failed: {0}")]
    Authentication(String),
    #[error("Movember request failed with HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Unable to reach Movember: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid Movember base url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// What Movember hands back after logging in. Both values are needed
/// for every feed post.
#[derive(Debug, Clone, PartialEq)]
pub struct MovemberSession {
    pub access_token: String,
    pub member_id: String,
}

/// Posts normalized activities to a Movember member's feed, one
/// request per move. Nothing is batched or deduplicated: publishing
/// the same activity twice creates two moves.
pub struct MovePublisher {
    client: Client,
    api_host: Url,
}

impl MovePublisher {
    pub fn new() -> Result<MovePublisher, UploadError> {
        MovePublisher::with_base_url(MOVEMBER_API_HOST)
    }

    pub fn with_base_url(base_url: &str) -> Result<MovePublisher, UploadError> {
        let mut api_host = Url::parse(base_url)?;
        if !api_host.path().ends_with('/') {
            let path = format!("{}/", api_host.path());
            api_host.set_path(&path);
        }
        Ok(MovePublisher {
            client: Client::builder().build()?,
            api_host,
        })
    }

    /// Logs in with the member's email and password. Rejected
    /// credentials, an incomplete answer, or an unreachable server all
    /// count as an authentication failure.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<MovemberSession, UploadError> {
        let url = self.api_host.join(AUTH_ROUTE)?;
        debug!("Authenticating {} against: {}", email, url);

        let response = self
            .client
            .post(url)
            .json(&AuthRequest {
                username: email,
                password,
            })
            .send()
            .map_err(|e| UploadError::Authentication(format!("unable to reach Movember: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            error!("Movember refused the login for {}, HTTP {}", email, status);
            return Err(UploadError::Authentication(format!(
                "credentials rejected (HTTP {})",
                status
            )));
        }

        let auth: AuthResponse = response
            .json()
            .map_err(|e| UploadError::Authentication(format!("unreadable auth response: {}", e)))?;

        let access_token = auth
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| UploadError::Authentication(String::from("response has no accessToken")))?;

        let member_id = match auth.member_id {
            Some(Value::String(id)) if !id.is_empty() => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(UploadError::Authentication(String::from(
                    "response has no memberId",
                )))
            }
        };

        info!("Authenticated with Movember as member {}", member_id);
        Ok(MovemberSession {
            access_token,
            member_id,
        })
    }

    /// Posts one activity as a move and returns whatever Movember
    /// answered with.
    pub fn publish(
        &self,
        session: &MovemberSession,
        activity: &NormalizedActivity,
    ) -> Result<Value, UploadError> {
        let url = self.api_host.join(NEWSFEED_ROUTE)?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTH_TOKEN_HEADER, header_value(&session.access_token)?);
        headers.insert(AUTH_ID_HEADER, header_value(&session.member_id)?);

        let post = NewsfeedPost::new(&session.member_id, activity);
        debug!("Posting move: {:?}", post.move_data);

        let response = self.client.post(url).headers(headers).json(&post).send()?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            error!("Movember rejected the session token, HTTP {}", status);
            return Err(UploadError::Authentication(format!(
                "session rejected while posting a move (HTTP {})",
                status
            )));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            error!("Movember returned HTTP {} while posting a move", status);
            return Err(UploadError::Status { status, body });
        }

        confirmation(response)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, UploadError> {
    HeaderValue::from_str(value).map_err(|_| {
        UploadError::Authentication(String::from("session values are not valid header values"))
    })
}

fn confirmation(response: Response) -> Result<Value, UploadError> {
    let text = response.text()?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}
