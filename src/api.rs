use std::time::Duration;

use anyhow::{bail, Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;

use crate::session::Session;
use crate::state::{Credentials, Market, PostTransfer, PutPlayer, PutTeam, Team};

const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_TOKEN_HEADER: &str = "User-Token";

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

pub fn base_url() -> String {
    let raw = std::env::var("SOCCER_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());
    raw.trim_end_matches('/').to_string()
}

/// Result body of a mutation: empty object on success, `{error}` on an
/// application-level rejection that still travels as HTTP 200.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MutationOutcome {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

fn with_session(request: RequestBuilder, session: Option<&Session>) -> RequestBuilder {
    // Unauthenticated calls simply go out without the header; the backend
    // answers 401-class and the caller surfaces the generic failure.
    match session {
        Some(session) => request.header(USER_TOKEN_HEADER, session.token.as_str()),
        None => request,
    }
}

fn send_for_body(request: RequestBuilder) -> Result<String> {
    let response = request.send().context("request failed")?;
    let status = response.status();
    let body = response.text().context("failed reading body")?;
    if !status.is_success() {
        bail!("http {status}");
    }
    Ok(body)
}

pub fn fetch_team(session: Option<&Session>) -> Result<Team> {
    let client = http_client()?;
    let url = format!("{}/team", base_url());
    let body = send_for_body(with_session(client.get(url), session))?;
    parse_team_json(&body)
}

pub fn fetch_market(session: Option<&Session>) -> Result<Market> {
    let client = http_client()?;
    let url = format!("{}/market", base_url());
    let body = send_for_body(with_session(client.get(url), session))?;
    parse_market_json(&body)
}

pub fn update_player(session: Option<&Session>, put: &PutPlayer) -> Result<MutationOutcome> {
    let client = http_client()?;
    let url = format!("{}/player/{}", base_url(), put.player_id.uuid);
    let body = send_for_body(with_session(client.put(url).json(put), session))?;
    parse_outcome_json(&body)
}

pub fn update_team(session: Option<&Session>, put: &PutTeam) -> Result<MutationOutcome> {
    let client = http_client()?;
    let url = format!("{}/team/{}", base_url(), put.team_id.uuid);
    let body = send_for_body(with_session(client.put(url).json(put), session))?;
    parse_outcome_json(&body)
}

pub fn transfer_player(session: Option<&Session>, post: &PostTransfer) -> Result<MutationOutcome> {
    let client = http_client()?;
    let url = format!("{}/transfer", base_url());
    let body = send_for_body(with_session(client.post(url).json(post), session))?;
    parse_outcome_json(&body)
}

pub fn sign_up(credentials: &Credentials) -> Result<TokenResponse> {
    let client = http_client()?;
    let url = format!("{}/user", base_url());
    let body = send_for_body(client.post(url).json(credentials))?;
    parse_token_json(&body)
}

pub fn sign_in(credentials: &Credentials) -> Result<TokenResponse> {
    let client = http_client()?;
    let url = format!("{}/login", base_url());
    let body = send_for_body(client.post(url).json(credentials))?;
    parse_token_json(&body)
}

pub fn parse_team_json(raw: &str) -> Result<Team> {
    serde_json::from_str(raw.trim()).context("invalid team json")
}

pub fn parse_market_json(raw: &str) -> Result<Market> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Market::default());
    }
    serde_json::from_str(trimmed).context("invalid market json")
}

pub fn parse_outcome_json(raw: &str) -> Result<MutationOutcome> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(MutationOutcome::default());
    }
    serde_json::from_str(trimmed).context("invalid outcome json")
}

pub fn parse_token_json(raw: &str) -> Result<TokenResponse> {
    serde_json::from_str(raw.trim()).context("invalid token json")
}
