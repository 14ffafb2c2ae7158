//! TORMENTUS REST API client.
//!
//! Public routes (`/api/markets`, `/api/prices`) need no session. Routes
//! under `/api/protected` carry the session token as a bearer header.

use reqwest::{Client, RequestBuilder, Response};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::config::ApiConfig;
use crate::models::market::{Market, VerificationStatus};
use crate::models::quote::PriceUpdate;
use crate::models::trade::{PlaceTradeResponse, Trade, TradeRequest};
use crate::{Result, TormentusError};

/// Trade durations offered by the platform, in seconds.
pub const ALLOWED_DURATIONS: [u32; 4] = [30, 60, 120, 300];

/// Message used when a failed trade response has no `error` string.
pub const TRADE_FAILED_FALLBACK: &str = "Failed to place trade";

/// Returned by protected routes when no session token is attached.
pub const SIGN_IN_REQUIRED: &str = "Sign in to trade";

/// List endpoints answer either with a bare array or wrapped in an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Bare(Vec<T>),
    Markets { markets: Vec<T> },
    Prices { prices: Vec<T> },
}

impl<T> ListBody<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListBody::Bare(items) | ListBody::Markets { markets: items } => items,
            ListBody::Prices { prices } => prices,
        }
    }
}

/// HTTP client for the TORMENTUS backend.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<Zeroizing<String>>,
}

impl ApiClient {
    /// Builds a client with the configured base URL and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TormentusError::Http`] if the underlying client cannot be
    /// constructed.
    pub fn new(config: &ApiConfig, token: Option<Zeroizing<String>>) -> Result<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Replaces the session token (e.g. cleared on logout).
    pub fn set_token(&mut self, token: Option<Zeroizing<String>>) {
        self.token = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Attaches the bearer token; protected routes are refused without one.
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match &self.token {
            Some(token) => Ok(request.bearer_auth(token.as_str())),
            None => Err(TormentusError::Validation(SIGN_IN_REQUIRED.to_string())),
        }
    }

    /// Lists tradable markets.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or the body cannot be decoded.
    pub async fn markets(&self) -> Result<Vec<Market>> {
        let response = self.http.get(self.url("/api/markets")).send().await?;
        let body: ListBody<Market> = decode(response, "Failed to load markets").await?;
        let markets = body.into_vec();
        debug!(count = markets.len(), "Loaded markets");
        Ok(markets)
    }

    /// Fetches the price snapshot used to seed the quote cache.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::markets`].
    pub async fn prices(&self) -> Result<Vec<PriceUpdate>> {
        let response = self.http.get(self.url("/api/prices")).send().await?;
        let body: ListBody<PriceUpdate> = decode(response, "Failed to load prices").await?;
        let prices = body.into_vec();
        debug!(count = prices.len(), "Loaded price snapshot");
        Ok(prices)
    }

    /// Asks the server whether the session may trade.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::markets`].
    pub async fn check_verification(&self) -> Result<VerificationStatus> {
        let request = self
            .authorized(self.http.get(self.url("/api/protected/verification/check")))?;
        let response = request.send().await?;
        decode(response, "Failed to check verification").await
    }

    /// Submits a trade and returns the server's echo of it.
    ///
    /// # Errors
    ///
    /// A non-success status becomes [`TormentusError::Api`] carrying the
    /// body's `error` string, or [`TRADE_FAILED_FALLBACK`] when absent.
    pub async fn place_trade(&self, request: &TradeRequest) -> Result<Trade> {
        info!(
            symbol = %request.symbol,
            direction = request.direction.as_str(),
            amount = %request.amount,
            duration = request.duration,
            "Placing trade"
        );
        let builder = self
            .authorized(self.http.post(self.url("/api/protected/trades")))?
            .json(request);
        let response = builder.send().await?;
        let body: PlaceTradeResponse = decode(response, TRADE_FAILED_FALLBACK).await?;
        info!(id = body.trade.id, "Trade accepted");
        Ok(body.trade)
    }
}

/// Decodes a success body, or maps a failure status to [`TormentusError::Api`].
async fn decode<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = error_message(&text).unwrap_or_else(|| fallback.to_string());
        warn!(status = status.as_u16(), %message, "API request failed");
        return Err(TormentusError::Api {
            status: status.as_u16(),
            message,
        });
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Extracts the `error` string from a JSON error body.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Validates the trade form before anything is sent.
///
/// # Errors
///
/// Returns [`TormentusError::Validation`] for a non-positive amount or a
/// duration outside [`ALLOWED_DURATIONS`].
pub fn validate_trade_form(amount: Decimal, duration: u32) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(TormentusError::Validation(
            "Amount must be greater than zero".to_string(),
        ));
    }
    if !ALLOWED_DURATIONS.contains(&duration) {
        return Err(TormentusError::Validation(format!(
            "Duration must be one of {ALLOWED_DURATIONS:?} seconds"
        )));
    }
    Ok(())
}
