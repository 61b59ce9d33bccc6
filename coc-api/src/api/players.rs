use async_trait::async_trait;
use bytes::Bytes;
use clashtrack_shared::{
    Player, PlayerTag,
    traits::api::{ApiError, ApiRequest, PlayerApi},
};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, info_span, trace};

use crate::types::CocApiError;

use super::client::ApiClientBase;

/// High level client for the player endpoints used by the bot.
#[derive(Debug)]
pub struct CocApiClient(ApiClientBase);

impl CocApiClient {
    /// Create a new API client using the provided token.
    pub fn new(api_key: String) -> Self {
        Self(ApiClientBase::new(api_key))
    }

    /// Client against a custom entry point, used by tests to target a local
    /// mock server.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self(ApiClientBase::with_base_url(api_key, base_url))
    }

    /// Spawn a background task periodically logging request metrics.
    pub fn start_metrics_logging(&self) {
        let metrics = self.0.metrics.clone();
        tokio::spawn(metrics.log_loop().instrument(info_span!("📊 RequestMetrics")));
    }
}

#[derive(Serialize)]
struct VerifyTokenBody<'a> {
    token: &'a str,
}

/// Response shape of the `verifytoken` endpoint.
#[derive(Debug, Deserialize)]
struct VerifyTokenResponse {
    status: String,
}

#[async_trait]
impl ApiRequest for CocApiClient {
    async fn request(&self, path: String) -> Result<Bytes, ApiError> {
        Ok(self.0.request(path).await?)
    }
}

#[async_trait]
impl PlayerApi for CocApiClient {
    fn ensure_credentials(&self) -> Result<(), ApiError> {
        if self.0.has_key() {
            Ok(())
        } else {
            Err(Box::new(CocApiError::MissingApiKey))
        }
    }

    async fn get_player(&self, tag: &PlayerTag) -> Result<Player, ApiError> {
        trace!("[COC::PLAYERS] fetching player {}", tag);
        let path = format!("/players/{}", tag.api_encoded());

        let raw = self.request(path).await?;
        Ok(serde_json::from_slice(&raw).map_err(CocApiError::Serde)?)
    }

    async fn verify_token(&self, tag: &PlayerTag, token: &str) -> Result<bool, ApiError> {
        trace!("[COC::PLAYERS] verifying token for {}", tag);
        let path = format!("/players/{}/verifytoken", tag.api_encoded());

        let raw = self
            .0
            .post_json(path, &VerifyTokenBody { token })
            .await?;
        let response: VerifyTokenResponse =
            serde_json::from_slice(&raw).map_err(CocApiError::Serde)?;
        Ok(response.status == "ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn sample_player_body() -> serde_json::Value {
        json!({
            "tag": "#ABC123",
            "name": "Winter",
            "townHallLevel": 14,
            "role": "admin",
            "warPreference": "in",
            "trophies": 5000,
            "bestTrophies": 5600,
            "warStars": 700,
            "attackWins": 120,
            "defenseWins": 30,
            "builderHallLevel": 9,
            "donations": 450,
            "donationsReceived": 300,
            "clanCapitalContributions": 12000,
            "clan": { "tag": "#HOME", "name": "Home Clan" },
            "league": { "name": "Legend League" },
            "achievements": [
                { "name": "Gold Grab", "stars": 3, "value": 3000000, "target": 2500000 }
            ],
            "troops": [
                { "name": "Barbarian", "level": 10, "maxLevel": 12 }
            ],
            "spells": [],
            "heroes": []
        })
    }

    #[tokio::test]
    async fn get_player_parses_the_payload() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path_contains("ABC123");
                then.status(200).json_body(sample_player_body());
            })
            .await;

        let client = CocApiClient::with_base_url("key".into(), server.base_url());
        let tag = PlayerTag::parse("#abc123").unwrap();
        let player = client.get_player(&tag).await.unwrap();

        mock.assert_async().await;
        assert_eq!(player.name, "Winter");
        assert_eq!(player.trophies, 5000);
        assert_eq!(
            player.clan_role(),
            Some(clashtrack_shared::ClanRole::Elder)
        );
    }

    #[tokio::test]
    async fn get_player_surfaces_http_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(404).json_body(json!({ "reason": "notFound" }));
            })
            .await;

        let client = CocApiClient::with_base_url("key".into(), server.base_url());
        let tag = PlayerTag::parse("#NOPE").unwrap();
        let err = client.get_player(&tag).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CocApiError>(),
            Some(CocApiError::Status(status)) if status.as_u16() == 404
        ));
    }

    #[tokio::test]
    async fn get_player_rejects_malformed_bodies() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).body("definitely not json");
            })
            .await;

        let client = CocApiClient::with_base_url("key".into(), server.base_url());
        let tag = PlayerTag::parse("#AAA").unwrap();
        let err = client.get_player(&tag).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CocApiError>(),
            Some(CocApiError::Serde(_))
        ));
    }

    #[tokio::test]
    async fn verify_token_accepts_ok_status() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path_contains("verifytoken")
                    .json_body(json!({ "token": "secret" }));
                then.status(200)
                    .json_body(json!({ "tag": "#AAA", "token": "secret", "status": "ok" }));
            })
            .await;

        let client = CocApiClient::with_base_url("key".into(), server.base_url());
        let tag = PlayerTag::parse("#AAA").unwrap();
        assert!(client.verify_token(&tag, "secret").await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn verify_token_rejects_other_statuses() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path_contains("verifytoken");
                then.status(200)
                    .json_body(json!({ "tag": "#AAA", "status": "invalid" }));
            })
            .await;

        let client = CocApiClient::with_base_url("key".into(), server.base_url());
        let tag = PlayerTag::parse("#AAA").unwrap();
        assert!(!client.verify_token(&tag, "wrong").await.unwrap());
    }

    #[tokio::test]
    async fn ensure_credentials_requires_a_key() {
        let missing = CocApiClient::new(String::new());
        assert!(missing.ensure_credentials().is_err());

        let present = CocApiClient::new("token".into());
        assert!(present.ensure_credentials().is_ok());
    }
}
