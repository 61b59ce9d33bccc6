//! Live tests against the real Clash of Clans API.
//!
//! Ignored by default, they need a valid `COC_API_KEY` registered for the
//! current egress IP plus an existing `E2E_PLAYER_TAG` to look up.

use clashtrack_coc_api::CocApiClient;
use clashtrack_shared::{PlayerTag, traits::api::PlayerApi};

fn client_from_env() -> (CocApiClient, PlayerTag) {
    dotenv::dotenv().ok();
    let key = std::env::var("COC_API_KEY").expect("COC_API_KEY must be set");
    let tag = std::env::var("E2E_PLAYER_TAG").expect("E2E_PLAYER_TAG must be set");
    (
        CocApiClient::new(key),
        PlayerTag::parse(&tag).expect("E2E_PLAYER_TAG must be a valid tag"),
    )
}

#[tokio::test]
#[ignore = "API key required"]
async fn fetches_a_live_player_profile() {
    let (client, tag) = client_from_env();

    let player = client.get_player(&tag).await.unwrap();

    assert_eq!(player.tag, tag);
    assert!(!player.name.is_empty());
}

#[tokio::test]
#[ignore = "API key required"]
async fn rejects_an_obviously_wrong_token() {
    let (client, tag) = client_from_env();

    let verified = client.verify_token(&tag, "not-a-real-token").await.unwrap();

    assert!(!verified);
}
