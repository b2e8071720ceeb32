//! Steam Web API catalog

use super::{RemoteCatalog, RemoteItem, SourceKind};
use crate::LibraryError;
use async_trait::async_trait;
use serde::Deserialize;

const DEFAULT_API_URL: &str = "https://api.steampowered.com";

#[derive(Debug, Deserialize)]
struct OwnedGamesEnvelope {
    response: OwnedGamesResponse,
}

#[derive(Debug, Deserialize)]
struct OwnedGamesResponse {
    /// Missing for private profiles and unknown accounts
    game_count: Option<u64>,
    #[serde(default)]
    games: Vec<OwnedGame>,
}

#[derive(Debug, Deserialize)]
struct OwnedGame {
    appid: u64,
    #[serde(default)]
    name: String,
}

/// Parse a `GetOwnedGames` response body
fn parse_owned_games(body: &str) -> Result<Vec<RemoteItem>, LibraryError> {
    let envelope: OwnedGamesEnvelope = serde_json::from_str(body)
        .map_err(|e| LibraryError::unavailable("steam", format!("malformed response: {}", e)))?;

    let response = envelope.response;
    if response.game_count.is_none() {
        return Err(LibraryError::unavailable(
            "steam",
            "profile is private or steam_id is invalid",
        ));
    }

    Ok(response
        .games
        .into_iter()
        .map(|game| RemoteItem {
            id: game.appid.to_string(),
            title: if game.name.is_empty() {
                format!("Steam App {}", game.appid)
            } else {
                game.name
            },
        })
        .collect())
}

/// Games owned by one Steam account
pub struct SteamCatalog {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    steam_id: String,
}

impl SteamCatalog {
    pub fn new(api_key: String, steam_id: String) -> Result<Self, LibraryError> {
        if api_key.trim().is_empty() || steam_id.trim().is_empty() {
            return Err(LibraryError::unavailable(
                "steam",
                "api_key and steam_id are required",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(format!("romshelf/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: DEFAULT_API_URL.to_string(),
            api_key,
            steam_id,
        })
    }

    /// Point at another API host (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl RemoteCatalog for SteamCatalog {
    fn kind(&self) -> SourceKind {
        SourceKind::Steam
    }

    async fn list_owned_items(&self) -> Result<Vec<RemoteItem>, LibraryError> {
        let url = format!(
            "{}/IPlayerService/GetOwnedGames/v0001/",
            self.base_url.trim_end_matches('/')
        );

        tracing::debug!("Listing owned games for Steam account {}", self.steam_id);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("steamid", self.steam_id.as_str()),
                ("include_appinfo", "1"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| LibraryError::unavailable("steam", e))?;

        if !response.status().is_success() {
            return Err(LibraryError::unavailable(
                "steam",
                format!("API returned {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LibraryError::unavailable("steam", e))?;

        parse_owned_games(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_owned_games() {
        let body = r#"{
            "response": {
                "game_count": 2,
                "games": [
                    {"appid": 440, "name": "Team Fortress 2", "playtime_forever": 12},
                    {"appid": 620, "name": "Portal 2"}
                ]
            }
        }"#;

        let items = parse_owned_games(body).unwrap();
        assert_eq!(
            items,
            vec![
                RemoteItem {
                    id: "440".into(),
                    title: "Team Fortress 2".into()
                },
                RemoteItem {
                    id: "620".into(),
                    title: "Portal 2".into()
                },
            ]
        );
    }

    #[test]
    fn test_private_profile_is_unavailable() {
        assert!(matches!(
            parse_owned_games(r#"{"response": {}}"#),
            Err(LibraryError::SourceUnavailable {
                source_kind: "steam",
                ..
            })
        ));
    }

    #[test]
    fn test_empty_library_has_no_games() {
        let items = parse_owned_games(r#"{"response": {"game_count": 0}}"#).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_unnamed_app_gets_placeholder_title() {
        let items =
            parse_owned_games(r#"{"response": {"game_count": 1, "games": [{"appid": 7}]}}"#)
                .unwrap();
        assert_eq!(items[0].title, "Steam App 7");
    }

    #[test]
    fn test_malformed_body_is_unavailable() {
        assert!(matches!(
            parse_owned_games("<html>rate limited</html>"),
            Err(LibraryError::SourceUnavailable {
                source_kind: "steam",
                ..
            })
        ));
    }

    #[test]
    fn test_credentials_required() {
        assert!(SteamCatalog::new(String::new(), "7656".into()).is_err());
    }
}
