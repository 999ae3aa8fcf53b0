use crate::error::{DappError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

/// Latest game created on the contract.
pub const FETCH_CREATED_GAME: &str = r#"query {
  games(orderBy: id, orderDirection: desc, first: 1) {
    id
    maxPlayers
    entryFee
    winner
    players
  }
}"#;

/// A game as indexed by the subgraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: String,
    #[serde(default, deserialize_with = "de_flexible_u128")]
    pub entry_fee: u128,
    #[serde(default, deserialize_with = "de_flexible_u64")]
    pub max_players: u64,
    #[serde(default, deserialize_with = "de_players")]
    pub players: Vec<String>,
    #[serde(default)]
    pub winner: Option<String>,
}

impl GameRecord {
    /// The winner, if one was recorded. Empty strings count as none.
    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref().filter(|w| !w.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct GamesData {
    games: Vec<GameRecord>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: String,
}

/// Source of the latest game record.
#[async_trait]
pub trait GameIndex: Send + Sync {
    async fn latest_game(&self) -> Result<Option<GameRecord>>;
}

pub struct SubgraphClient {
    url: String,
    http: reqwest::Client,
}

impl SubgraphClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.is_empty() {
            return Err(DappError::config("Subgraph URL cannot be empty"));
        }
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| DappError::subgraph_transport(format!("failed to build client: {}", e)))?;
        Ok(Self { url, http })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST a GraphQL document and return its unwrapped `data`. One request,
    /// no retry.
    pub async fn query<T: DeserializeOwned>(&self, document: &str) -> Result<T> {
        let res = self
            .http
            .post(&self.url)
            .json(&json!({ "query": document }))
            .send()
            .await
            .map_err(|e| DappError::subgraph_transport(e.to_string()))?;
        let status = res.status();
        let bytes = res
            .bytes()
            .await
            .map_err(|e| DappError::subgraph_transport(format!("failed to read body: {}", e)))?;

        let result = decode_response(status, &bytes);
        if let Err(e) = &result {
            tracing::error!("Subgraph query failed: {}", e);
        }
        result
    }
}

#[async_trait]
impl GameIndex for SubgraphClient {
    async fn latest_game(&self) -> Result<Option<GameRecord>> {
        let data: GamesData = self.query(FETCH_CREATED_GAME).await?;
        Ok(data.games.into_iter().next())
    }
}

/// GraphQL errors win over everything else, even when `data` is present and
/// the status is a failure.
fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T> {
    let envelope: GraphQlResponse = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => {
            return Err(DappError::subgraph_transport(format!(
                "invalid subgraph payload: {}",
                e
            )))
        }
        Err(_) => {
            return Err(DappError::subgraph_transport(format!(
                "subgraph responded with {}: {}",
                status,
                String::from_utf8_lossy(body)
            )))
        }
    };

    if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        return Err(DappError::query(messages.join("; ")));
    }

    if !status.is_success() {
        return Err(DappError::subgraph_transport(format!(
            "subgraph responded with {}",
            status
        )));
    }

    let data = envelope
        .data
        .filter(|data| !data.is_null())
        .ok_or_else(|| DappError::subgraph_transport("response carried no data"))?;
    serde_json::from_value(data)
        .map_err(|e| DappError::subgraph_transport(format!("unexpected data shape: {}", e)))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Text(String),
}

fn de_flexible_u128<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u128, D::Error> {
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(0),
        Some(NumberOrString::Number(n)) => Ok(n.into()),
        Some(NumberOrString::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn de_flexible_u64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    let value = de_flexible_u128(deserializer)?;
    u64::try_from(value).map_err(serde::de::Error::custom)
}

fn de_players<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
