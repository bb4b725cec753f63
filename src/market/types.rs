//! Raw upstream market records and the canonical market representation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};

/// Market category with a known keyword group.
///
/// Records may still carry any other category string when the upstream
/// declares one; this enum only covers the inferred set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum KnownCategory {
    /// Elections, government, legislation.
    Politics,
    /// Cryptocurrencies.
    Crypto,
    /// Sports leagues and games.
    Sports,
    /// Stocks, macroeconomics, central banks.
    Finance,
    /// Nothing matched.
    Other,
}

impl KnownCategory {
    /// Keywords checked against the lower-cased question and description.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            KnownCategory::Politics => &["election", "president", "politics", "vote", "congress"],
            KnownCategory::Crypto => &["bitcoin", "ethereum", "crypto", "btc", "eth"],
            KnownCategory::Sports => &["nba", "nfl", "mlb", "soccer", "sports", "game", "team"],
            KnownCategory::Finance => &["stock", "market", "economy", "fed", "inflation"],
            KnownCategory::Other => &[],
        }
    }

    /// Bilingual label shown in category listings.
    pub fn display_name(&self) -> &'static str {
        match self {
            KnownCategory::Politics => "Politics (政治)",
            KnownCategory::Crypto => "Crypto (加密货币)",
            KnownCategory::Sports => "Sports (体育)",
            KnownCategory::Finance => "Finance (金融)",
            KnownCategory::Other => "Other (其他)",
        }
    }
}

/// Market record as returned by the CLOB `/markets` endpoint.
///
/// Every field is optional and read leniently: a value of the wrong JSON
/// type is treated as missing rather than failing the whole record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawMarket {
    /// Market question (used as the title).
    #[serde(default, deserialize_with = "lenient_string")]
    pub question: Option<String>,
    /// Long-form description.
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    /// Question ID.
    #[serde(default, deserialize_with = "lenient_string")]
    pub question_id: Option<String>,
    /// Condition ID.
    #[serde(default, deserialize_with = "lenient_string")]
    pub condition_id: Option<String>,
    /// Declared category, if the upstream supplies one.
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    /// Market end date (ISO-8601).
    #[serde(default, deserialize_with = "lenient_string")]
    pub end_date_iso: Option<String>,
    /// Game start time (ISO-8601).
    #[serde(default, deserialize_with = "lenient_string")]
    pub game_start_time: Option<String>,
    /// Whether the market is active.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub active: bool,
    /// Whether the market is closed.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub closed: bool,
    /// Whether the book is accepting orders.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub accepting_orders: bool,
    /// Minimum order size, numeric or string.
    #[serde(default, deserialize_with = "lenient_value")]
    pub minimum_order_size: Option<Value>,
    /// Minimum tick size, numeric or string.
    #[serde(default, deserialize_with = "lenient_value")]
    pub minimum_tick_size: Option<Value>,
    /// Negative-risk market flag.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub neg_risk: bool,
    /// Free-form tags.
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Vec<String>,
    /// Outcome tokens, in upstream order.
    #[serde(default, deserialize_with = "lenient_tokens")]
    pub tokens: Vec<RawToken>,
}

/// Outcome token inside a raw market.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawToken {
    /// Outcome label (e.g. "Yes").
    #[serde(default, deserialize_with = "lenient_string")]
    pub outcome: Option<String>,
    /// Price as number, string, or null.
    #[serde(default, deserialize_with = "lenient_value")]
    pub price: Option<Value>,
    /// CLOB token ID.
    #[serde(default, deserialize_with = "lenient_string")]
    pub token_id: Option<String>,
    /// Whether this outcome resolved as the winner.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub winner: bool,
}

/// Read a scalar as a string; null, arrays and objects become `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Only a JSON `true` counts as true.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(matches!(value, Value::Bool(true)))
}

/// Keep the value untouched, mapping null to `None`.
fn lenient_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(other),
    })
}

fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect())
}

/// Non-object entries become empty tokens so `total_tokens` still counts them.
fn lenient_tokens<'de, D>(deserializer: D) -> Result<Vec<RawToken>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .iter()
        .map(|item| match item {
            Value::Object(_) => RawToken::deserialize(item).unwrap_or_default(),
            _ => RawToken::default(),
        })
        .collect())
}

/// Canonical market record served to clients and written to exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInfo {
    /// Market title, never empty.
    pub title: String,
    /// Description or sentinel.
    pub description: String,
    /// Question ID, falling back to the condition ID.
    pub market_id: String,
    /// Condition ID.
    pub condition_id: String,
    /// Declared or inferred category.
    pub category: String,
    /// Price of the first token.
    pub current_price: f64,
    /// "min - max" over all token prices.
    pub price_range: String,
    /// Number of outcome tokens.
    pub total_tokens: usize,
    /// Outcome of the winning token.
    pub winning_outcome: String,
    /// First token's ID.
    pub token_id: String,
    /// First token's outcome label.
    pub outcome: String,
    /// First token's winner flag.
    pub winner: bool,
    /// Whether the market is active.
    pub active: bool,
    /// Whether the market is closed.
    pub closed: bool,
    /// Whether the book is accepting orders.
    pub accepting_orders: bool,
    /// Raw end date as received.
    pub end_date: Option<String>,
    /// Raw game start time as received.
    pub game_start_time: Option<String>,
    /// End date for display.
    pub end_date_formatted: String,
    /// Game start time for display.
    pub game_start_formatted: String,
    /// Minimum order size.
    pub minimum_order_size: f64,
    /// Minimum tick size.
    pub minimum_tick_size: f64,
    /// Negative-risk market flag.
    pub neg_risk: bool,
    /// Tags in upstream order.
    pub tags: Vec<String>,
}

impl MarketInfo {
    /// Status label used by listings: settled beats closed beats active.
    pub fn status_label(&self) -> &'static str {
        if self.closed {
            "settled"
        } else if self.active {
            "active"
        } else {
            "inactive"
        }
    }

    /// Whether this record matches the given market or condition ID.
    pub fn matches_id(&self, id: &str) -> bool {
        self.market_id == id || self.condition_id == id
    }
}
