//! Conversion of raw upstream records into canonical [`MarketInfo`] values.
//!
//! Everything here is total: missing or malformed fields degrade to the
//! sentinels below and nothing is ever returned as an error to the caller.

use serde::Deserialize;
use serde_json::Value;
use strum::IntoEnumIterator;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tracing::warn;

use super::types::{KnownCategory, MarketInfo, RawMarket, RawToken};
use crate::error::NormalizeError;

/// Title used when the question is missing or blank.
pub const UNKNOWN_TITLE: &str = "unknown title";
/// Description used when none is supplied.
pub const NO_DESCRIPTION: &str = "no description";
/// Market ID used when neither question nor condition ID exists.
pub const UNKNOWN_ID: &str = "unknown id";
/// Condition ID used when absent.
pub const UNKNOWN_CONDITION_ID: &str = "unknown condition id";
/// Price range / winning outcome when the market has no tokens.
pub const NO_DATA: &str = "no data";
/// Winning outcome while no token is marked as winner.
pub const UNDETERMINED: &str = "undetermined";
/// Outcome label for a token that has none.
pub const UNKNOWN_OUTCOME: &str = "unknown outcome";
/// Token ID for a token that has none.
pub const UNKNOWN_TOKEN_ID: &str = "unknown token id";
/// First-token ID when the market has no tokens.
pub const NO_TOKEN: &str = "no token";
/// First-token outcome when the market has no tokens.
pub const NO_OUTCOME: &str = "no outcome";
/// End date display when absent.
pub const NO_END_DATE: &str = "no end date";
/// Game start display when absent.
pub const NO_START_TIME: &str = "no start time";
/// Title of the record produced for unreadable input.
pub const PARSE_ERROR_TITLE: &str = "data parse error";
/// ID and date placeholder of the record produced for unreadable input.
pub const PARSE_ERROR_MARKER: &str = "error";

const DISPLAY_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const NAIVE_T_FORMAT: &[time::format_description::FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
);

const NAIVE_SPACE_FORMAT: &[time::format_description::FormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
);

const OFFSET_FORMATS: [&[time::format_description::FormatItem<'static>]; 3] = [
    format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    format_description!("[offset_hour sign:mandatory][offset_minute]"),
    format_description!("[offset_hour sign:mandatory]"),
];

const DATE_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Normalize an already-typed raw market.
pub fn normalize(raw: &RawMarket) -> MarketInfo {
    let title = match raw.question.as_deref() {
        Some(q) if !q.trim().is_empty() => q.to_string(),
        _ => UNKNOWN_TITLE.to_string(),
    };

    let market_id = raw
        .question_id
        .as_ref()
        .or(raw.condition_id.as_ref())
        .cloned()
        .unwrap_or_else(|| UNKNOWN_ID.to_string());

    let tokens = summarize_tokens(&raw.tokens);

    MarketInfo {
        title,
        description: raw
            .description
            .clone()
            .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        market_id,
        condition_id: raw
            .condition_id
            .clone()
            .unwrap_or_else(|| UNKNOWN_CONDITION_ID.to_string()),
        category: extract_category(raw),
        current_price: tokens.current_price,
        price_range: tokens.price_range,
        total_tokens: raw.tokens.len(),
        winning_outcome: tokens.winning_outcome,
        token_id: tokens.token_id,
        outcome: tokens.outcome,
        winner: tokens.winner,
        active: raw.active,
        closed: raw.closed,
        accepting_orders: raw.accepting_orders,
        end_date: raw.end_date_iso.clone(),
        game_start_time: raw.game_start_time.clone(),
        end_date_formatted: format_timestamp(raw.end_date_iso.as_deref(), NO_END_DATE),
        game_start_formatted: format_timestamp(raw.game_start_time.as_deref(), NO_START_TIME),
        minimum_order_size: coerce_price(raw.minimum_order_size.as_ref()),
        minimum_tick_size: coerce_price(raw.minimum_tick_size.as_ref()),
        neg_risk: raw.neg_risk,
        tags: raw.tags.clone(),
    }
}

/// Read a raw JSON value as a market, reporting records that are not objects.
pub fn try_normalize_value(value: &Value) -> Result<MarketInfo, NormalizeError> {
    if !value.is_object() {
        return Err(NormalizeError::NotAnObject(json_kind(value)));
    }

    // Every field reader is infallible, so an object always deserializes.
    let raw = RawMarket::deserialize(value).unwrap_or_default();
    Ok(normalize(&raw))
}

/// Normalize an untyped upstream record; never fails.
pub fn normalize_value(value: &Value) -> MarketInfo {
    try_normalize_value(value).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to extract market info");
        MarketInfo::parse_error()
    })
}

impl MarketInfo {
    /// Minimal record standing in for input that could not be read.
    pub fn parse_error() -> Self {
        Self {
            title: PARSE_ERROR_TITLE.to_string(),
            description: NO_DESCRIPTION.to_string(),
            market_id: PARSE_ERROR_MARKER.to_string(),
            condition_id: UNKNOWN_CONDITION_ID.to_string(),
            category: KnownCategory::Other.to_string(),
            current_price: 0.0,
            price_range: NO_DATA.to_string(),
            total_tokens: 0,
            winning_outcome: NO_DATA.to_string(),
            token_id: NO_TOKEN.to_string(),
            outcome: NO_OUTCOME.to_string(),
            winner: false,
            active: false,
            closed: false,
            accepting_orders: false,
            end_date: None,
            game_start_time: None,
            end_date_formatted: PARSE_ERROR_MARKER.to_string(),
            game_start_formatted: PARSE_ERROR_MARKER.to_string(),
            minimum_order_size: 0.0,
            minimum_tick_size: 0.0,
            neg_risk: false,
            tags: Vec::new(),
        }
    }
}

/// Use the declared category verbatim, otherwise infer one from the text.
pub fn extract_category(raw: &RawMarket) -> String {
    if let Some(category) = &raw.category {
        return category.clone();
    }

    infer_category(raw.question.as_deref(), raw.description.as_deref()).to_string()
}

/// Classify by the first keyword group found in question and description.
pub fn infer_category(question: Option<&str>, description: Option<&str>) -> KnownCategory {
    let text = format!(
        "{} {}",
        question.unwrap_or_default().to_lowercase(),
        description.unwrap_or_default().to_lowercase()
    );

    // Declaration order is priority order; `Other` has no keywords.
    KnownCategory::iter()
        .find(|category| category.keywords().iter().any(|kw| text.contains(kw)))
        .unwrap_or(KnownCategory::Other)
}

/// Coerce a raw price to `f64`; anything unusable becomes 0.
pub fn coerce_price(raw: Option<&Value>) -> f64 {
    let price = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    price.filter(|p| p.is_finite()).unwrap_or(0.0)
}

/// Format an ISO-8601 timestamp for display.
///
/// Unparsable input is returned unchanged; absent or empty input yields
/// `missing`.
pub fn format_timestamp(raw: Option<&str>, missing: &str) -> String {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return missing.to_string();
    };

    parse_timestamp(raw)
        .and_then(|dt| dt.format(DISPLAY_FORMAT).ok())
        .unwrap_or_else(|| raw.to_string())
}

/// Parse the ISO-8601 shapes seen upstream, keeping the wall-clock time
/// of whatever offset the value carries.
fn parse_timestamp(raw: &str) -> Option<PrimitiveDateTime> {
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(PrimitiveDateTime::new(dt.date(), dt.time()));
    }

    let local = strip_offset(raw)?;
    PrimitiveDateTime::parse(local, NAIVE_T_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(local, NAIVE_SPACE_FORMAT))
        .ok()
        .or_else(|| {
            Date::parse(local, DATE_FORMAT)
                .ok()
                .map(|d| d.midnight())
        })
}

/// Drop a trailing `Z`, `+HH`, `+HHMM` or `+HH:MM` offset from the time part.
///
/// Returns `None` when the suffix looks like an offset but is malformed.
fn strip_offset(raw: &str) -> Option<&str> {
    if let Some(local) = raw.strip_suffix(['Z', 'z']) {
        return Some(local);
    }

    // Offsets only follow the time; "YYYY-MM-DD" is 10 bytes.
    match raw.rfind(|c: char| c == '+' || c == '-') {
        Some(idx) if idx > 10 => {
            let offset = &raw[idx..];
            OFFSET_FORMATS
                .iter()
                .any(|format| UtcOffset::parse(offset, *format).is_ok())
                .then_some(&raw[..idx])
        }
        _ => Some(raw),
    }
}

struct TokenSummary {
    current_price: f64,
    price_range: String,
    winning_outcome: String,
    token_id: String,
    outcome: String,
    winner: bool,
}

fn summarize_tokens(tokens: &[RawToken]) -> TokenSummary {
    let Some(first) = tokens.first() else {
        return TokenSummary {
            current_price: 0.0,
            price_range: NO_DATA.to_string(),
            winning_outcome: NO_DATA.to_string(),
            token_id: NO_TOKEN.to_string(),
            outcome: NO_OUTCOME.to_string(),
            winner: false,
        };
    };

    let prices: Vec<f64> = tokens.iter().map(|t| coerce_price(t.price.as_ref())).collect();
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    // Several winners would be an upstream bug; the first one is reported.
    let winning_outcome = match tokens.iter().find(|t| t.winner) {
        Some(winner) => winner
            .outcome
            .clone()
            .unwrap_or_else(|| UNKNOWN_OUTCOME.to_string()),
        None => UNDETERMINED.to_string(),
    };

    TokenSummary {
        current_price: prices[0],
        price_range: format!("{:.4} - {:.4}", min, max),
        winning_outcome,
        token_id: first
            .token_id
            .clone()
            .unwrap_or_else(|| UNKNOWN_TOKEN_ID.to_string()),
        outcome: first
            .outcome
            .clone()
            .unwrap_or_else(|| UNKNOWN_OUTCOME.to_string()),
        winner: first.winner,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw(value: Value) -> RawMarket {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_record_gets_sentinels() {
        let info = normalize_value(&json!({}));

        assert_eq!(info.title, UNKNOWN_TITLE);
        assert_eq!(info.description, NO_DESCRIPTION);
        assert_eq!(info.market_id, UNKNOWN_ID);
        assert_eq!(info.condition_id, UNKNOWN_CONDITION_ID);
        assert_eq!(info.category, "other");
        assert_eq!(info.current_price, 0.0);
        assert_eq!(info.price_range, NO_DATA);
        assert_eq!(info.total_tokens, 0);
        assert_eq!(info.winning_outcome, NO_DATA);
        assert!(!info.active);
        assert!(!info.closed);
        assert!(!info.accepting_orders);
        assert_eq!(info.end_date_formatted, NO_END_DATE);
        assert_eq!(info.game_start_formatted, NO_START_TIME);
        assert!(info.tags.is_empty());
    }

    #[test]
    fn blank_or_null_question_falls_back_to_unknown_title() {
        for question in [json!(null), json!(""), json!("   \t"), json!(["a"])] {
            let info = normalize_value(&json!({ "question": question }));
            assert_eq!(info.title, UNKNOWN_TITLE);
        }
    }

    #[test]
    fn title_is_never_empty() {
        let inputs = [
            json!({}),
            json!({"question": ""}),
            json!({"question": "Will it rain?"}),
            json!(null),
            json!([1, 2]),
            json!("just a string"),
        ];
        for input in inputs {
            assert!(!normalize_value(&input).title.is_empty());
        }
    }

    #[test]
    fn non_object_input_yields_parse_error_record() {
        let info = normalize_value(&json!([1, 2, 3]));
        assert_eq!(info.title, PARSE_ERROR_TITLE);
        assert_eq!(info.market_id, PARSE_ERROR_MARKER);
        assert_eq!(info.end_date_formatted, PARSE_ERROR_MARKER);
        assert_eq!(info.current_price, 0.0);
        assert_eq!(info.total_tokens, 0);

        assert_eq!(
            try_normalize_value(&json!("text")),
            Err(NormalizeError::NotAnObject("string"))
        );
    }

    #[test]
    fn market_id_prefers_question_id() {
        let info = normalize_value(&json!({"question_id": "q1", "condition_id": "c1"}));
        assert_eq!(info.market_id, "q1");
        assert_eq!(info.condition_id, "c1");

        let info = normalize_value(&json!({"condition_id": "c1"}));
        assert_eq!(info.market_id, "c1");
    }

    #[test]
    fn coerce_price_handles_missing_and_malformed_values() {
        assert_eq!(coerce_price(None), 0.0);
        assert_eq!(coerce_price(Some(&json!(null))), 0.0);
        assert_eq!(coerce_price(Some(&json!(""))), 0.0);
        assert_eq!(coerce_price(Some(&json!("0.65"))), 0.65);
        assert_eq!(coerce_price(Some(&json!(" 0.5 "))), 0.5);
        assert_eq!(coerce_price(Some(&json!("abc"))), 0.0);
        assert_eq!(coerce_price(Some(&json!(0.35))), 0.35);
        assert_eq!(coerce_price(Some(&json!(1))), 1.0);
        assert_eq!(coerce_price(Some(&json!(true))), 0.0);
        assert_eq!(coerce_price(Some(&json!({"v": 1}))), 0.0);
        assert_eq!(coerce_price(Some(&json!("NaN"))), 0.0);
    }

    #[test]
    fn price_range_spans_all_tokens() {
        let info = normalize_value(&json!({
            "question": "Q",
            "tokens": [{"price": 0.65}, {"price": 0.35}]
        }));
        assert_eq!(info.price_range, "0.3500 - 0.6500");
        assert_eq!(info.current_price, 0.65);
        assert_eq!(info.total_tokens, 2);
        assert_eq!(info.winning_outcome, UNDETERMINED);
    }

    #[test]
    fn empty_token_list_has_no_data() {
        for tokens in [json!([]), json!(null), json!("nope")] {
            let info = normalize_value(&json!({"question": "Q", "tokens": tokens}));
            assert_eq!(info.price_range, NO_DATA);
            assert_eq!(info.winning_outcome, NO_DATA);
            assert_eq!(info.current_price, 0.0);
            assert_eq!(info.total_tokens, 0);
            assert_eq!(info.token_id, NO_TOKEN);
        }
    }

    #[test]
    fn null_and_empty_prices_count_as_zero() {
        let info = normalize_value(&json!({
            "question": "Q",
            "tokens": [{"outcome": "Yes", "price": null}, {"outcome": "No", "price": ""}]
        }));
        assert_eq!(info.price_range, "0.0000 - 0.0000");
        assert_eq!(info.current_price, 0.0);
        assert_eq!(info.outcome, "Yes");
    }

    #[test]
    fn first_winner_is_reported() {
        let info = normalize_value(&json!({
            "tokens": [
                {"outcome": "A", "price": 0.1, "winner": false},
                {"outcome": "B", "price": 0.2, "winner": true},
                {"outcome": "C", "price": 0.7, "winner": true}
            ]
        }));
        assert_eq!(info.winning_outcome, "B");
    }

    #[test]
    fn category_is_inferred_by_priority() {
        assert_eq!(
            infer_category(Some("Election odds if Bitcoin crashes?"), None),
            KnownCategory::Politics
        );
        assert_eq!(infer_category(Some("BTC above 100k?"), None), KnownCategory::Crypto);
        assert_eq!(
            infer_category(Some("Who wins?"), Some("NBA finals game 7")),
            KnownCategory::Sports
        );
        assert_eq!(
            infer_category(Some("Will the Fed cut rates?"), None),
            KnownCategory::Finance
        );
        assert_eq!(infer_category(Some("Will it snow?"), None), KnownCategory::Other);
        assert_eq!(infer_category(None, None), KnownCategory::Other);
    }

    #[test]
    fn category_inference_is_idempotent() {
        let record = raw(json!({"question": "Vote on the bitcoin bill", "description": null}));
        assert_eq!(extract_category(&record), extract_category(&record));
        assert_eq!(extract_category(&record), "politics");
    }

    #[test]
    fn declared_category_is_used_verbatim() {
        let record = raw(json!({"question": "Bitcoin above 100k?", "category": "Weather"}));
        assert_eq!(extract_category(&record), "Weather");

        let record = raw(json!({"question": "Bitcoin above 100k?", "category": null}));
        assert_eq!(extract_category(&record), "crypto");
    }

    #[test]
    fn timestamps_are_formatted_for_display() {
        assert_eq!(
            format_timestamp(Some("2024-12-31T23:59:59Z"), NO_END_DATE),
            "2024-12-31 23:59:59"
        );
        assert_eq!(
            format_timestamp(Some("2024-12-31T23:59:59.123+05:30"), NO_END_DATE),
            "2024-12-31 23:59:59"
        );
        assert_eq!(
            format_timestamp(Some("2024-06-01T12:00:00"), NO_END_DATE),
            "2024-06-01 12:00:00"
        );
        assert_eq!(
            format_timestamp(Some("2024-06-01 12:00:00"), NO_END_DATE),
            "2024-06-01 12:00:00"
        );
        assert_eq!(
            format_timestamp(Some("2024-06-01"), NO_END_DATE),
            "2024-06-01 00:00:00"
        );
    }

    #[test]
    fn timestamps_with_short_offsets_or_no_seconds() {
        assert_eq!(
            format_timestamp(Some("2024-11-10 18:00:00+00"), NO_START_TIME),
            "2024-11-10 18:00:00"
        );
        assert_eq!(
            format_timestamp(Some("2024-12-31T23:59:59+0000"), NO_END_DATE),
            "2024-12-31 23:59:59"
        );
        assert_eq!(
            format_timestamp(Some("2024-12-31T23:59Z"), NO_END_DATE),
            "2024-12-31 23:59:00"
        );
        assert_eq!(
            format_timestamp(Some("2024-12-31 08:15-05:00"), NO_END_DATE),
            "2024-12-31 08:15:00"
        );
        assert_eq!(
            format_timestamp(Some("2024-12-31T23:59:59+5"), NO_END_DATE),
            "2024-12-31T23:59:59+5"
        );
    }

    #[test]
    fn unparsable_timestamps_pass_through() {
        assert_eq!(format_timestamp(Some("next tuesday"), NO_END_DATE), "next tuesday");
        assert_eq!(format_timestamp(Some(""), NO_END_DATE), NO_END_DATE);
        assert_eq!(format_timestamp(None, NO_START_TIME), NO_START_TIME);

        let info = normalize_value(&json!({"end_date_iso": 1735689599}));
        assert_eq!(info.end_date_formatted, "1735689599");
    }

    #[test]
    fn bitcoin_market_end_to_end() {
        let info = normalize_value(&json!({
            "question": "Bitcoin above $100k?",
            "tokens": [
                {"price": "0.8", "winner": false},
                {"price": null, "winner": true}
            ]
        }));

        assert_eq!(info.category, "crypto");
        assert_eq!(info.current_price, 0.8);
        assert_eq!(info.price_range, "0.0000 - 0.8000");
        assert_eq!(info.winning_outcome, UNKNOWN_OUTCOME);
    }

    #[test]
    fn full_record_is_carried_through() {
        let info = normalize_value(&json!({
            "question": "测试市场",
            "question_id": "test_123",
            "condition_id": "condition_123",
            "description": "测试描述",
            "end_date_iso": "2024-12-31T23:59:59Z",
            "active": true,
            "closed": false,
            "accepting_orders": true,
            "minimum_order_size": 10,
            "minimum_tick_size": "0.01",
            "neg_risk": false,
            "tags": ["测试"],
            "tokens": [{"price": 0.75, "token_id": "token_1", "outcome": "是", "winner": false}]
        }));

        assert_eq!(info.title, "测试市场");
        assert_eq!(info.market_id, "test_123");
        assert_eq!(info.current_price, 0.75);
        assert_eq!(info.token_id, "token_1");
        assert_eq!(info.outcome, "是");
        assert_eq!(info.minimum_order_size, 10.0);
        assert_eq!(info.minimum_tick_size, 0.01);
        assert_eq!(info.end_date.as_deref(), Some("2024-12-31T23:59:59Z"));
        assert_eq!(info.end_date_formatted, "2024-12-31 23:59:59");
        assert_eq!(info.tags, vec!["测试"]);
        assert!(info.active);
        assert!(info.accepting_orders);
    }
}
