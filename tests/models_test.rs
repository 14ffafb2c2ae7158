//! Deserialization tests for feed and REST payloads.

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

use tormentus::feed::{parse_frame, parse_line};
use tormentus::models::candle::Candle;
use tormentus::models::market::{Market, UserProfile, VerificationStatus};
use tormentus::models::quote::PriceUpdate;
use tormentus::models::trade::{
    Direction, PlaceTradeResponse, TradeOutcome, TradeRequest, TradeStatus,
};
use tormentus::models::{FeedMessage, MessageKind};

const PRICE_UPDATE_JSON: &str = include_str!("fixtures/price_update.json");
const CANDLE_UPDATE_JSON: &str = include_str!("fixtures/candle_update.json");
const TRADE_RESULT_JSON: &str = include_str!("fixtures/trade_result.json");
const HEARTBEAT_JSON: &str = include_str!("fixtures/heartbeat.json");
const TRADE_PLACED_JSON: &str = include_str!("fixtures/trade_placed.json");
const PRICES_JSON: &str = include_str!("fixtures/prices.json");
const VERIFICATION_JSON: &str = include_str!("fixtures/verification.json");
const USER_JSON: &str = include_str!("fixtures/user.json");
const MIXED_FRAME: &str = include_str!("fixtures/mixed_frame.txt");

#[test]
fn test_price_update_parses() {
    let message = parse_line(PRICE_UPDATE_JSON.trim()).expect("Failed to parse price update");
    assert_eq!(message.kind(), MessageKind::PriceUpdate);

    let FeedMessage::PriceUpdate(update) = message else {
        panic!("expected price update");
    };
    assert_eq!(update.symbol, "BTC/USDT");
    assert_eq!(update.price, dec!(67550.25));
    assert_eq!(update.change_24h, dec!(1.2));
}

#[test]
fn test_candle_update_parses() {
    let FeedMessage::CandleUpdate(update) = parse_line(CANDLE_UPDATE_JSON.trim()).unwrap() else {
        panic!("expected candle update");
    };
    assert_eq!(
        update.candle(),
        Candle {
            time: 1_700_000_040,
            open: dec!(67540.1),
            high: dec!(67560.0),
            low: dec!(67535.5),
            close: dec!(67550.25),
        }
    );
}

#[test]
fn test_trade_result_parses() {
    let FeedMessage::TradeResult(result) = parse_line(TRADE_RESULT_JSON.trim()).unwrap() else {
        panic!("expected trade result");
    };
    assert_eq!(result.id, 7);
    assert_eq!(result.status, TradeOutcome::Won);
    assert_eq!(result.profit, dec!(85));
    assert_eq!(TradeStatus::from(result.status), TradeStatus::Won);
}

#[test]
fn test_heartbeat_parses() {
    assert_eq!(
        parse_line(HEARTBEAT_JSON.trim()).unwrap(),
        FeedMessage::Heartbeat
    );
}

#[test]
fn test_unknown_type_is_rejected() {
    assert!(parse_line(r#"{"type":"order_book","data":{}}"#).is_err());
    assert!(parse_line(r#"{"data":{"symbol":"BTC/USDT"}}"#).is_err());
}

#[test]
fn test_mixed_frame_keeps_valid_lines() {
    let messages = parse_frame(MIXED_FRAME);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].kind(), MessageKind::PriceUpdate);
    assert_eq!(messages[1], FeedMessage::Heartbeat);
}

#[test]
fn test_trade_echo_deserializes() {
    let response: PlaceTradeResponse =
        serde_json::from_str(TRADE_PLACED_JSON).expect("Failed to deserialize trade");
    let trade = response.trade;

    assert_eq!(trade.id, 7);
    assert_eq!(trade.direction, Direction::Up);
    assert_eq!(trade.amount, dec!(100));
    assert_eq!(trade.entry_price, dec!(67550.25));
    assert_eq!(
        trade.expires_at,
        Utc.timestamp_opt(1_700_000_060, 0).unwrap()
    );
    assert_eq!(trade.status, TradeStatus::Open);
}

#[test]
fn test_trade_request_serializes_numbers() {
    let request = TradeRequest {
        symbol: "BTC/USDT".to_string(),
        direction: Direction::Down,
        amount: dec!(25.5),
        duration: 120,
    };
    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "symbol": "BTC/USDT",
            "direction": "down",
            "amount": 25.5,
            "duration": 120
        })
    );
}

#[test]
fn test_price_snapshot_deserializes() {
    let prices: Vec<PriceUpdate> = serde_json::from_str(PRICES_JSON).unwrap();
    assert_eq!(prices.len(), 2);
    assert_eq!(prices[1].change_24h, dec!(-0.68));
}

#[test]
fn test_market_defaults_missing_fields() {
    let market: Market = serde_json::from_str(r#"{"symbol":"DOGE/USDT"}"#).unwrap();
    assert_eq!(market.name, "");
    assert_eq!(market.price, dec!(0));
}

#[test]
fn test_verification_status() {
    let status: VerificationStatus = serde_json::from_str(VERIFICATION_JSON).unwrap();
    assert!(!status.allows_trading());

    let ok: VerificationStatus = serde_json::from_str(r#"{"can_trade":true}"#).unwrap();
    assert!(ok.allows_trading());
}

#[test]
fn test_user_profile() {
    let user: UserProfile = serde_json::from_str(USER_JSON).unwrap();
    assert_eq!(user.display_name(), "Trader");
    assert_eq!(user.balance, dec!(1000));

    let anonymous: UserProfile =
        serde_json::from_str(r#"{"email":"a@example.com","name":""}"#).unwrap();
    assert_eq!(anonymous.display_name(), "a@example.com");
}
