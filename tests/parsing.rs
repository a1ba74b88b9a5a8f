use std::fs;
use std::path::PathBuf;

use soccer_terminal::api::{
    parse_market_json, parse_outcome_json, parse_team_json, parse_token_json,
};
use soccer_terminal::state::{PlayerId, PlayerType, PutPlayer};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_team_fixture() {
    let raw = read_fixture("team.json");
    let team = parse_team_json(&raw).expect("fixture should parse");
    assert_eq!(team.team_id.uuid, "5f8c1a2e-0d14-4b7a-9c3e-6a2b8d914f05");
    assert_eq!(team.team_name, "Riverton Rovers");
    assert_eq!(team.team_balance, 5_000_000);
    assert_eq!(team.squad_size(), 3);
    assert_eq!(team.player_array[0].player_type, PlayerType::GoalKeeper);
    assert_eq!(team.player_array[2].player_transfer_value, 750_000);
    assert!(team.player_array[2].is_listed());
    assert!(!team.player_array[0].is_listed());
}

#[test]
fn parses_market_fixture() {
    let raw = read_fixture("market.json");
    let market = parse_market_json(&raw).expect("fixture should parse");
    assert_eq!(market.team_array.len(), 2);

    let listings = market.listings();
    assert_eq!(listings.len(), 3);
    let (player, owner) = listings[0];
    assert_eq!(player.player_first_name, "Jonas");
    assert_eq!(owner.team_name, "Harbour City FC");
}

#[test]
fn market_without_team_array_is_empty() {
    let market = parse_market_json("{}").expect("empty object should parse");
    assert!(market.team_array.is_empty());
    assert!(market.listings().is_empty());
}

#[test]
fn market_null_is_empty() {
    assert!(parse_market_json("null").expect("null should parse").team_array.is_empty());
    assert!(parse_market_json("").expect("blank should parse").team_array.is_empty());
}

#[test]
fn team_with_missing_player_array_parses() {
    let raw = r#"{
        "teamId": { "uuid": "t-1" },
        "teamName": "Bare FC",
        "teamCountry": "Spain"
    }"#;
    let team = parse_team_json(raw).expect("team without players should parse");
    assert_eq!(team.squad_size(), 0);
    assert_eq!(team.squad_value(), 0);
    assert_eq!(team.team_balance, 0);
}

#[test]
fn outcome_error_field_is_surfaced() {
    let outcome =
        parse_outcome_json(r#"{"error":"Team balance is not sufficient for this transfer"}"#)
            .expect("outcome should parse");
    assert_eq!(
        outcome.error.as_deref(),
        Some("Team balance is not sufficient for this transfer")
    );
}

#[test]
fn outcome_without_error_is_clean() {
    assert!(parse_outcome_json("{}").expect("should parse").error.is_none());
    // A confirmed mutation may echo the entity id; that is not an error.
    let outcome = parse_outcome_json(r#"{"playerId":{"uuid":"p-9"}}"#).expect("should parse");
    assert!(outcome.error.is_none());
}

#[test]
fn outcome_empty_body_is_clean() {
    assert!(parse_outcome_json("").expect("should parse").error.is_none());
    assert!(parse_outcome_json("null").expect("should parse").error.is_none());
}

#[test]
fn parses_token_response() {
    let token = parse_token_json(r#"{"token":"9b3c1f"}"#).expect("token should parse");
    assert_eq!(token.token, "9b3c1f");
}

#[test]
fn put_player_uses_wire_field_names() {
    let put = PutPlayer {
        player_id: PlayerId {
            uuid: "p-1".to_string(),
        },
        player_first_name: "Aaron".to_string(),
        player_last_name: "Hansen".to_string(),
        player_country: "Denmark".to_string(),
        player_transfer_value: 0,
    };
    let value = serde_json::to_value(&put).expect("payload should serialize");
    let object = value.as_object().expect("payload is an object");
    assert!(object.contains_key("playerId"));
    assert!(object.contains_key("playerFirstName"));
    assert!(object.contains_key("playerLastName"));
    assert!(object.contains_key("playerCountry"));
    assert!(object.contains_key("playerTransferValue"));
    assert_eq!(object.len(), 5);
}
