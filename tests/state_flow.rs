use std::sync::mpsc;

use soccer_terminal::api::MutationOutcome;
use soccer_terminal::feed::deliver_mutation_outcome;
use soccer_terminal::state::{
    apply_delta, auth_command, command_guard_key, parse_transfer_value, AppState, AuthMode,
    BackendCommand, Delta, InflightGuard, MutationKind, Player, PlayerId, PlayerType, RowAction,
    Screen, Team, TeamId,
};

fn player(uuid: &str, transfer: i64) -> Player {
    Player {
        player_id: PlayerId {
            uuid: uuid.to_string(),
        },
        player_type: PlayerType::Attacker,
        player_first_name: "Karim".to_string(),
        player_last_name: "Moreau".to_string(),
        player_country: "France".to_string(),
        player_age: 21,
        player_asset_value: 1_000_000,
        player_transfer_value: transfer,
        team_id: Some(TeamId {
            uuid: "T1".to_string(),
        }),
    }
}

fn state_with_player(transfer: i64) -> AppState {
    let mut state = AppState::new();
    state.team = Some(Team {
        team_id: TeamId {
            uuid: "T1".to_string(),
        },
        team_name: "Riverton Rovers".to_string(),
        team_country: "England".to_string(),
        team_balance: 5_000_000,
        player_array: vec![player("p1", transfer)],
    });
    state.rebuild_team_rows();
    state.rebuild_player_rows();
    state
}

#[test]
fn transfer_value_validation() {
    assert_eq!(parse_transfer_value("0"), Some(0));
    assert_eq!(parse_transfer_value(" 42 "), Some(42));
    assert_eq!(parse_transfer_value("-1"), None);
    assert_eq!(parse_transfer_value("3.5"), None);
    assert_eq!(parse_transfer_value("abc"), None);
    assert_eq!(parse_transfer_value(""), None);
}

#[test]
fn invalid_transfer_value_aborts_silently() {
    let mut state = state_with_player(250_000);
    let before = state.player_rows.rows().to_vec();

    state.open_prompt(RowAction::EditPlayerTransferValue, "p1");
    let prompt = state.prompt.as_mut().expect("prompt opens");
    assert_eq!(prompt.input, "250000");
    prompt.input = "not-a-number".to_string();

    assert!(state.confirm_prompt().is_none());
    assert!(state.prompt.is_none());
    let unchanged = state.player_by_uuid("p1").expect("player exists");
    assert_eq!(unchanged.player_transfer_value, 250_000);
    assert_eq!(state.player_rows.rows(), before.as_slice());
}

#[test]
fn negative_transfer_value_aborts_silently() {
    let mut state = state_with_player(250_000);
    state.open_prompt(RowAction::EditPlayerTransferValue, "p1");
    state.prompt.as_mut().expect("prompt opens").input = "-5".to_string();

    assert!(state.confirm_prompt().is_none());
    let unchanged = state.player_by_uuid("p1").expect("player exists");
    assert_eq!(unchanged.player_transfer_value, 250_000);
}

#[test]
fn zero_transfer_value_delists_without_rejection() {
    let mut state = state_with_player(250_000);
    state.open_prompt(RowAction::EditPlayerTransferValue, "p1");
    state.prompt.as_mut().expect("prompt opens").input = "0".to_string();

    let command = state.confirm_prompt().expect("zero is a valid edit");
    match command {
        BackendCommand::UpdatePlayer(put) => assert_eq!(put.player_transfer_value, 0),
        other => panic!("expected UpdatePlayer, got {other:?}"),
    }
    let edited = state.player_by_uuid("p1").expect("player exists");
    assert!(!edited.is_listed());
    let row = state.player_rows.get("p1").expect("row exists");
    assert_eq!(row.cells[7], "0");
}

#[test]
fn edit_renders_before_dispatch() {
    let mut state = state_with_player(0);
    state.open_prompt(RowAction::EditPlayerFirstName, "p1");
    state.prompt.as_mut().expect("prompt opens").input = "Rafael".to_string();

    let command = state.confirm_prompt().expect("edit accepted");
    // Row already shows the edit even though no delta came back yet.
    let row = state.player_rows.get("p1").expect("row exists");
    assert_eq!(row.cells[2], "Rafael");
    assert!(!state.reload_pending);
    match command {
        BackendCommand::UpdatePlayer(put) => assert_eq!(put.player_first_name, "Rafael"),
        other => panic!("expected UpdatePlayer, got {other:?}"),
    }
}

#[test]
fn team_edit_is_optimistic_too() {
    let mut state = state_with_player(0);
    state.open_prompt(RowAction::EditTeamName, "T1");
    state.prompt.as_mut().expect("prompt opens").input = "Harbour Rovers".to_string();

    let command = state.confirm_prompt().expect("edit accepted");
    let row = state.team_rows.get("T1").expect("row exists");
    assert_eq!(row.cells[1], "Harbour Rovers");
    match command {
        BackendCommand::UpdateTeam(put) => assert_eq!(put.team_name, "Harbour Rovers"),
        other => panic!("expected UpdateTeam, got {other:?}"),
    }
}

#[test]
fn rejected_mutation_alerts_and_does_not_reload() {
    let (tx, rx) = mpsc::channel();
    deliver_mutation_outcome(
        &tx,
        MutationKind::UpdatePlayer,
        Ok(MutationOutcome {
            error: Some("Transfer value can not be negative".to_string()),
        }),
    );

    let delta = rx.try_recv().expect("one delta");
    let Delta::Alert(message) = delta else {
        panic!("expected alert delta");
    };
    assert!(message.contains("Update player failed"));
    assert!(message.contains("Transfer value can not be negative"));
    assert!(rx.try_recv().is_err());

    let mut state = AppState::new();
    apply_delta(&mut state, Delta::Alert(message.clone()));
    assert_eq!(state.alert.as_deref(), Some(message.as_str()));
    assert!(!state.reload_pending);
}

#[test]
fn clean_mutation_triggers_reload() {
    let (tx, rx) = mpsc::channel();
    deliver_mutation_outcome(&tx, MutationKind::UpdateTeam, Ok(MutationOutcome::default()));

    let delta = rx.try_recv().expect("one delta");
    assert!(matches!(delta, Delta::MutationDone(MutationKind::UpdateTeam)));

    let mut state = AppState::new();
    apply_delta(&mut state, delta);
    assert!(state.reload_pending);
    assert!(state.alert.is_none());
}

#[test]
fn transport_failure_names_the_operation() {
    let (tx, rx) = mpsc::channel();
    deliver_mutation_outcome(
        &tx,
        MutationKind::TransferPlayer,
        Err(anyhow::anyhow!("http 500 Internal Server Error")),
    );

    let mut saw_alert = false;
    while let Ok(delta) = rx.try_recv() {
        if let Delta::Alert(message) = delta {
            assert!(message.starts_with("Failure to transfer player"));
            saw_alert = true;
        }
    }
    assert!(saw_alert);
}

#[test]
fn auth_command_requires_both_credentials() {
    assert!(auth_command(AuthMode::SignUp, "", "Secret1!").is_none());
    assert!(auth_command(AuthMode::SignUp, "a@b.com", "").is_none());
    assert!(auth_command(AuthMode::SignIn, "   ", "Secret1!").is_none());

    let command = auth_command(AuthMode::SignIn, "a@b.com", "Secret1!");
    assert!(matches!(command, Some(BackendCommand::SignIn(_))));
}

#[test]
fn session_ready_switches_to_dashboard() {
    let mut state = AppState::new();
    assert_eq!(state.screen, Screen::Login);
    apply_delta(
        &mut state,
        Delta::SessionReady {
            user_id: "a@b.com".to_string(),
            token: "deadbeef".to_string(),
        },
    );
    assert_eq!(state.screen, Screen::Dashboard);
    assert_eq!(state.user_id.as_deref(), Some("a@b.com"));
    assert!(state.reload_pending);
    let session = state.pending_session.expect("session to persist");
    assert_eq!(session.token, "deadbeef");
}

#[test]
fn inflight_guard_drops_duplicates() {
    let mut guard = InflightGuard::default();
    assert!(guard.try_begin("player:p1"));
    assert!(!guard.try_begin("player:p1"));
    assert!(guard.try_begin("player:p2"));
    guard.finish("player:p1");
    assert!(guard.try_begin("player:p1"));
}

#[test]
fn guard_keys_are_per_entity_and_action() {
    let mut state = state_with_player(0);
    state.open_prompt(RowAction::EditPlayerCountry, "p1");
    state.prompt.as_mut().expect("prompt opens").input = "Spain".to_string();
    let update = state.confirm_prompt().expect("edit accepted");
    assert_eq!(command_guard_key(&update).as_deref(), Some("player:p1"));

    assert!(command_guard_key(&BackendCommand::FetchTeam).is_none());
    let auth = auth_command(AuthMode::SignIn, "a@b.com", "pw").expect("command builds");
    assert_eq!(command_guard_key(&auth).as_deref(), Some("auth"));
}

#[test]
fn transfer_command_targets_selected_listing() {
    use soccer_terminal::state::Market;

    let mut seller = Team {
        team_id: TeamId {
            uuid: "T2".to_string(),
        },
        team_name: "Harbour City FC".to_string(),
        team_country: "England".to_string(),
        team_balance: 4_000_000,
        player_array: vec![player("m1", 300_000), player("m2", 600_000)],
    };
    for p in &mut seller.player_array {
        p.team_id = Some(seller.team_id.clone());
    }

    let mut state = AppState::new();
    state.market = Some(Market {
        team_array: vec![seller],
    });
    state.rebuild_market_rows();
    state.selected_market = 1;

    let command = state.transfer_command().expect("listing selected");
    match command {
        BackendCommand::TransferPlayer(post) => {
            assert_eq!(post.player_id.uuid, "m2");
            assert_eq!(post.team_id.uuid, "T2");
        }
        other => panic!("expected TransferPlayer, got {other:?}"),
    }
}
