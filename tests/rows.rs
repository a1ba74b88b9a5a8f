use soccer_terminal::state::{
    market_cells, player_cells, team_cells, AppState, Market, Player, PlayerId, PlayerType,
    RowAction, TableRows, Team, TeamId,
};

fn player(uuid: &str, first: &str, asset: i64, transfer: i64) -> Player {
    Player {
        player_id: PlayerId {
            uuid: uuid.to_string(),
        },
        player_type: PlayerType::Midfielder,
        player_first_name: first.to_string(),
        player_last_name: "Kovac".to_string(),
        player_country: "Croatia".to_string(),
        player_age: 25,
        player_asset_value: asset,
        player_transfer_value: transfer,
        team_id: Some(TeamId {
            uuid: "T1".to_string(),
        }),
    }
}

fn team(players: Vec<Player>) -> Team {
    Team {
        team_id: TeamId {
            uuid: "T1".to_string(),
        },
        team_name: "Riverton Rovers".to_string(),
        team_country: "England".to_string(),
        team_balance: 100,
        player_array: players,
    }
}

#[test]
fn rebuild_is_idempotent() {
    let mut state = AppState::new();
    state.team = Some(team(vec![
        player("p1", "Aaron", 30, 0),
        player("p2", "Marco", 20, 500_000),
    ]));

    state.rebuild_team_rows();
    state.rebuild_player_rows();
    let team_once = state.team_rows.rows().to_vec();
    let players_once = state.player_rows.rows().to_vec();

    state.rebuild_team_rows();
    state.rebuild_player_rows();
    assert_eq!(state.team_rows.rows(), team_once.as_slice());
    assert_eq!(state.player_rows.rows(), players_once.as_slice());
}

#[test]
fn single_row_refresh_is_idempotent() {
    let mut state = AppState::new();
    state.team = Some(team(vec![player("p1", "Aaron", 30, 0)]));
    state.rebuild_player_rows();

    state.refresh_player_row("p1");
    let once = state.player_rows.rows().to_vec();
    state.refresh_player_row("p1");
    assert_eq!(state.player_rows.rows(), once.as_slice());
    assert_eq!(state.player_rows.len(), 1);
}

#[test]
fn team_row_shows_derived_value_and_count() {
    let squad = team(vec![
        player("p1", "Aaron", 30, 0),
        player("p2", "Marco", 20, 0),
    ]);
    let cells = team_cells(&squad);
    assert_eq!(cells[3], "100");
    assert_eq!(cells[4], "50");
    assert_eq!(cells[5], "2");
}

#[test]
fn cell_counts_are_fixed() {
    let squad = team(vec![player("p1", "Aaron", 30, 250_000)]);
    assert_eq!(team_cells(&squad).len(), 7);
    assert_eq!(player_cells(&squad.player_array[0]).len(), 9);
    assert_eq!(market_cells(&squad.player_array[0], &squad).len(), 11);
}

#[test]
fn player_cells_follow_column_order() {
    let subject = player("p1", "Aaron", 1_000_000, 750_000);
    let cells = player_cells(&subject);
    assert_eq!(cells[0], "p1");
    assert_eq!(cells[1], "MIDFIELDER");
    assert_eq!(cells[2], "Aaron");
    assert_eq!(cells[3], "Kovac");
    assert_eq!(cells[4], "25");
    assert_eq!(cells[5], "Croatia");
    assert_eq!(cells[6], "1000000");
    assert_eq!(cells[7], "750000");
}

#[test]
fn upsert_keeps_one_row_per_key() {
    let mut rows = TableRows::default();
    rows.upsert("p1", vec!["a".to_string()], vec![RowAction::TransferPlayer]);
    rows.upsert("p1", vec!["b".to_string()], vec![RowAction::TransferPlayer]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.get("p1").expect("row exists").cells[0], "b");
}

#[test]
fn market_hides_unlisted_players() {
    let mut seller = team(vec![
        player("p1", "Aaron", 30, 0),
        player("p2", "Marco", 20, 400_000),
    ]);
    seller.team_id = TeamId {
        uuid: "T2".to_string(),
    };
    let market = Market {
        team_array: vec![seller],
    };

    let mut state = AppState::new();
    state.market = Some(market);
    state.rebuild_market_rows();

    assert_eq!(state.market_rows.len(), 1);
    let row = state.market_rows.rows().first().expect("one listing");
    assert_eq!(row.key, "p2");
    assert_eq!(row.cells[6], "400000");
    assert_eq!(row.cells[9], "T2");
}
