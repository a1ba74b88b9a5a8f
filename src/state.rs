use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::session::Session;

// Credential rules shown on the login screen and in auth failure alerts.
pub const LOGIN_RULES: &str = "Username must be a valid email address\n\
Password must have 8 characters or more with at least :\n\
1 lower case character\n\
1 upper case character\n\
1 numeric character\n\
1 special character !@#$%&";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PlayerId {
    pub uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TeamId {
    pub uuid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerType {
    #[serde(rename = "GOAL_KEEPER")]
    GoalKeeper,
    #[serde(rename = "DEFENDER")]
    Defender,
    #[serde(rename = "MIDFIELDER")]
    Midfielder,
    #[serde(rename = "ATTACKER")]
    Attacker,
}

pub fn player_type_label(player_type: PlayerType) -> &'static str {
    match player_type {
        PlayerType::GoalKeeper => "GOAL KEEPER",
        PlayerType::Defender => "DEFENDER",
        PlayerType::Midfielder => "MIDFIELDER",
        PlayerType::Attacker => "ATTACKER",
    }
}

/// A squad player as the backend serializes it. Asset value is server
/// computed; transfer value 0 means the player is not listed on the market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub player_id: PlayerId,
    pub player_type: PlayerType,
    pub player_first_name: String,
    pub player_last_name: String,
    pub player_country: String,
    pub player_age: u32,
    #[serde(default)]
    pub player_asset_value: i64,
    #[serde(default)]
    pub player_transfer_value: i64,
    #[serde(default)]
    pub team_id: Option<TeamId>,
}

impl Player {
    pub fn is_listed(&self) -> bool {
        self.player_transfer_value > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub team_id: TeamId,
    pub team_name: String,
    pub team_country: String,
    #[serde(default)]
    pub team_balance: i64,
    #[serde(default)]
    pub player_array: Vec<Player>,
}

impl Team {
    /// Display-only aggregate: sum of the squad's asset values.
    pub fn squad_value(&self) -> i64 {
        self.player_array
            .iter()
            .map(|player| player.player_asset_value)
            .sum()
    }

    pub fn squad_size(&self) -> usize {
        self.player_array.len()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    #[serde(default)]
    pub team_array: Vec<Team>,
}

impl Market {
    /// Open offers in render order: one (player, owning team) pair per listed
    /// player. Players with transfer value 0 are not listed.
    pub fn listings(&self) -> Vec<(&Player, &Team)> {
        let mut listings = Vec::new();
        for team in &self.team_array {
            for player in &team.player_array {
                if player.is_listed() {
                    listings.push((player, team));
                }
            }
        }
        listings
    }
}

// Mutation payloads: only the fields the backend accepts per operation.

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PutPlayer {
    pub player_id: PlayerId,
    pub player_first_name: String,
    pub player_last_name: String,
    pub player_country: String,
    pub player_transfer_value: i64,
}

impl PutPlayer {
    pub fn from_player(player: &Player) -> Self {
        Self {
            player_id: player.player_id.clone(),
            player_first_name: player.player_first_name.clone(),
            player_last_name: player.player_last_name.clone(),
            player_country: player.player_country.clone(),
            player_transfer_value: player.player_transfer_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PutTeam {
    pub team_id: TeamId,
    pub team_name: String,
    pub team_country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostTransfer {
    pub player_id: PlayerId,
    pub team_id: TeamId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    UpdatePlayer,
    UpdateTeam,
    TransferPlayer,
}

pub fn mutation_label(kind: MutationKind) -> &'static str {
    match kind {
        MutationKind::UpdatePlayer => "update player",
        MutationKind::UpdateTeam => "update team",
        MutationKind::TransferPlayer => "transfer player",
    }
}

pub fn mutation_title(kind: MutationKind) -> &'static str {
    match kind {
        MutationKind::UpdatePlayer => "Update player",
        MutationKind::UpdateTeam => "Update team",
        MutationKind::TransferPlayer => "Transfer player",
    }
}

/// Commands the UI sends to the provider thread.
#[derive(Debug, Clone)]
pub enum BackendCommand {
    FetchTeam,
    FetchMarket,
    UpdatePlayer(PutPlayer),
    UpdateTeam(PutTeam),
    TransferPlayer(PostTransfer),
    SignIn(Credentials),
    SignUp(Credentials),
}

/// Guard key for mutations so a duplicate request cannot go out while the
/// first is still pending. Snapshot fetches are not guarded; reloads are
/// already serialized by the reload flag.
pub fn command_guard_key(command: &BackendCommand) -> Option<String> {
    match command {
        BackendCommand::FetchTeam | BackendCommand::FetchMarket => None,
        BackendCommand::UpdatePlayer(put) => Some(format!("player:{}", put.player_id.uuid)),
        BackendCommand::UpdateTeam(put) => Some(format!("team:{}", put.team_id.uuid)),
        BackendCommand::TransferPlayer(post) => Some(format!("transfer:{}", post.player_id.uuid)),
        BackendCommand::SignIn(_) | BackendCommand::SignUp(_) => Some("auth".to_string()),
    }
}

#[derive(Debug, Default)]
pub struct InflightGuard {
    keys: HashSet<String>,
}

impl InflightGuard {
    /// Returns false when the key is already pending; the command must be
    /// dropped, not queued.
    pub fn try_begin(&mut self, key: &str) -> bool {
        self.keys.insert(key.to_string())
    }

    pub fn finish(&mut self, key: &str) {
        self.keys.remove(key);
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

/// Updates the provider pushes back to the UI thread.
#[derive(Debug, Clone)]
pub enum Delta {
    SetTeam(Team),
    SetMarket(Market),
    SessionReady { user_id: String, token: String },
    MutationDone(MutationKind),
    Alert(String),
    Log(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    EditPlayerFirstName,
    EditPlayerLastName,
    EditPlayerCountry,
    EditPlayerTransferValue,
    EditTeamName,
    EditTeamCountry,
    TransferPlayer,
}

pub const PLAYER_ACTIONS: &[RowAction] = &[
    RowAction::EditPlayerFirstName,
    RowAction::EditPlayerLastName,
    RowAction::EditPlayerCountry,
    RowAction::EditPlayerTransferValue,
];

pub const TEAM_ACTIONS: &[RowAction] = &[RowAction::EditTeamName, RowAction::EditTeamCountry];

pub const MARKET_ACTIONS: &[RowAction] = &[RowAction::TransferPlayer];

pub fn action_key(action: RowAction) -> char {
    match action {
        RowAction::EditPlayerFirstName => 'f',
        RowAction::EditPlayerLastName => 'l',
        RowAction::EditPlayerCountry => 'c',
        RowAction::EditPlayerTransferValue => 'v',
        RowAction::EditTeamName => 'n',
        RowAction::EditTeamCountry => 'c',
        RowAction::TransferPlayer => 't',
    }
}

pub fn action_label(action: RowAction) -> &'static str {
    match action {
        RowAction::EditPlayerFirstName => "first name",
        RowAction::EditPlayerLastName => "last name",
        RowAction::EditPlayerCountry => "country",
        RowAction::EditPlayerTransferValue => "transfer value",
        RowAction::EditTeamName => "name",
        RowAction::EditTeamCountry => "country",
        RowAction::TransferPlayer => "transfer",
    }
}

pub fn action_hint(actions: &[RowAction]) -> String {
    actions
        .iter()
        .map(|action| format!("{}:{}", action_key(*action), action_label(*action)))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn action_for_key(actions: &[RowAction], key: char) -> Option<RowAction> {
    actions
        .iter()
        .copied()
        .find(|action| action_key(*action) == key)
}

/// One rendered table row: cell strings in fixed column order plus the action
/// tags that drive the row's hotkeys. Rows hold no entity references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub key: String,
    pub cells: Vec<String>,
    pub actions: Vec<RowAction>,
}

/// Row book for one table. At most one row per entity key; a refresh replaces
/// the row's cells wholesale so stale and fresh cells never mix.
#[derive(Debug, Clone, Default)]
pub struct TableRows {
    rows: Vec<TableRow>,
    index: HashMap<String, usize>,
}

impl TableRows {
    pub fn clear(&mut self) {
        self.rows.clear();
        self.index.clear();
    }

    pub fn upsert(&mut self, key: &str, cells: Vec<String>, actions: Vec<RowAction>) {
        match self.index.get(key) {
            Some(&at) => {
                self.rows[at] = TableRow {
                    key: key.to_string(),
                    cells,
                    actions,
                };
            }
            None => {
                self.index.insert(key.to_string(), self.rows.len());
                self.rows.push(TableRow {
                    key: key.to_string(),
                    cells,
                    actions,
                });
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&TableRow> {
        self.index.get(key).map(|&at| &self.rows[at])
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// Cell builders. Column order is fixed per table: id first, domain fields in
// declaration order, the action hints last.

pub fn player_cells(player: &Player) -> Vec<String> {
    vec![
        player.player_id.uuid.clone(),
        player_type_label(player.player_type).to_string(),
        player.player_first_name.clone(),
        player.player_last_name.clone(),
        player.player_age.to_string(),
        player.player_country.clone(),
        player.player_asset_value.to_string(),
        player.player_transfer_value.to_string(),
        action_hint(PLAYER_ACTIONS),
    ]
}

pub fn team_cells(team: &Team) -> Vec<String> {
    vec![
        team.team_id.uuid.clone(),
        team.team_name.clone(),
        team.team_country.clone(),
        team.team_balance.to_string(),
        team.squad_value().to_string(),
        team.squad_size().to_string(),
        action_hint(TEAM_ACTIONS),
    ]
}

pub fn market_cells(player: &Player, owner: &Team) -> Vec<String> {
    vec![
        player.player_id.uuid.clone(),
        player_type_label(player.player_type).to_string(),
        player.player_first_name.clone(),
        player.player_last_name.clone(),
        player.player_age.to_string(),
        player.player_country.clone(),
        player.player_transfer_value.to_string(),
        owner.team_name.clone(),
        owner.team_country.clone(),
        owner.team_id.uuid.clone(),
        action_hint(MARKET_ACTIONS),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

pub fn auth_mode_label(mode: AuthMode) -> &'static str {
    match mode {
        AuthMode::SignIn => "SIGN IN",
        AuthMode::SignUp => "SIGN UP",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardTable {
    Team,
    Players,
    Market,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    PlayerFirstName { uuid: String },
    PlayerLastName { uuid: String },
    PlayerCountry { uuid: String },
    PlayerTransferValue { uuid: String },
    TeamName,
    TeamCountry,
}

/// Modal edit prompt, pre-filled with the current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPrompt {
    pub title: String,
    pub input: String,
    pub target: EditTarget,
}

/// Transfer value edits must be integer-parseable and non-negative; anything
/// else aborts the edit silently. 0 is accepted and means "not listed".
pub fn parse_transfer_value(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|value| *value >= 0)
}

/// Builds the auth command, or None when either credential is missing. No
/// request goes out for missing credentials and no alert is raised.
pub fn auth_command(mode: AuthMode, username: &str, password: &str) -> Option<BackendCommand> {
    if username.trim().is_empty() || password.trim().is_empty() {
        return None;
    }
    let credentials = Credentials {
        username: username.to_string(),
        password: password.to_string(),
    };
    match mode {
        AuthMode::SignIn => Some(BackendCommand::SignIn(credentials)),
        AuthMode::SignUp => Some(BackendCommand::SignUp(credentials)),
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub auth_mode: AuthMode,
    pub login_focus: LoginField,
    pub login_username: String,
    pub login_password: String,
    pub user_id: Option<String>,
    pub focus: DashboardTable,
    pub team: Option<Team>,
    pub market: Option<Market>,
    pub team_rows: TableRows,
    pub player_rows: TableRows,
    pub market_rows: TableRows,
    pub selected_player: usize,
    pub selected_market: usize,
    pub prompt: Option<EditPrompt>,
    pub alert: Option<String>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub reload_pending: bool,
    pub pending_session: Option<Session>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Login,
            auth_mode: AuthMode::SignIn,
            login_focus: LoginField::Username,
            login_username: String::new(),
            login_password: String::new(),
            user_id: None,
            focus: DashboardTable::Players,
            team: None,
            market: None,
            team_rows: TableRows::default(),
            player_rows: TableRows::default(),
            market_rows: TableRows::default(),
            selected_player: 0,
            selected_market: 0,
            prompt: None,
            alert: None,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
            reload_pending: false,
            pending_session: None,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        let stamp = chrono::Local::now().format("%H:%M:%S");
        self.logs.push_back(format!("{stamp} {}", msg.into()));
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Drops all fetched snapshots and rows. Runs before a reload so the next
    /// frame is rebuilt entirely from fresh responses.
    pub fn clear_snapshots(&mut self) {
        self.team = None;
        self.market = None;
        self.team_rows.clear();
        self.player_rows.clear();
        self.market_rows.clear();
        self.selected_player = 0;
        self.selected_market = 0;
    }

    pub fn reset_to_login(&mut self) {
        let logs = std::mem::take(&mut self.logs);
        *self = Self::new();
        self.logs = logs;
    }

    pub fn player_by_uuid(&self, uuid: &str) -> Option<&Player> {
        self.team
            .as_ref()?
            .player_array
            .iter()
            .find(|player| player.player_id.uuid == uuid)
    }

    pub fn rebuild_team_rows(&mut self) {
        self.team_rows.clear();
        let Some(team) = &self.team else {
            return;
        };
        let uuid = team.team_id.uuid.clone();
        let cells = team_cells(team);
        self.team_rows.upsert(&uuid, cells, TEAM_ACTIONS.to_vec());
    }

    pub fn rebuild_player_rows(&mut self) {
        self.player_rows.clear();
        let Some(team) = &self.team else {
            return;
        };
        let built: Vec<(String, Vec<String>)> = team
            .player_array
            .iter()
            .map(|player| (player.player_id.uuid.clone(), player_cells(player)))
            .collect();
        for (uuid, cells) in built {
            self.player_rows.upsert(&uuid, cells, PLAYER_ACTIONS.to_vec());
        }
        if self.selected_player >= self.player_rows.len() {
            self.selected_player = self.player_rows.len().saturating_sub(1);
        }
    }

    pub fn rebuild_market_rows(&mut self) {
        self.market_rows.clear();
        let Some(market) = &self.market else {
            return;
        };
        let built: Vec<(String, Vec<String>)> = market
            .listings()
            .into_iter()
            .map(|(player, owner)| (player.player_id.uuid.clone(), market_cells(player, owner)))
            .collect();
        for (uuid, cells) in built {
            self.market_rows.upsert(&uuid, cells, MARKET_ACTIONS.to_vec());
        }
        if self.selected_market >= self.market_rows.len() {
            self.selected_market = self.market_rows.len().saturating_sub(1);
        }
    }

    /// Full-rewrite refresh of a single player row after an in-memory edit.
    pub fn refresh_player_row(&mut self, uuid: &str) {
        let Some(player) = self.player_by_uuid(uuid) else {
            return;
        };
        let cells = player_cells(player);
        self.player_rows.upsert(uuid, cells, PLAYER_ACTIONS.to_vec());
    }

    pub fn refresh_team_row(&mut self) {
        let Some(team) = &self.team else {
            return;
        };
        let uuid = team.team_id.uuid.clone();
        let cells = team_cells(team);
        self.team_rows.upsert(&uuid, cells, TEAM_ACTIONS.to_vec());
    }

    /// Opens the modal prompt for an edit action, pre-filled with the current
    /// value. `key` is the row key (entity uuid).
    pub fn open_prompt(&mut self, action: RowAction, key: &str) {
        let prompt = match action {
            RowAction::EditPlayerFirstName => self.player_by_uuid(key).map(|player| EditPrompt {
                title: "Enter the first name of the player".to_string(),
                input: player.player_first_name.clone(),
                target: EditTarget::PlayerFirstName {
                    uuid: key.to_string(),
                },
            }),
            RowAction::EditPlayerLastName => self.player_by_uuid(key).map(|player| EditPrompt {
                title: "Enter the last name of the player".to_string(),
                input: player.player_last_name.clone(),
                target: EditTarget::PlayerLastName {
                    uuid: key.to_string(),
                },
            }),
            RowAction::EditPlayerCountry => self.player_by_uuid(key).map(|player| EditPrompt {
                title: "Enter the country of the player".to_string(),
                input: player.player_country.clone(),
                target: EditTarget::PlayerCountry {
                    uuid: key.to_string(),
                },
            }),
            RowAction::EditPlayerTransferValue => {
                self.player_by_uuid(key).map(|player| EditPrompt {
                    title: "Enter the transfer value of the player. 0 for no transfer".to_string(),
                    input: player.player_transfer_value.to_string(),
                    target: EditTarget::PlayerTransferValue {
                        uuid: key.to_string(),
                    },
                })
            }
            RowAction::EditTeamName => self.team.as_ref().map(|team| EditPrompt {
                title: "Enter the name of the team".to_string(),
                input: team.team_name.clone(),
                target: EditTarget::TeamName,
            }),
            RowAction::EditTeamCountry => self.team.as_ref().map(|team| EditPrompt {
                title: "Enter the country of the team".to_string(),
                input: team.team_country.clone(),
                target: EditTarget::TeamCountry,
            }),
            RowAction::TransferPlayer => None,
        };
        if prompt.is_some() {
            self.prompt = prompt;
        }
    }

    /// Confirms the open prompt: validate, apply to the in-memory entity,
    /// rewrite the row, and return the backend command for dispatch. The row
    /// rewrite happens before the request goes out; a later server rejection
    /// is not rolled back here, the alert is the only signal. Returns None
    /// on a validation failure, which aborts the edit silently: entity and
    /// row stay untouched and nothing is dispatched.
    pub fn confirm_prompt(&mut self) -> Option<BackendCommand> {
        let prompt = self.prompt.take()?;
        let input = prompt.input;
        match prompt.target {
            EditTarget::PlayerFirstName { uuid } => {
                self.apply_player_edit(&uuid, |player| player.player_first_name = input)
            }
            EditTarget::PlayerLastName { uuid } => {
                self.apply_player_edit(&uuid, |player| player.player_last_name = input)
            }
            EditTarget::PlayerCountry { uuid } => {
                self.apply_player_edit(&uuid, |player| player.player_country = input)
            }
            EditTarget::PlayerTransferValue { uuid } => {
                let value = parse_transfer_value(&input)?;
                self.apply_player_edit(&uuid, |player| player.player_transfer_value = value)
            }
            EditTarget::TeamName => self.apply_team_edit(|team| team.team_name = input),
            EditTarget::TeamCountry => self.apply_team_edit(|team| team.team_country = input),
        }
    }

    fn apply_player_edit(
        &mut self,
        uuid: &str,
        apply: impl FnOnce(&mut Player),
    ) -> Option<BackendCommand> {
        let team = self.team.as_mut()?;
        let player = team
            .player_array
            .iter_mut()
            .find(|player| player.player_id.uuid == uuid)?;
        apply(player);
        let put = PutPlayer::from_player(player);
        self.refresh_player_row(uuid);
        Some(BackendCommand::UpdatePlayer(put))
    }

    fn apply_team_edit(&mut self, apply: impl FnOnce(&mut Team)) -> Option<BackendCommand> {
        let team = self.team.as_mut()?;
        apply(team);
        let put = PutTeam {
            team_id: team.team_id.clone(),
            team_name: team.team_name.clone(),
            team_country: team.team_country.clone(),
        };
        self.refresh_team_row();
        Some(BackendCommand::UpdateTeam(put))
    }

    /// Transfer command for the selected market row. Not optimistic: the row
    /// only changes on the reload that follows a confirmed transfer.
    pub fn transfer_command(&self) -> Option<BackendCommand> {
        let market = self.market.as_ref()?;
        let listings = market.listings();
        let (player, owner) = listings.get(self.selected_market)?;
        Some(BackendCommand::TransferPlayer(PostTransfer {
            player_id: player.player_id.clone(),
            team_id: owner.team_id.clone(),
        }))
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetTeam(team) => {
            state.team = Some(team);
            state.rebuild_team_rows();
            state.rebuild_player_rows();
        }
        Delta::SetMarket(market) => {
            state.market = Some(market);
            state.rebuild_market_rows();
        }
        Delta::SessionReady { user_id, token } => {
            state.pending_session = Some(Session {
                user_id: user_id.clone(),
                token,
            });
            state.user_id = Some(user_id);
            state.screen = Screen::Dashboard;
            state.login_password.clear();
            state.reload_pending = true;
            state.push_log("[INFO] Signed in");
        }
        Delta::MutationDone(kind) => {
            state.reload_pending = true;
            state.push_log(format!("[INFO] {} confirmed", mutation_label(kind)));
        }
        Delta::Alert(message) => {
            state.push_log(format!("[WARN] {}", message.replace('\n', " ")));
            state.alert = Some(message);
        }
        Delta::Log(message) => state.push_log(message),
    }
}
