use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use rand::rngs::ThreadRng;
use rand::Rng;

use crate::api::MutationOutcome;
use crate::feed::deliver_mutation_outcome;
use crate::state::{
    BackendCommand, Delta, Market, MutationKind, Player, PlayerId, PlayerType, PostTransfer,
    PutPlayer, PutTeam, Team, TeamId,
};

const FIRST_NAMES: &[&str] = &[
    "Aaron", "Bruno", "Carlos", "Diego", "Emil", "Felix", "Goran", "Hugo", "Ivan", "Jonas",
    "Karim", "Luca", "Marco", "Nico", "Oscar", "Pavel", "Rafael", "Sven", "Tomas", "Yusuf",
];

const LAST_NAMES: &[&str] = &[
    "Almeida", "Bakker", "Costa", "Dubois", "Eriksen", "Ferrari", "Garcia", "Hansen", "Ibrahim",
    "Jensen", "Kovac", "Larsen", "Moreau", "Novak", "Olsen", "Pereira", "Rossi", "Silva",
    "Tanaka", "Vargas",
];

const COUNTRIES: &[&str] = &[
    "Argentina", "Brazil", "Croatia", "Denmark", "England", "France", "Germany", "Italy",
    "Japan", "Morocco", "Netherlands", "Portugal", "Senegal", "Spain", "Uruguay",
];

const RIVAL_TEAMS: &[(&str, &str)] = &[
    ("Harbour City FC", "England"),
    ("Atletico Ribera", "Spain"),
    ("Sparta Nordland", "Denmark"),
];

// New-account defaults: squad split by position, fresh balance and values.
const SQUAD_PLAN: &[(PlayerType, usize)] = &[
    (PlayerType::GoalKeeper, 3),
    (PlayerType::Defender, 6),
    (PlayerType::Midfielder, 6),
    (PlayerType::Attacker, 5),
];
const DEFAULT_ASSET_VALUE: i64 = 1_000_000;
const DEFAULT_TEAM_BALANCE: i64 = 5_000_000;

/// Offline provider: answers the same command protocol as the live feed from
/// a seeded in-memory world, so the dashboard runs without a backend.
pub fn spawn_demo_provider(tx: Sender<Delta>, cmd_rx: Receiver<BackendCommand>) {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();
        let mut world = DemoWorld::seed(&mut rng);

        while let Ok(command) = cmd_rx.recv() {
            match command {
                BackendCommand::FetchTeam => {
                    let _ = tx.send(Delta::SetTeam(world.my_team.clone()));
                }
                BackendCommand::FetchMarket => {
                    let _ = tx.send(Delta::SetMarket(world.market()));
                }
                BackendCommand::UpdatePlayer(put) => {
                    let outcome = world.apply_update_player(&put);
                    deliver_mutation_outcome(&tx, MutationKind::UpdatePlayer, Ok(outcome));
                }
                BackendCommand::UpdateTeam(put) => {
                    let outcome = world.apply_update_team(&put);
                    deliver_mutation_outcome(&tx, MutationKind::UpdateTeam, Ok(outcome));
                }
                BackendCommand::TransferPlayer(post) => {
                    let outcome = world.apply_transfer(&post);
                    deliver_mutation_outcome(&tx, MutationKind::TransferPlayer, Ok(outcome));
                }
                BackendCommand::SignIn(credentials) | BackendCommand::SignUp(credentials) => {
                    let _ = tx.send(Delta::SessionReady {
                        user_id: credentials.username,
                        token: random_token(&mut rng),
                    });
                }
            }
        }
    });
}

struct DemoWorld {
    my_team: Team,
    rivals: Vec<Team>,
}

impl DemoWorld {
    fn seed(rng: &mut ThreadRng) -> Self {
        let my_team = seed_team(rng, "Fantasy United", "England", 0);
        let rivals = RIVAL_TEAMS
            .iter()
            .map(|(name, country)| {
                let listed = rng.gen_range(2..=4);
                seed_team(rng, name, country, listed)
            })
            .collect();
        Self { my_team, rivals }
    }

    fn market(&self) -> Market {
        Market {
            team_array: self.rivals.clone(),
        }
    }

    fn apply_update_player(&mut self, put: &PutPlayer) -> MutationOutcome {
        let Some(player) = self
            .my_team
            .player_array
            .iter_mut()
            .find(|player| player.player_id == put.player_id)
        else {
            return reject("Player is not part of this team");
        };
        if put.player_transfer_value < 0 {
            return reject("Transfer value can not be negative");
        }
        player.player_first_name = put.player_first_name.clone();
        player.player_last_name = put.player_last_name.clone();
        player.player_country = put.player_country.clone();
        player.player_transfer_value = put.player_transfer_value;
        MutationOutcome::default()
    }

    fn apply_update_team(&mut self, put: &PutTeam) -> MutationOutcome {
        if self.my_team.team_id != put.team_id {
            return reject("Team does not belong to this user");
        }
        self.my_team.team_name = put.team_name.clone();
        self.my_team.team_country = put.team_country.clone();
        MutationOutcome::default()
    }

    fn apply_transfer(&mut self, post: &PostTransfer) -> MutationOutcome {
        let Some(seller) = self
            .rivals
            .iter_mut()
            .find(|team| team.team_id == post.team_id)
        else {
            return reject("Team to transfer from is not defined");
        };
        let Some(at) = seller
            .player_array
            .iter()
            .position(|player| player.player_id == post.player_id && player.is_listed())
        else {
            return reject("Player is not in the market anymore");
        };

        let fee = seller.player_array[at].player_transfer_value;
        if self.my_team.team_balance < fee {
            return reject("Team balance is not sufficient for this transfer");
        }

        let mut player = seller.player_array.remove(at);
        seller.team_balance += fee;
        self.my_team.team_balance -= fee;
        player.player_transfer_value = 0;
        player.team_id = Some(self.my_team.team_id.clone());
        self.my_team.player_array.push(player);
        MutationOutcome::default()
    }
}

fn reject(message: &str) -> MutationOutcome {
    MutationOutcome {
        error: Some(message.to_string()),
    }
}

fn seed_team(rng: &mut ThreadRng, name: &str, country: &str, listed: usize) -> Team {
    let team_id = TeamId {
        uuid: random_uuid(rng),
    };
    let mut player_array = Vec::new();
    for (player_type, count) in SQUAD_PLAN {
        for _ in 0..*count {
            player_array.push(seed_player(rng, *player_type, &team_id));
        }
    }
    // Flag the requested number of players as open transfer offers.
    let squad = player_array.len();
    for _ in 0..listed.min(squad) {
        let at = rng.gen_range(0..squad);
        player_array[at].player_transfer_value = i64::from(rng.gen_range(2..=8)) * 250_000;
    }
    Team {
        team_id,
        team_name: name.to_string(),
        team_country: country.to_string(),
        team_balance: DEFAULT_TEAM_BALANCE,
        player_array,
    }
}

fn seed_player(rng: &mut ThreadRng, player_type: PlayerType, team_id: &TeamId) -> Player {
    Player {
        player_id: PlayerId {
            uuid: random_uuid(rng),
        },
        player_type,
        player_first_name: FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())].to_string(),
        player_last_name: LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())].to_string(),
        player_country: COUNTRIES[rng.gen_range(0..COUNTRIES.len())].to_string(),
        player_age: 18 + rng.gen_range(0..23),
        player_asset_value: DEFAULT_ASSET_VALUE,
        player_transfer_value: 0,
        team_id: Some(team_id.clone()),
    }
}

fn random_uuid(rng: &mut ThreadRng) -> String {
    format!(
        "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
        rng.gen_range(0..=u32::MAX),
        rng.gen_range(0..=u16::MAX),
        rng.gen_range(0..=u16::MAX),
        rng.gen_range(0..=u16::MAX),
        rng.gen_range(0..=u64::MAX) & 0xffff_ffff_ffff
    )
}

fn random_token(rng: &mut ThreadRng) -> String {
    format!(
        "{:016x}{:016x}",
        rng.gen_range(0..=u64::MAX),
        rng.gen_range(0..=u64::MAX)
    )
}
