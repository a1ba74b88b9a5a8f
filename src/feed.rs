use std::env;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::Result;

use crate::api::{self, MutationOutcome};
use crate::session::Session;
use crate::state::{
    command_guard_key, mutation_label, mutation_title, AuthMode, BackendCommand, Credentials,
    Delta, InflightGuard, MutationKind, LOGIN_RULES,
};

/// Spawns the live provider. Commands arrive from the UI thread; each one is
/// run as a job on the fetch pool so responses land in network-completion
/// order, not issue order. Results travel back as `Delta`s.
pub fn spawn_provider(
    tx: Sender<Delta>,
    cmd_rx: Receiver<BackendCommand>,
    initial_session: Option<Session>,
) {
    thread::spawn(move || {
        let pool = build_fetch_pool();
        let session: Arc<Mutex<Option<Session>>> = Arc::new(Mutex::new(initial_session));
        let inflight: Arc<Mutex<InflightGuard>> = Arc::new(Mutex::new(InflightGuard::default()));

        while let Ok(command) = cmd_rx.recv() {
            let guard_key = command_guard_key(&command);
            if let Some(key) = &guard_key {
                let mut guard = inflight.lock().expect("inflight guard lock poisoned");
                if !guard.try_begin(key) {
                    let _ = tx.send(Delta::Log(format!(
                        "[INFO] {key} already in flight, request dropped"
                    )));
                    continue;
                }
            }

            let tx = tx.clone();
            let session = session.clone();
            let inflight = inflight.clone();
            let job = move || {
                run_command(command, &tx, &session);
                if let Some(key) = guard_key {
                    inflight
                        .lock()
                        .expect("inflight guard lock poisoned")
                        .finish(&key);
                }
            };

            if let Some(pool) = pool.as_ref() {
                pool.spawn(job);
            } else {
                thread::spawn(job);
            }
        }
    });
}

fn run_command(command: BackendCommand, tx: &Sender<Delta>, session: &Arc<Mutex<Option<Session>>>) {
    match command {
        BackendCommand::FetchTeam => {
            let current = current_session(session);
            match api::fetch_team(current.as_ref()) {
                Ok(team) => {
                    let _ = tx.send(Delta::SetTeam(team));
                }
                Err(err) => {
                    let _ = tx.send(Delta::Log(format!("[WARN] team fetch failed: {err}")));
                    let _ = tx.send(Delta::Alert("Failure to get team".to_string()));
                }
            }
        }
        BackendCommand::FetchMarket => {
            let current = current_session(session);
            match api::fetch_market(current.as_ref()) {
                Ok(market) => {
                    let _ = tx.send(Delta::SetMarket(market));
                }
                Err(err) => {
                    let _ = tx.send(Delta::Log(format!("[WARN] market fetch failed: {err}")));
                    let _ = tx.send(Delta::Alert("Failure to get market".to_string()));
                }
            }
        }
        BackendCommand::UpdatePlayer(put) => {
            let current = current_session(session);
            let result = api::update_player(current.as_ref(), &put);
            deliver_mutation_outcome(tx, MutationKind::UpdatePlayer, result);
        }
        BackendCommand::UpdateTeam(put) => {
            let current = current_session(session);
            let result = api::update_team(current.as_ref(), &put);
            deliver_mutation_outcome(tx, MutationKind::UpdateTeam, result);
        }
        BackendCommand::TransferPlayer(post) => {
            let current = current_session(session);
            let result = api::transfer_player(current.as_ref(), &post);
            deliver_mutation_outcome(tx, MutationKind::TransferPlayer, result);
        }
        BackendCommand::SignIn(credentials) => {
            run_auth(AuthMode::SignIn, credentials, tx, session);
        }
        BackendCommand::SignUp(credentials) => {
            run_auth(AuthMode::SignUp, credentials, tx, session);
        }
    }
}

fn run_auth(
    mode: AuthMode,
    credentials: Credentials,
    tx: &Sender<Delta>,
    session: &Arc<Mutex<Option<Session>>>,
) {
    let result = match mode {
        AuthMode::SignIn => api::sign_in(&credentials),
        AuthMode::SignUp => api::sign_up(&credentials),
    };
    match result {
        Ok(response) => {
            let fresh = Session {
                user_id: credentials.username.clone(),
                token: response.token,
            };
            *session.lock().expect("session lock poisoned") = Some(fresh.clone());
            let _ = tx.send(Delta::SessionReady {
                user_id: fresh.user_id,
                token: fresh.token,
            });
        }
        Err(err) => {
            let (label, hint) = match mode {
                AuthMode::SignIn => ("sign in", "Check your credentials."),
                AuthMode::SignUp => ("sign up", "User may already exist."),
            };
            let _ = tx.send(Delta::Log(format!("[WARN] {label} failed: {err}")));
            let _ = tx.send(Delta::Alert(format!(
                "Failure to {label}:\n\n{hint}\n\n{LOGIN_RULES}"
            )));
        }
    }
}

/// Maps a mutation result onto deltas: clean 200 confirms and triggers the
/// reload; a 200 carrying `{error}` raises the alert with the server message
/// and does not reload; a transport failure raises the generic
/// operation-named alert with the detail relegated to the console.
pub fn deliver_mutation_outcome(
    tx: &Sender<Delta>,
    kind: MutationKind,
    result: Result<MutationOutcome>,
) {
    match result {
        Ok(outcome) => match outcome.error {
            Some(message) => {
                let _ = tx.send(Delta::Alert(format!(
                    "{} failed:\n\n{message}",
                    mutation_title(kind)
                )));
            }
            None => {
                let _ = tx.send(Delta::MutationDone(kind));
            }
        },
        Err(err) => {
            let _ = tx.send(Delta::Log(format!(
                "[WARN] {} request failed: {err}",
                mutation_label(kind)
            )));
            let _ = tx.send(Delta::Alert(format!(
                "Failure to {}. Error = {err}",
                mutation_label(kind)
            )));
        }
    }
}

fn current_session(session: &Arc<Mutex<Option<Session>>>) -> Option<Session> {
    session.lock().expect("session lock poisoned").clone()
}

fn build_fetch_pool() -> Option<rayon::ThreadPool> {
    let threads = fetch_parallelism();
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .ok()
}

fn fetch_parallelism() -> usize {
    env::var("FETCH_PARALLELISM")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(4)
        .clamp(1, 16)
}
