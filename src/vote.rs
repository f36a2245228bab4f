//! Majority vote for disruptive playback actions (skip, seek, clear).
//!
//! With at most one listener the gate approves immediately. Otherwise the
//! initiator counts as the first approval and ballots are collected until one
//! side reaches `ceil(listeners / 2)` or the round deadline passes.

use serde::Serialize;
use serenity::model::id::UserId;
use std::{collections::HashSet, fmt, time::Duration};
use tokio::{sync::mpsc, time::Instant};
use tracing::{debug, info};

/// Voto de un oyente
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ballot {
    pub voter: UserId,
    pub approve: bool,
}

impl Ballot {
    pub fn approve(voter: UserId) -> Self {
        Self { voter, approve: true }
    }

    pub fn disapprove(voter: UserId) -> Self {
        Self { voter, approve: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    pub approvals: usize,
    pub disapprovals: usize,
    pub required: usize,
}

/// Resultado de una votación; nunca es un error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VoteOutcome {
    Approved(VoteTally),
    Rejected(VoteTally),
    TimedOut(VoteTally),
}

impl VoteOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, VoteOutcome::Approved(_))
    }

    pub fn tally(&self) -> VoteTally {
        match self {
            VoteOutcome::Approved(tally) | VoteOutcome::Rejected(tally) | VoteOutcome::TimedOut(tally) => *tally,
        }
    }

    /// Mensaje para el usuario
    pub fn message(&self, action: &str) -> String {
        match self {
            VoteOutcome::Approved(_) => format!("Vote passed, {} approved", action),
            VoteOutcome::Rejected(t) => format!(
                "Not enough votes to {} ({} for, {} against)",
                action, t.approvals, t.disapprovals
            ),
            VoteOutcome::TimedOut(t) => format!(
                "Vote to {} timed out ({}/{} votes)",
                action, t.approvals, t.required
            ),
        }
    }
}

impl fmt::Display for VoteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.tally();
        let label = match self {
            VoteOutcome::Approved(_) => "approved",
            VoteOutcome::Rejected(_) => "rejected",
            VoteOutcome::TimedOut(_) => "timed out",
        };
        write!(f, "{} ({}+ / {}-, {} required)", label, t.approvals, t.disapprovals, t.required)
    }
}

#[derive(Debug, Clone)]
pub struct VoteGate {
    listener_count: usize,
    round_timeout: Duration,
}

impl VoteGate {
    pub fn new(listener_count: usize, round_timeout: Duration) -> Self {
        Self {
            listener_count,
            round_timeout,
        }
    }

    /// Votos necesarios para que un lado gane
    pub fn required(&self) -> usize {
        self.listener_count.div_ceil(2).max(1)
    }

    pub fn round_timeout(&self) -> Duration {
        self.round_timeout
    }

    /// `true` cuando no hace falta votar
    pub fn is_bypassed(&self) -> bool {
        self.listener_count <= 1
    }

    /// Corre la votación para `action`.
    ///
    /// Cada oyente vota una sola vez (el iniciador ya cuenta como aprobación);
    /// los votos repetidos se ignoran. La ronda tiene un plazo fijo desde que
    /// empieza; al vencer, o si el canal se cierra, cuenta como timeout.
    pub async fn start(&self, action: &str, initiator: UserId, ballots: &mut mpsc::Receiver<Ballot>) -> VoteOutcome {
        let required = self.required();
        let mut tally = VoteTally {
            approvals: 1,
            disapprovals: 0,
            required,
        };

        if self.is_bypassed() {
            debug!("Votación para {} omitida: un solo oyente", action);
            return VoteOutcome::Approved(tally);
        }

        info!("🗳️ Votación para {} iniciada por {} ({} votos necesarios)", action, initiator, required);
        let mut voters = HashSet::from([initiator]);
        let deadline = Instant::now() + self.round_timeout;

        loop {
            if tally.approvals >= required || tally.disapprovals >= required {
                let outcome = if tally.approvals > tally.disapprovals {
                    VoteOutcome::Approved(tally)
                } else {
                    VoteOutcome::Rejected(tally)
                };
                info!("🗳️ Votación para {}: {}", action, outcome);
                return outcome;
            }

            let ballot = match tokio::time::timeout_at(deadline, ballots.recv()).await {
                Ok(Some(ballot)) => ballot,
                Ok(None) | Err(_) => {
                    let outcome = VoteOutcome::TimedOut(tally);
                    info!("⏰ Votación para {}: {}", action, outcome);
                    return outcome;
                }
            };

            if !voters.insert(ballot.voter) {
                debug!("Voto repetido de {} ignorado", ballot.voter);
                continue;
            }

            if ballot.approve {
                tally.approvals += 1;
            } else {
                tally.disapprovals += 1;
            }
        }
    }
}
