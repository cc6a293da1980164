//! Drives Phase 1 (Prepare→Promise) and Phase 2 (Accept) of the Paxos algorithm from
//! one node.
//!
//! `leader` is an unreliable local belief: multiple proposers may simultaneously think
//! themselves the leader. This is by design and must never be made cluster-coherent.

use std::collections::HashSet;

use crate::message::{Accept, Nack, Prepare, Promise};
use crate::proposal_id::ProposalID;

pub struct Proposer<V> {
    network_uid: String,
    quorum_size: usize,

    leader: bool,
    proposal_id: ProposalID,
    highest_proposal_id: ProposalID,
    highest_accepted_id: Option<ProposalID>,
    proposed_value: Option<V>,

    promises_received: HashSet<String>,
    nacks_received: HashSet<String>,

    current_prepare_msg: Option<Prepare>,
    current_accept_msg: Option<Accept<V>>,
}

impl<V: Clone> Proposer<V> {
    pub fn new(network_uid: impl Into<String>, quorum_size: usize) -> Self {
        let network_uid = network_uid.into();
        let zero = ProposalID::zero(network_uid.clone());

        Proposer {
            network_uid,
            quorum_size,
            leader: false,
            proposal_id: zero.clone(),
            highest_proposal_id: zero,
            highest_accepted_id: None,
            proposed_value: None,
            promises_received: HashSet::new(),
            nacks_received: HashSet::new(),
            current_prepare_msg: None,
            current_accept_msg: None,
        }
    }

    pub fn network_uid(&self) -> &str {
        &self.network_uid
    }

    pub fn proposal_id(&self) -> &ProposalID {
        &self.proposal_id
    }

    pub fn is_leader(&self) -> bool {
        self.leader
    }

    /// Sets the value this proposer intends to push, iff it is not already aware of a
    /// value (possibly adopted from a Promise). If this proposer already believes
    /// itself the leader, immediately emits the `Accept` for the current round.
    pub fn propose_value(&mut self, value: V) -> Option<Accept<V>> {
        if self.proposed_value.is_some() {
            return None;
        }

        self.proposed_value = Some(value.clone());
        trace!("[{}] proposed_value set locally", self.network_uid);

        if self.leader {
            let accept = Accept {
                from_uid: self.network_uid.clone(),
                proposal_id: self.proposal_id.clone(),
                proposal_value: value,
            };
            self.current_accept_msg = Some(accept.clone());
            return Some(accept);
        }

        None
    }

    /// Mints a new proposal id strictly higher than any previously observed, clears the
    /// current round's bookkeeping and the (unreliable) leader belief, and returns the
    /// `Prepare` to broadcast to the acceptors. This is the only place new proposal
    /// numbers are minted.
    pub fn prepare(&mut self) -> Prepare {
        self.leader = false;
        self.promises_received.clear();
        self.nacks_received.clear();

        self.proposal_id = ProposalID::new(
            self.highest_proposal_id.number + 1,
            self.network_uid.clone(),
        );
        self.highest_proposal_id = self.proposal_id.clone();

        let prepare = Prepare {
            from_uid: self.network_uid.clone(),
            proposal_id: self.proposal_id.clone(),
        };
        self.current_prepare_msg = Some(prepare.clone());

        if log_enabled!(log::Level::Info) {
            info!("[{}] starting round {:?}", self.network_uid, self.proposal_id);
        }

        prepare
    }

    /// Updates the high-water mark of observed proposal ids. Called automatically for
    /// every received Promise and Nack; a driver co-locating roles may also call this
    /// for any observed message to shortcut a doomed round.
    pub fn observe_proposal(&mut self, proposal_id: &ProposalID) {
        if *proposal_id > self.highest_proposal_id {
            self.highest_proposal_id = proposal_id.clone();
        }
    }

    /// Returns a new `Prepare` (abandoning the current round) once a quorum of Nacks
    /// for the current round has been observed.
    pub fn receive_nack(&mut self, msg: Nack) -> Option<Prepare> {
        self.observe_proposal(&msg.promised_proposal_id);

        if msg.proposal_id == self.proposal_id {
            self.nacks_received.insert(msg.from_uid);

            if self.nacks_received.len() == self.quorum_size {
                if log_enabled!(log::Level::Info) {
                    info!(
                        "[{}] lost round {:?} to a nack quorum, re-preparing",
                        self.network_uid, self.proposal_id
                    );
                }
                return Some(self.prepare());
            }
        }

        None
    }

    /// Folds one more Promise into the current round's tally, applying the value
    /// adoption rule, and returns an `Accept` once a Promise quorum is reached and a
    /// value is available.
    pub fn receive_promise(&mut self, msg: Promise<V>) -> Option<Accept<V>> {
        self.observe_proposal(&msg.proposal_id);

        if self.leader || msg.proposal_id != self.proposal_id
            || self.promises_received.contains(&msg.from_uid)
        {
            return None;
        }

        self.promises_received.insert(msg.from_uid);

        if let Some(last_accepted) = msg.last_accepted {
            if Some(&last_accepted.proposal_id) > self.highest_accepted_id.as_ref() {
                self.highest_accepted_id = Some(last_accepted.proposal_id);
                self.proposed_value = Some(last_accepted.value);
                trace!(
                    "[{}] adopted a previously-accepted value",
                    self.network_uid
                );
            }
        }

        if self.promises_received.len() == self.quorum_size {
            self.leader = true;
            if log_enabled!(log::Level::Info) {
                info!(
                    "[{}] promise quorum reached for {:?}, leader=true",
                    self.network_uid, self.proposal_id
                );
            }

            if let Some(value) = self.proposed_value.clone() {
                let accept = Accept {
                    from_uid: self.network_uid.clone(),
                    proposal_id: self.proposal_id.clone(),
                    proposal_value: value,
                };
                self.current_accept_msg = Some(accept.clone());
                return Some(accept);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal_id::ProposalID;

    fn promise(from: &str, proposal_id: ProposalID) -> Promise<&'static str> {
        Promise {
            from_uid: from.to_string(),
            proposer_uid: "x".to_string(),
            proposal_id,
            last_accepted: None,
        }
    }

    #[test]
    fn prepare_mints_strictly_increasing_ids() {
        let mut p: Proposer<&str> = Proposer::new("x", 2);
        let first = p.prepare();
        let second = p.prepare();
        assert!(second.proposal_id > first.proposal_id);
        assert_eq!(second.proposal_id.uid, "x");
    }

    #[test]
    fn quorum_of_empty_promises_makes_leader_without_emitting_accept() {
        let mut p: Proposer<&str> = Proposer::new("x", 2);
        let prep = p.prepare();

        assert!(p.receive_promise(promise("a", prep.proposal_id.clone())).is_none());
        assert!(!p.is_leader());
        assert!(p.receive_promise(promise("b", prep.proposal_id.clone())).is_none());
        assert!(p.is_leader());
    }

    #[test]
    fn propose_value_emits_accept_once_leader() {
        let mut p: Proposer<&str> = Proposer::new("x", 2);
        let prep = p.prepare();
        p.receive_promise(promise("a", prep.proposal_id.clone()));
        p.receive_promise(promise("b", prep.proposal_id.clone()));

        let accept = p.propose_value("v").expect("should emit Accept once leader");
        assert_eq!(accept.proposal_value, "v");
        assert_eq!(accept.proposal_id, prep.proposal_id);
    }

    #[test]
    fn adoption_rule_overrides_later_propose_value() {
        let mut p: Proposer<&str> = Proposer::new("x", 2);
        let prep = p.prepare();

        let mut with_value = promise("a", prep.proposal_id.clone());
        with_value.last_accepted = Some(crate::message::LastAccepted {
            proposal_id: ProposalID::new(1, "y"),
            value: "old",
        });

        let accept = p.receive_promise(with_value);
        assert!(accept.is_none(), "quorum not reached yet");

        let accept = p
            .receive_promise(promise("b", prep.proposal_id.clone()))
            .expect("quorum reached with an adopted value must emit Accept immediately");
        assert_eq!(accept.proposal_value, "old");

        // A later propose_value call must not override the adopted value.
        assert!(p.propose_value("new").is_none());
    }

    #[test]
    fn nack_quorum_triggers_a_higher_numbered_prepare() {
        let mut p: Proposer<&str> = Proposer::new("x", 2);
        p.prepare();
        p.observe_proposal(&ProposalID::new(5, "z"));

        let nack = Nack {
            from_uid: "a".to_string(),
            proposer_uid: "x".to_string(),
            proposal_id: p.proposal_id().clone(),
            promised_proposal_id: ProposalID::new(5, "z"),
        };
        assert!(p.receive_nack(nack.clone()).is_none());

        let mut second_nack = nack;
        second_nack.from_uid = "b".to_string();
        let new_prepare = p
            .receive_nack(second_nack)
            .expect("nack quorum must re-prepare");

        assert!(new_prepare.proposal_id.number > 5);
        assert_eq!(new_prepare.proposal_id.uid, "x");
    }

    #[test]
    fn duplicate_promise_from_same_acceptor_is_ignored() {
        let mut p: Proposer<&str> = Proposer::new("x", 2);
        let prep = p.prepare();
        p.receive_promise(promise("a", prep.proposal_id.clone()));
        assert!(p.receive_promise(promise("a", prep.proposal_id.clone())).is_none());
        assert!(!p.is_leader());
    }
}
