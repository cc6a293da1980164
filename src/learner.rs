//! Tallies `Accepted` messages and declares a `Resolution` once a quorum of acceptors
//! has voted for the same proposal.

use std::collections::{HashMap, HashSet};

use crate::message::{Accepted, Resolution};
use crate::proposal_id::ProposalID;

/// Per-proposal-id bookkeeping while a decree is still undecided.
///
/// `accept_count` monotonically counts how many distinct acceptors have ever voted for
/// this proposal id; `retain_count` counts how many still currently vote for it (an
/// acceptor can later re-vote for a higher id, which decrements this but never
/// `accept_count`). Resolution triggers on `accept_count == quorum_size`, because a
/// Paxos quorum, once assembled, cannot be un-assembled by later messages.
struct ProposalStatus<V> {
    accept_count: usize,
    retain_count: usize,
    acceptors: HashSet<String>,
    value: V,
}

pub struct Learner<V> {
    network_uid: String,
    quorum_size: usize,

    proposals: Option<HashMap<ProposalID, ProposalStatus<V>>>,
    acceptors: Option<HashMap<String, ProposalID>>,

    final_proposal_id: Option<ProposalID>,
    final_value: Option<V>,
    final_acceptors: Option<HashSet<String>>,
}

impl<V: Clone + PartialEq> Learner<V> {
    pub fn new(network_uid: impl Into<String>, quorum_size: usize) -> Self {
        Learner {
            network_uid: network_uid.into(),
            quorum_size,
            proposals: Some(HashMap::new()),
            acceptors: Some(HashMap::new()),
            final_proposal_id: None,
            final_value: None,
            final_acceptors: None,
        }
    }

    pub fn final_value(&self) -> Option<&V> {
        self.final_value.as_ref()
    }

    pub fn final_acceptors(&self) -> Option<&HashSet<String>> {
        self.final_acceptors.as_ref()
    }

    pub fn receive_accepted(&mut self, msg: Accepted<V>) -> Option<Resolution<V>> {
        if self.final_value.is_some() {
            return Some(self.augment_post_resolution(msg));
        }

        let acceptors = self.acceptors.as_mut().expect("learner state released twice");
        let last_pn = acceptors.get(&msg.from_uid).cloned();

        // Absence of a prior record is explicitly "not stale", even though the stale
        // check below is phrased as `<=`.
        if let Some(ref last_pn) = last_pn {
            if msg.proposal_id <= *last_pn {
                trace!(
                    "[{}] dropping stale Accepted from {}",
                    self.network_uid, msg.from_uid
                );
                return None;
            }
        }

        acceptors.insert(msg.from_uid.clone(), msg.proposal_id.clone());

        let proposals = self.proposals.as_mut().expect("learner state released twice");

        if let Some(ref prior_pn) = last_pn {
            if let Some(prior_status) = proposals.get_mut(prior_pn) {
                prior_status.retain_count -= 1;
                prior_status.acceptors.remove(&msg.from_uid);
                if prior_status.retain_count == 0 {
                    proposals.remove(prior_pn);
                }
            }
        }

        let status = proposals
            .entry(msg.proposal_id.clone())
            .or_insert_with(|| ProposalStatus {
                accept_count: 0,
                retain_count: 0,
                acceptors: HashSet::new(),
                value: msg.proposal_value.clone(),
            });

        assert!(
            msg.proposal_value == status.value,
            "value mismatch for a single proposal id: a safety violation upstream"
        );

        status.accept_count += 1;
        status.retain_count += 1;
        status.acceptors.insert(msg.from_uid.clone());

        if status.accept_count == self.quorum_size {
            let status = proposals
                .remove(&msg.proposal_id)
                .expect("just inserted above");

            self.final_proposal_id = Some(msg.proposal_id.clone());
            self.final_value = Some(status.value.clone());
            self.final_acceptors = Some(status.acceptors);

            // Once resolved, the pre-resolution tallies are no longer needed.
            self.proposals = None;
            self.acceptors = None;

            if log_enabled!(log::Level::Info) {
                info!("[{}] resolved a value at {:?}", self.network_uid, msg.proposal_id);
            }

            return Some(Resolution {
                from_uid: self.network_uid.clone(),
                value: status.value,
            });
        }

        None
    }

    fn augment_post_resolution(&mut self, msg: Accepted<V>) -> Resolution<V> {
        let final_proposal_id = self
            .final_proposal_id
            .as_ref()
            .expect("final_proposal_id set alongside final_value");
        let final_value = self.final_value.as_ref().expect("checked by caller");

        if &msg.proposal_id >= final_proposal_id && &msg.proposal_value == final_value {
            self.final_acceptors
                .as_mut()
                .expect("final_acceptors set alongside final_value")
                .insert(msg.from_uid);
        }

        Resolution {
            from_uid: self.network_uid.clone(),
            value: self.final_value.clone().unwrap(),
        }
    }
}
