//! Composes one `Proposer`, one `Acceptor` and one `Learner` sharing a `network_uid`
//! and `quorum_size` into a single co-located node for one decree.

use crate::acceptor::Acceptor;
use crate::error::PaxosError;
use crate::learner::Learner;
use crate::message::{Accept, AcceptedOrNack, Message, Nack, Prepare, PromiseOrNack};
use crate::message::{Accepted, Promise, Resolution};
use crate::proposal_id::ProposalID;
use crate::proposer::Proposer;
use crate::paxos_config::PaxosConfig;

pub struct PaxosInstance<V> {
    proposer: Proposer<V>,
    acceptor: Acceptor<V>,
    learner: Learner<V>,
}

impl<V: Clone + PartialEq> PaxosInstance<V> {
    pub fn new(
        network_uid: impl Into<String>,
        quorum_size: usize,
        promised_id: Option<ProposalID>,
        accepted_id: Option<ProposalID>,
        accepted_value: Option<V>,
    ) -> Self {
        let network_uid = network_uid.into();

        PaxosInstance {
            proposer: Proposer::new(network_uid.clone(), quorum_size),
            acceptor: Acceptor::rehydrate(
                network_uid.clone(),
                promised_id,
                accepted_id,
                accepted_value,
            ),
            learner: Learner::new(network_uid, quorum_size),
        }
    }

    /// Builds a fresh (non-rehydrated) instance from a `PaxosConfig`.
    pub fn from_config(config: &PaxosConfig) -> Self {
        PaxosInstance::new(config.network_uid.clone(), config.quorum_size, None, None, None)
    }

    // -- Proposer-side driver calls -----------------------------------------------

    pub fn prepare(&mut self) -> Prepare {
        self.proposer.prepare()
    }

    pub fn propose_value(&mut self, value: V) -> Option<Accept<V>> {
        self.proposer.propose_value(value)
    }

    pub fn observe_proposal(&mut self, proposal_id: &ProposalID) {
        self.proposer.observe_proposal(proposal_id);
    }

    // -- Per-variant inbound delivery, in the co-located shape of §4.5 -------------
    //
    // The acceptor's handlers first feed the observed proposal id back to the
    // proposer, exploiting co-location to keep `highest_proposal_id` fresh without an
    // extra network hop.

    pub fn receive_prepare(&mut self, msg: Prepare) -> PromiseOrNack<V> {
        self.proposer.observe_proposal(&msg.proposal_id);
        self.acceptor.receive_prepare(msg)
    }

    pub fn receive_accept(&mut self, msg: Accept<V>) -> AcceptedOrNack<V> {
        self.proposer.observe_proposal(&msg.proposal_id);
        self.acceptor.receive_accept(msg)
    }

    pub fn receive_promise(&mut self, msg: Promise<V>) -> Option<Accept<V>> {
        self.proposer.receive_promise(msg)
    }

    pub fn receive_nack(&mut self, msg: Nack) -> Option<Prepare> {
        self.proposer.receive_nack(msg)
    }

    pub fn receive_accepted(&mut self, msg: Accepted<V>) -> Option<Resolution<V>> {
        self.learner.receive_accepted(msg)
    }

    /// Routes an inbound `Message` to the role that handles it. A `Resolution` arriving
    /// inbound is a programmer error: no role consumes it, it is only ever produced.
    pub fn receive(&mut self, msg: Message<V>) -> Result<Option<Message<V>>, PaxosError> {
        if log_enabled!(log::Level::Trace) {
            trace!("dispatching {} from {}", msg.kind(), msg.from_uid());
        }

        match msg {
            Message::Prepare(m) => Ok(Some(self.receive_prepare(m).into())),
            Message::Accept(m) => Ok(Some(self.receive_accept(m).into())),
            Message::Promise(m) => Ok(self.receive_promise(m).map(Message::Accept)),
            Message::Nack(m) => Ok(self.receive_nack(m).map(Message::Prepare)),
            Message::Accepted(m) => Ok(self.receive_accepted(m).map(Message::Resolution)),
            Message::Resolution(m) => {
                let err = PaxosError::InvalidMessageKind {
                    role: "PaxosInstance",
                    kind: "Resolution",
                };
                error!("{}: {}", err, m.from_uid);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::PromiseOrNack;
    use std::collections::HashMap;

    /// Routes a message to its addressee by `from_uid`/`proposer_uid` across a fixed
    /// set of in-process nodes, standing in for a real transport in these tests.
    struct Cluster {
        acceptors: HashMap<String, PaxosInstance<&'static str>>,
        proposers: HashMap<String, PaxosInstance<&'static str>>,
        learners: HashMap<String, PaxosInstance<&'static str>>,
    }

    impl Cluster {
        fn new(acceptor_ids: &[&str], proposer_ids: &[&str], quorum: usize) -> Self {
            let mut acceptors = HashMap::new();
            for id in acceptor_ids {
                acceptors.insert(id.to_string(), PaxosInstance::new(*id, quorum, None, None, None));
            }
            let mut proposers = HashMap::new();
            let mut learners = HashMap::new();
            for id in proposer_ids {
                proposers.insert(id.to_string(), PaxosInstance::new(*id, quorum, None, None, None));
                learners.insert(id.to_string(), PaxosInstance::new(*id, quorum, None, None, None));
            }
            Cluster { acceptors, proposers, learners }
        }

        fn broadcast_prepare(&mut self, prepare: Prepare) -> Vec<PromiseOrNack<&'static str>> {
            self.acceptors
                .values_mut()
                .map(|a| a.receive_prepare(prepare.clone()))
                .collect()
        }

        fn broadcast_accept(&mut self, accept: Accept<&'static str>) -> Vec<Accepted<&'static str>> {
            self.acceptors
                .values_mut()
                .filter_map(|a| match a.receive_accept(accept.clone()) {
                    AcceptedOrNack::Accepted(m) => Some(m),
                    AcceptedOrNack::Nack(_) => None,
                })
                .collect()
        }
    }

    #[test]
    fn clean_run_resolves_at_every_learner() {
        let mut cluster = Cluster::new(&["a", "b", "c"], &["x"], 2);

        let prepare = cluster.proposers.get_mut("x").unwrap().prepare();
        let promises = cluster.broadcast_prepare(prepare);

        let proposer = cluster.proposers.get_mut("x").unwrap();
        let mut accept = None;
        for reply in promises {
            if let PromiseOrNack::Promise(p) = reply {
                if let Some(a) = proposer.receive_promise(p) {
                    accept = Some(a);
                }
            }
        }
        let accept = accept.unwrap_or_else(|| proposer.propose_value("v").unwrap());
        assert_eq!(accept.proposal_value, "v");

        let accepteds = cluster.broadcast_accept(accept);
        assert_eq!(accepteds.len(), 3);

        let learner = cluster.learners.get_mut("x").unwrap();
        let mut resolution = None;
        for a in accepteds {
            if let Some(r) = learner.receive_accepted(a) {
                resolution = Some(r);
            }
        }
        assert_eq!(resolution.unwrap().value, "v");
    }

    #[test]
    fn receiving_a_resolution_is_an_invalid_message_kind() {
        let mut instance: PaxosInstance<&str> = PaxosInstance::new("x", 2, None, None, None);
        let result = instance.receive(Message::Resolution(Resolution {
            from_uid: "z".to_string(),
            value: "v",
        }));
        assert!(matches!(result, Err(PaxosError::InvalidMessageKind { .. })));
    }

    #[test]
    fn two_competing_proposers_never_disagree() {
        let mut cluster = Cluster::new(&["a", "b", "c"], &["x", "y"], 2);

        // X starts a round and gathers enough promises to believe it can lead.
        let prepare_x = cluster.proposers.get_mut("x").unwrap().prepare();
        let promises_x = cluster.broadcast_prepare(prepare_x);

        let proposer_x = cluster.proposers.get_mut("x").unwrap();
        let mut accept_x = None;
        for reply in promises_x {
            if let PromiseOrNack::Promise(p) = reply {
                if let Some(a) = proposer_x.receive_promise(p) {
                    accept_x = Some(a);
                }
            }
        }
        let accept_x = accept_x.unwrap_or_else(|| proposer_x.propose_value("v_x").unwrap());

        // Y's round overlaps X's: same acceptors, proposal numbers that tie and are
        // broken by uid ("y" > "x"), so every acceptor now favors Y before X's Accept
        // arrives.
        let prepare_y = cluster.proposers.get_mut("y").unwrap().prepare();
        let promises_y = cluster.broadcast_prepare(prepare_y);

        let proposer_y = cluster.proposers.get_mut("y").unwrap();
        let mut accept_y = None;
        for reply in promises_y {
            if let PromiseOrNack::Promise(p) = reply {
                if let Some(a) = proposer_y.receive_promise(p) {
                    accept_y = Some(a);
                }
            }
        }
        let accept_y = accept_y.unwrap_or_else(|| proposer_y.propose_value("v_y").unwrap());

        // X's Accept is now stale everywhere: every acceptor already promised Y's round.
        let accepteds_x = cluster.broadcast_accept(accept_x);
        assert!(accepteds_x.is_empty(), "a stale Accept must never be accepted");

        let accepteds_y = cluster.broadcast_accept(accept_y);
        assert_eq!(accepteds_y.len(), 3);

        // Every learner observes every Accepted that was actually produced, as a
        // broadcast transport would deliver to all learners regardless of which
        // proposer they are co-located with.
        let mut resolved = Vec::new();
        for learner in cluster.learners.values_mut() {
            for a in accepteds_x.iter().chain(accepteds_y.iter()) {
                if let Some(r) = learner.receive_accepted(a.clone()) {
                    resolved.push(r.value);
                }
            }
        }

        assert!(!resolved.is_empty(), "the quorum on y's round must resolve somewhere");
        assert!(
            resolved.iter().all(|v| *v == "v_y"),
            "every learner that resolves must agree on the same value"
        );
    }

    #[test]
    fn co_located_acceptor_feeds_the_proposers_high_water_mark() {
        let mut instance: PaxosInstance<&str> = PaxosInstance::new("x", 2, None, None, None);
        instance.receive_prepare(Prepare {
            from_uid: "other".to_string(),
            proposal_id: ProposalID::new(9, "other"),
        });

        let prep = instance.prepare();
        assert!(prep.proposal_id.number > 9);
    }
}
