//! Durable memory for the Paxos algorithm. Responds to `Prepare` and `Accept` with
//! `Promise`/`Accepted` or `Nack`.
//!
//! The durability discipline ("persist, then reply": §5 of the specification) is a
//! precondition on the caller, not something this type can enforce — the core never
//! performs I/O. A driver must flush `promised_id`/`accepted_id`/`accepted_value` to
//! stable media before transmitting the message this type returns.

use crate::message::{Accept, AcceptedOrNack, Nack, Prepare, PromiseOrNack};
use crate::message::{Accepted, LastAccepted, Promise};
use crate::proposal_id::ProposalID;

pub struct Acceptor<V> {
    network_uid: String,
    promised_id: Option<ProposalID>,
    accepted_id: Option<ProposalID>,
    accepted_value: Option<V>,
}

impl<V: Clone> Acceptor<V> {
    pub fn new(network_uid: impl Into<String>) -> Self {
        Acceptor {
            network_uid: network_uid.into(),
            promised_id: None,
            accepted_id: None,
            accepted_value: None,
        }
    }

    /// Rehydrates an acceptor's durable state after a restart.
    pub fn rehydrate(
        network_uid: impl Into<String>,
        promised_id: Option<ProposalID>,
        accepted_id: Option<ProposalID>,
        accepted_value: Option<V>,
    ) -> Self {
        Acceptor {
            network_uid: network_uid.into(),
            promised_id,
            accepted_id,
            accepted_value,
        }
    }

    pub fn promised_id(&self) -> Option<&ProposalID> {
        self.promised_id.as_ref()
    }

    pub fn accepted_id(&self) -> Option<&ProposalID> {
        self.accepted_id.as_ref()
    }

    pub fn accepted_value(&self) -> Option<&V> {
        self.accepted_value.as_ref()
    }

    /// Treats an absent `promised_id` as `-∞`: any proposal id is admissible the first
    /// time an acceptor is asked anything.
    fn can_promise(&self, proposal_id: &ProposalID) -> bool {
        self.promised_id.as_ref().map_or(true, |p| proposal_id >= p)
    }

    pub fn receive_prepare(&mut self, msg: Prepare) -> PromiseOrNack<V> {
        if self.can_promise(&msg.proposal_id) {
            self.promised_id = Some(msg.proposal_id.clone());

            let last_accepted = match (&self.accepted_id, &self.accepted_value) {
                (Some(id), Some(value)) => Some(LastAccepted {
                    proposal_id: id.clone(),
                    value: value.clone(),
                }),
                _ => None,
            };

            if log_enabled!(log::Level::Debug) {
                debug!(
                    "[{}] promised {:?} to {}",
                    self.network_uid, msg.proposal_id, msg.from_uid
                );
            }

            PromiseOrNack::Promise(Promise {
                from_uid: self.network_uid.clone(),
                proposer_uid: msg.from_uid,
                proposal_id: self.promised_id.clone().unwrap(),
                last_accepted,
            })
        } else {
            self.nack(msg.from_uid, msg.proposal_id)
        }
    }

    pub fn receive_accept(&mut self, msg: Accept<V>) -> AcceptedOrNack<V> {
        if self.can_promise(&msg.proposal_id) {
            self.promised_id = Some(msg.proposal_id.clone());
            self.accepted_id = Some(msg.proposal_id.clone());
            self.accepted_value = Some(msg.proposal_value.clone());

            if log_enabled!(log::Level::Debug) {
                debug!("[{}] accepted {:?}", self.network_uid, msg.proposal_id);
            }

            AcceptedOrNack::Accepted(Accepted {
                from_uid: self.network_uid.clone(),
                proposal_id: msg.proposal_id,
                proposal_value: msg.proposal_value,
            })
        } else {
            match self.nack(msg.from_uid, msg.proposal_id) {
                PromiseOrNack::Nack(n) => AcceptedOrNack::Nack(n),
                PromiseOrNack::Promise(_) => unreachable!("nack() never returns a Promise"),
            }
        }
    }

    fn nack(&self, from_uid: String, proposal_id: ProposalID) -> PromiseOrNack<V> {
        trace!("[{}] nacking stale proposal {:?}", self.network_uid, proposal_id);
        PromiseOrNack::Nack(Nack {
            from_uid: self.network_uid.clone(),
            proposer_uid: from_uid,
            proposal_id,
            promised_proposal_id: self.promised_id.clone().unwrap(),
        })
    }
}
