//! The six message variants exchanged between Paxos roles.
//!
//! Each variant is its own struct (mirroring this codebase's established per-phase
//! message convention) so that a role's `receive_*` methods can be typed to accept only
//! the variant they understand, rather than matching on a catch-all enum and panicking
//! on the rest.

use crate::proposal_id::ProposalID;

/// The proposal id and value an acceptor last voted for, carried by a `Promise`.
///
/// Modeled as a single optional pair rather than two independently optional fields
/// (`last_accepted_id: Option<ProposalID>`, `last_accepted_value: Option<V>`) so that an
/// id can never be present without its value, or vice versa.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LastAccepted<V> {
    pub proposal_id: ProposalID,
    pub value: V,
}

/// Broadcast from a proposer to all acceptors to open a round.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Prepare {
    pub from_uid: String,
    pub proposal_id: ProposalID,
}

/// An acceptor's pledge not to accept proposals with ids lower than `proposal_id`, sent
/// back to `proposer_uid`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Promise<V> {
    pub from_uid: String,
    pub proposer_uid: String,
    pub proposal_id: ProposalID,
    pub last_accepted: Option<LastAccepted<V>>,
}

/// Sent in response to a stale Prepare or Accept, in place of a Promise/Accepted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Nack {
    pub from_uid: String,
    pub proposer_uid: String,
    pub proposal_id: ProposalID,
    pub promised_proposal_id: ProposalID,
}

/// Broadcast from a proposer to all acceptors once a Promise quorum is assembled.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Accept<V> {
    pub from_uid: String,
    pub proposal_id: ProposalID,
    pub proposal_value: V,
}

/// Sent from an acceptor to all learners once it accepts a proposal.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Accepted<V> {
    pub from_uid: String,
    pub proposal_id: ProposalID,
    pub proposal_value: V,
}

/// A learner's declaration that a value has been chosen by quorum.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Resolution<V> {
    pub from_uid: String,
    pub value: V,
}

/// A reply an acceptor gives to a `Prepare`.
#[derive(Debug, Clone, PartialEq)]
pub enum PromiseOrNack<V> {
    Promise(Promise<V>),
    Nack(Nack),
}

/// A reply an acceptor gives to an `Accept`.
#[derive(Debug, Clone, PartialEq)]
pub enum AcceptedOrNack<V> {
    Accepted(Accepted<V>),
    Nack(Nack),
}

/// The tagged union of every message a Paxos role can send or receive.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Message<V> {
    Prepare(Prepare),
    Promise(Promise<V>),
    Nack(Nack),
    Accept(Accept<V>),
    Accepted(Accepted<V>),
    Resolution(Resolution<V>),
}

impl<V> Message<V> {
    /// The network identity of whoever produced this message.
    pub fn from_uid(&self) -> &str {
        match self {
            Message::Prepare(m) => &m.from_uid,
            Message::Promise(m) => &m.from_uid,
            Message::Nack(m) => &m.from_uid,
            Message::Accept(m) => &m.from_uid,
            Message::Accepted(m) => &m.from_uid,
            Message::Resolution(m) => &m.from_uid,
        }
    }

    /// A short tag used for logging and for `PaxosError::InvalidMessageKind`.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Prepare(_) => "Prepare",
            Message::Promise(_) => "Promise",
            Message::Nack(_) => "Nack",
            Message::Accept(_) => "Accept",
            Message::Accepted(_) => "Accepted",
            Message::Resolution(_) => "Resolution",
        }
    }
}

impl<V> From<PromiseOrNack<V>> for Message<V> {
    fn from(reply: PromiseOrNack<V>) -> Self {
        match reply {
            PromiseOrNack::Promise(m) => Message::Promise(m),
            PromiseOrNack::Nack(m) => Message::Nack(m),
        }
    }
}

impl<V> From<AcceptedOrNack<V>> for Message<V> {
    fn from(reply: AcceptedOrNack<V>) -> Self {
        match reply {
            AcceptedOrNack::Accepted(m) => Message::Accepted(m),
            AcceptedOrNack::Nack(m) => Message::Nack(m),
        }
    }
}
