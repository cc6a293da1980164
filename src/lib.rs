//! A pure, event-driven implementation of the classical single-decree Paxos state
//! machines: `Proposer`, `Acceptor`, `Learner`, and the `PaxosInstance` aggregate that
//! co-locates one of each at a single node.
//!
//! The core never touches I/O, the clock, or the network. Every operation is a total
//! function from (current state, input message) to (new state, optional output
//! message); driving it — transport, durable storage, timers, leader election — is the
//! caller's responsibility.

#[macro_use]
extern crate log;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate thiserror;

pub mod acceptor;
pub mod error;
pub mod instance;
pub mod learner;
pub mod message;
pub mod paxos_config;
pub mod proposal_id;
pub mod proposer;

pub use acceptor::Acceptor;
pub use error::PaxosError;
pub use paxos_config::PaxosConfig;
pub use instance::PaxosInstance;
pub use learner::Learner;
pub use proposal_id::ProposalID;
pub use proposer::Proposer;
