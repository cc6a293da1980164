//! The error taxonomy for the Paxos core.
//!
//! Stale and duplicate messages are not errors: they are expected outcomes of an
//! unreliable transport and are handled by silently ignoring the message (see the
//! `receive_*` methods on `Proposer`/`Learner`). Value divergence for a single proposal
//! id is an assertion-grade safety violation and is modeled as a `panic!`, not a
//! `Result`, because no driver can meaningfully recover from a torn invariant. The only
//! thing this enum models is a genuine programmer error: delivering a message variant
//! that the receiving role does not handle.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaxosError {
    #[error("{role} does not handle messages of kind {kind}")]
    InvalidMessageKind { role: &'static str, kind: &'static str },
}
