//! Simulates a single Paxos decree in-process: three acceptors, one proposer, and one
//! learner, wired together with plain in-memory message passing instead of the sockets
//! the original multi-node version of this example used. The core never does its own
//! I/O, so a driver this simple is enough to exercise it end to end.
//!
//! Run this example as follows
//!     RUST_LOG=paxos_core=info cargo run --example simulate

extern crate env_logger;
#[macro_use]
extern crate log;
extern crate paxos_core;
extern crate uuid;

use paxos_core::message::{AcceptedOrNack, PromiseOrNack};
use paxos_core::PaxosInstance;
use uuid::Uuid;

fn main() {
    env_logger::init();
    simulate();
}

fn mint_uid(role: &str) -> String {
    format!("{}-{}", role, Uuid::new_v4())
}

fn simulate() {
    let quorum_size = 2;

    let acceptor_ids: Vec<String> = (0..3).map(|_| mint_uid("acceptor")).collect();
    let mut acceptors: Vec<PaxosInstance<u32>> = acceptor_ids
        .iter()
        .map(|uid| PaxosInstance::new(uid.clone(), quorum_size, None, None, None))
        .collect();

    let proposer_uid = mint_uid("proposer");
    let mut proposer: PaxosInstance<u32> =
        PaxosInstance::new(proposer_uid.clone(), quorum_size, None, None, None);
    let mut learner: PaxosInstance<u32> =
        PaxosInstance::new(mint_uid("learner"), quorum_size, None, None, None);

    info!("proposer {} preparing a round", proposer_uid);
    let prepare = proposer.prepare();

    let mut accept = None;
    for acceptor in acceptors.iter_mut() {
        match acceptor.receive_prepare(prepare.clone()) {
            PromiseOrNack::Promise(promise) => {
                if let Some(a) = proposer.receive_promise(promise) {
                    accept = Some(a);
                }
            }
            PromiseOrNack::Nack(nack) => {
                if let Some(new_prepare) = proposer.receive_nack(nack) {
                    info!("re-prepared as {:?}", new_prepare.proposal_id);
                }
            }
        }
    }

    // Quorum may be reached without any acceptor having offered a previously-accepted
    // value, in which case the proposer still needs an explicit value to propose.
    let accept = accept.unwrap_or_else(|| {
        proposer
            .propose_value(7)
            .expect("proposer must be leader by now")
    });

    info!("proposer {} sending Accept({:?})", proposer_uid, accept.proposal_id);

    for acceptor in acceptors.iter_mut() {
        if let AcceptedOrNack::Accepted(accepted) = acceptor.receive_accept(accept.clone()) {
            if let Some(resolution) = learner.receive_accepted(accepted) {
                info!("learner resolved value {}", resolution.value);
            }
        }
    }
}
