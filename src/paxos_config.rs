//! A module that contains functions required to read, parse and return the
//! construction-time configuration of a `PaxosInstance` from a `Config.toml`-shaped
//! file, so that a driver can keep a node's identity and quorum size alongside the
//! rest of its configuration instead of hand-assembling them inline.

use config::{Config, File};

/// The two values needed to construct a `Proposer`/`Learner`: this node's network
/// identity and the quorum size of the cluster it participates in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaxosConfig {
    pub network_uid: String,
    pub quorum_size: usize,
}

impl PaxosConfig {
    pub fn new(network_uid: impl Into<String>, quorum_size: usize) -> Self {
        assert!(quorum_size >= 1, "quorum_size must be at least 1");
        PaxosConfig {
            network_uid: network_uid.into(),
            quorum_size,
        }
    }

    /// Reads and parses `file_name` (without extension, per the `config` crate's
    /// `File::with_name` convention) into a `PaxosConfig`.
    pub fn from_file(file_name: &str) -> Self {
        let mut c = Config::default();
        c.merge(File::with_name(file_name)).expect("Could not read configuration file");
        let parsed: PaxosConfig = c.try_into().expect("Could not parse PaxosConfig");
        assert!(parsed.quorum_size >= 1, "quorum_size must be at least 1");
        parsed
    }
}
