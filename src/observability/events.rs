//! Observable events for heliosdb
//!
//! Every log line emitted by the state-machine layer carries one of these
//! names in its `event` field, so operators can grep for lifecycle
//! transitions without parsing free-form messages.

use std::fmt;

/// Observable events in heliosdb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Node startup begins
    BootStart,
    /// Node startup complete, ready to serve
    BootComplete,
    /// Shutdown initiated
    ShutdownStart,
    /// Shutdown complete
    ShutdownComplete,

    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // WAL operations
    /// WAL record appended and fsynced
    WalAppend,
    /// Torn trailing record discarded on open
    WalTornTail,
    /// WAL corruption detected (FATAL)
    WalCorruption,

    // Recovery operations
    /// WAL replay begins
    ReplayBegin,
    /// WAL replay complete
    ReplayComplete,

    // State machine
    /// Committed entry applied to the store
    FsmApply,
    /// Transaction commit rejected by version validation
    TxConflict,
    /// Entry with an unknown op skipped
    UnrecognizedOp,
    /// Apply failed in a way the node cannot survive (FATAL)
    FsmHalt,

    // Cluster
    /// Voter added to the cluster configuration
    VoterAdded,
    /// Write rejected because this node is not the leader
    NotLeader,

    // Server operations
    /// Node serving (ready for requests)
    Serving,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "HELIOS_STARTUP_BEGIN",
            Event::BootComplete => "HELIOS_STARTUP_COMPLETE",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::WalAppend => "WAL_APPEND",
            Event::WalTornTail => "WAL_TORN_TAIL",
            Event::WalCorruption => "WAL_CORRUPTION",

            Event::ReplayBegin => "WAL_REPLAY_BEGIN",
            Event::ReplayComplete => "WAL_REPLAY_COMPLETE",

            Event::FsmApply => "FSM_APPLY",
            Event::TxConflict => "TX_CONFLICT",
            Event::UnrecognizedOp => "FSM_UNRECOGNIZED_OP",
            Event::FsmHalt => "FSM_HALT",

            Event::VoterAdded => "VOTER_ADDED",
            Event::NotLeader => "NOT_LEADER",

            Event::Serving => "HELIOS_SERVING",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::WalCorruption | Event::FsmHalt)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
