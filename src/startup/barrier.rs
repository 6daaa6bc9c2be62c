//! Two-slot completion rendezvous.
//!
//! Each launch attempt reports exactly one [`Outcome`] for its protocol, in
//! any order. The barrier owns the accumulated state, ignores duplicate
//! reports, and shapes the combined result once both slots are filled. The
//! shaped result does not depend on arrival order.

use crate::config::Protocol;
use crate::listener::{ListenError, ServerHandle};
use crate::startup::{ListenFailure, Servers};
use tracing::warn;

/// What one launch attempt produced.
#[derive(Debug)]
pub(crate) enum Outcome {
    /// The protocol was not requested; no bind was attempted.
    Skipped,
    /// The listener bound and is accepting.
    Started(ServerHandle),
    /// The attempt failed; the other protocol is unaffected.
    Failed(ListenError),
}

/// Accumulator for the two launch attempts.
pub(crate) struct StartupBarrier {
    http: Option<Outcome>,
    https: Option<Outcome>,
}

impl StartupBarrier {
    pub fn new() -> Self {
        Self {
            http: None,
            https: None,
        }
    }

    /// Record one protocol's outcome.
    ///
    /// A second report for the same protocol is ignored; the first one wins.
    /// Returns whether both slots are filled, so the caller treats the first
    /// `true` as the completion edge.
    pub fn report(&mut self, protocol: Protocol, outcome: Outcome) -> bool {
        let slot = match protocol {
            Protocol::Http => &mut self.http,
            Protocol::Https => &mut self.https,
        };

        if slot.is_some() {
            warn!(protocol = %protocol, "duplicate startup report ignored");
        } else {
            *slot = Some(outcome);
        }

        self.is_complete()
    }

    /// Whether both protocols have reported.
    pub fn is_complete(&self) -> bool {
        self.http.is_some() && self.https.is_some()
    }

    /// Shape the combined result.
    ///
    /// Started listeners are collected even when the other protocol failed,
    /// so callers can decide whether a partial success is usable.
    pub fn into_result(self) -> Result<Servers, ListenFailure> {
        let mut servers = Servers::default();
        let mut http = None;
        let mut https = None;

        match self.http {
            Some(Outcome::Started(handle)) => servers.http = Some(handle),
            Some(Outcome::Failed(error)) => http = Some(error),
            Some(Outcome::Skipped) | None => {}
        }
        match self.https {
            Some(Outcome::Started(handle)) => servers.https = Some(handle),
            Some(Outcome::Failed(error)) => https = Some(error),
            Some(Outcome::Skipped) | None => {}
        }

        if http.is_none() && https.is_none() {
            Ok(servers)
        } else {
            Err(ListenFailure {
                http,
                https,
                servers,
            })
        }
    }
}
