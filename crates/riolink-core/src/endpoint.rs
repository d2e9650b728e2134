//! Robot endpoint derivation from a team number
//!
//! A team number maps to a fixed set of candidate hosts. The static radio
//! address splits the team into `10.TE.AM.2`, which is why the highest valid
//! team is 25599 (`10.255.99.2`).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest valid team number
pub const MIN_TEAM_NUMBER: u16 = 1;

/// Highest valid team number
pub const MAX_TEAM_NUMBER: u16 = 25599;

/// Primary robot port used for the reachability probe
pub const DEFAULT_PRIMARY_PORT: u16 = 1741;

/// Port tried when every candidate refused the primary port
pub const DEFAULT_FALLBACK_PORT: u16 = 9999;

/// Address the roboRIO takes on its USB interface
pub const USB_HOST: &str = "172.22.11.2";

/// Error deriving an endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// Team number outside 1..=25599
    #[error("team number {team} is outside {MIN_TEAM_NUMBER}..={MAX_TEAM_NUMBER}")]
    OutOfRange { team: u32 },

    /// Input was not a number at all
    #[error("'{input}' is not a team number")]
    NotANumber { input: String },
}

/// A validated team number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TeamNumber(u16);

impl TeamNumber {
    /// Validate a raw team number
    pub fn new(team: u32) -> Result<Self, EndpointError> {
        if (MIN_TEAM_NUMBER as u32..=MAX_TEAM_NUMBER as u32).contains(&team) {
            Ok(Self(team as u16))
        } else {
            Err(EndpointError::OutOfRange { team })
        }
    }

    /// Parse user input, ignoring surrounding whitespace
    pub fn parse(input: &str) -> Result<Self, EndpointError> {
        let trimmed = input.trim();
        let team: u32 = trimmed.parse().map_err(|_| EndpointError::NotANumber {
            input: trimmed.to_string(),
        })?;
        Self::new(team)
    }

    /// Raw numeric value
    pub fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u32> for TeamNumber {
    type Error = EndpointError;

    fn try_from(team: u32) -> Result<Self, Self::Error> {
        Self::new(team)
    }
}

impl From<TeamNumber> for u32 {
    fn from(team: TeamNumber) -> Self {
        team.0 as u32
    }
}

impl fmt::Display for TeamNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host/port set targeted by one connection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    team: TeamNumber,
    hosts: Vec<String>,
    primary_port: u16,
    fallback_port: u16,
}

impl Endpoint {
    /// Endpoint with the standard candidate hosts for `team`
    pub fn new(team: TeamNumber, primary_port: u16, fallback_port: u16) -> Self {
        Self {
            team,
            hosts: default_hosts(team),
            primary_port,
            fallback_port,
        }
    }

    /// Replace the candidate hosts (simulation on localhost, fixed IPs)
    ///
    /// An empty list keeps the standard candidates.
    pub fn with_hosts(mut self, hosts: Vec<String>) -> Self {
        if !hosts.is_empty() {
            self.hosts = hosts;
        }
        self
    }

    pub fn team(&self) -> TeamNumber {
        self.team
    }

    /// Candidate hosts in preference order
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn primary_port(&self) -> u16 {
        self.primary_port
    }

    pub fn fallback_port(&self) -> u16 {
        self.fallback_port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "team {} (ports {}/{})",
            self.team, self.primary_port, self.fallback_port
        )
    }
}

/// mDNS name announced by the roboRIO
pub fn mdns_host(team: TeamNumber) -> String {
    format!("roboRIO-{}-FRC.local", team)
}

/// Static radio address `10.TE.AM.2`
pub fn static_host(team: TeamNumber) -> String {
    let team = team.get();
    format!("10.{}.{}.2", team / 100, team % 100)
}

/// Standard candidates: mDNS, static radio address, USB
pub fn default_hosts(team: TeamNumber) -> Vec<String> {
    vec![mdns_host(team), static_host(team), USB_HOST.to_string()]
}
