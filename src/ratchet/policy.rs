//! Ratchet scheduling policy and security levels.
//!
//! The policy is advisory: [`RatchetParams::should_ratchet`] tells the caller
//! a forced DH ratchet is due, but never touches cryptographic state itself.
//! The security level fixes the scrypt work factor for every chain and root
//! advance in the session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::{RatchetboxError, Result};

/// scrypt work-factor tiers for the chain KDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityLevel {
    /// N = 8192
    VeryLow = 0,
    /// N = 16384, interactive-login grade, ~100ms per advance
    Low = 1,
    /// N = 32768, ~200ms per advance
    Medium = 2,
    /// N = 65536
    High = 3,
    /// N = 104857, kept verbatim for compatibility with deployed peers.
    /// Not a power of two, so the KDF rejects it at first use, exactly as
    /// every existing peer behaves.
    VeryHigh = 4,
}

impl SecurityLevel {
    /// Returns the scrypt work parameter for this level.
    pub fn scrypt_n(&self) -> u32 {
        match self {
            SecurityLevel::VeryLow => 8_192,
            SecurityLevel::Low => 16_384,
            SecurityLevel::Medium => 32_768,
            SecurityLevel::High => 65_536,
            SecurityLevel::VeryHigh => 104_857,
        }
    }

    /// Returns the level's textual name.
    pub fn name(&self) -> &'static str {
        match self {
            SecurityLevel::VeryLow => "verylow",
            SecurityLevel::Low => "low",
            SecurityLevel::Medium => "medium",
            SecurityLevel::High => "high",
            SecurityLevel::VeryHigh => "veryhigh",
        }
    }

    /// Maps an integer level code.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(SecurityLevel::VeryLow),
            1 => Ok(SecurityLevel::Low),
            2 => Ok(SecurityLevel::Medium),
            3 => Ok(SecurityLevel::High),
            4 => Ok(SecurityLevel::VeryHigh),
            other => Err(RatchetboxError::invalid_level(format!(
                "unknown level code {other}"
            ))),
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SecurityLevel {
    type Err = RatchetboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "verylow" => Ok(SecurityLevel::VeryLow),
            "low" => Ok(SecurityLevel::Low),
            "medium" => Ok(SecurityLevel::Medium),
            "high" => Ok(SecurityLevel::High),
            "veryhigh" => Ok(SecurityLevel::VeryHigh),
            other => Err(RatchetboxError::invalid_level(format!(
                "[{other}]: use 'verylow', 'low', 'medium', 'high', or 'veryhigh'"
            ))),
        }
    }
}

/// Per-session ratchet parameters.
///
/// The work factor is fixed for the life of the session once configured;
/// both peers must agree on it or their derived keys diverge.
#[derive(Debug, Clone)]
pub struct RatchetParams {
    scrypt_n: u32,
    count: u32,
    period_hours: u64,
    last: u32,
    last_ratchet: Instant,
}

impl Default for RatchetParams {
    fn default() -> Self {
        Self::new(0, 0, SecurityLevel::Low)
    }
}

impl RatchetParams {
    /// Creates parameters: force a DH ratchet after `count` outbound messages
    /// (0 disables), after `period_hours` hours (0 disables), with the chain
    /// KDF work factor taken from `level`.
    pub fn new(count: u32, period_hours: u64, level: SecurityLevel) -> Self {
        Self {
            scrypt_n: level.scrypt_n(),
            count,
            period_hours,
            last: 0,
            last_ratchet: Instant::now(),
        }
    }

    /// Returns the scrypt work parameter.
    pub fn scrypt_n(&self) -> u32 {
        self.scrypt_n
    }

    /// Overrides the scrypt work parameter directly.
    pub fn set_scrypt_n(&mut self, n: u32) {
        self.scrypt_n = n;
    }

    /// Advisory check: true when the caller should force a DH ratchet, either
    /// because `count` outbound messages accumulated or `period_hours`
    /// elapsed. Firing resets the trigger's own counters; it does not mutate
    /// any cryptographic state.
    pub fn should_ratchet(&mut self) -> bool {
        if self.count > 0 {
            if self.last >= self.count {
                self.last = 0;
                if self.period_hours > 0 {
                    self.last_ratchet = Instant::now();
                }
                return true;
            }
            self.last += 1;
        }
        if self.period_hours > 0 {
            let now = Instant::now();
            let hours = now.duration_since(self.last_ratchet).as_secs() / 3600;
            if hours >= self.period_hours {
                self.last = 0;
                self.last_ratchet = now;
                return true;
            }
        }
        false
    }
}
