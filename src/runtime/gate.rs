use crate::runtime::Version;
use std::fmt;

/// One row of the runtime requirement table.
#[derive(Debug, Clone, Copy)]
struct Requirement {
    /// Lowest game version covered, inclusive
    from: Version,
    /// Highest game version covered, inclusive
    to: Version,
    /// Java major release the row demands
    java_major: u32,
}

const REQUIREMENTS: [Requirement; 4] = [
    Requirement {
        from: Version::new(0, 0, 0),
        to: Version::new(1, 16, 5),
        java_major: 8,
    },
    Requirement {
        from: Version::new(1, 17, 0),
        to: Version::new(1, 17, 1),
        java_major: 11,
    },
    Requirement {
        from: Version::new(1, 17, 0),
        to: Version::new(1, 20, 4),
        java_major: 17,
    },
    Requirement {
        from: Version::new(1, 20, 5),
        to: Version::new(u32::MAX, u32::MAX, u32::MAX),
        java_major: 21,
    },
];

/// Outcome of a runtime version check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The runtime matches the game version
    Pass,
    /// The check was skipped because `force_run` is set
    Bypassed,
    /// The runtime does not match
    Mismatch {
        /// Java major release the game version requires
        required: u32,
        /// Human-readable explanation
        reason: String,
    },
}

impl GateOutcome {
    /// Whether the server may be launched without a warning.
    pub fn passed(&self) -> bool {
        !matches!(self, GateOutcome::Mismatch { .. })
    }
}

impl fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateOutcome::Pass => write!(f, "runtime version OK"),
            GateOutcome::Bypassed => write!(f, "runtime version check bypassed"),
            GateOutcome::Mismatch { reason, .. } => write!(f, "{}", reason),
        }
    }
}

/// Checks a Java runtime against the release a game version needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionGate {
    force: bool,
}

impl VersionGate {
    /// Create a gate; with `force` set every check passes.
    pub fn new(force: bool) -> Self {
        Self { force }
    }

    /// Java major release required by `game`.
    ///
    /// 1.17.0 and 1.17.1 fall in both the Java 11 and Java 17 rows; the
    /// higher release wins.
    pub fn required_java_major(game: Version) -> u32 {
        REQUIREMENTS
            .iter()
            .filter(|r| r.from <= game && game <= r.to)
            .map(|r| r.java_major)
            .max()
            .unwrap_or(8)
    }

    /// Compare `runtime` against the release `game` needs.
    pub fn check(&self, game: Version, runtime: Version) -> GateOutcome {
        if self.force {
            return GateOutcome::Bypassed;
        }

        let required = Self::required_java_major(game);
        let found = runtime.java_major();
        if found == required {
            GateOutcome::Pass
        } else {
            GateOutcome::Mismatch {
                required,
                reason: format!(
                    "Minecraft {} requires Java {}, but the runtime is Java {} ({})",
                    game, required, found, runtime
                ),
            }
        }
    }
}
