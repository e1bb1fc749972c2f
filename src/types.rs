use std::str::FromStr;
use serde::Deserialize;

/// How many workers a manager may have in flight at once.
///
/// - `Serial`: at most one worker runs at any moment, so a worker always
///   finishes before the next one is dispatched.
/// - `NonSerial`: up to `processor_count + 1` workers run concurrently
///   (default).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Serial,
    #[default]
    NonSerial,
}

impl ExecutionMode {
    /// Admission bound implied by this mode.
    pub fn max_concurrent(self) -> usize {
        match self {
            ExecutionMode::Serial => 1,
            ExecutionMode::NonSerial => processor_count() + 1,
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "serial" => Ok(ExecutionMode::Serial),
            "non_serial" | "non-serial" | "nonserial" => Ok(ExecutionMode::NonSerial),
            other => Err(format!(
                "invalid execution_mode: {other} (expected \"serial\" or \"non_serial\")"
            )),
        }
    }
}

/// How a worker reports that its work is done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyMode {
    /// A completion (or error) signal is raised as soon as the work routine
    /// returns.
    #[default]
    Automatic,
    /// The work routine raises its own signals through the
    /// [`crate::worker::Notifier`], typically after some activity it launched
    /// has finished.
    Manual,
}

/// Which ordering policy a plan file asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    #[default]
    Priority,
    Topological,
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "priority" => Ok(PolicyKind::Priority),
            "topological" => Ok(PolicyKind::Topological),
            other => Err(format!(
                "invalid policy: {other} (expected \"priority\" or \"topological\")"
            )),
        }
    }
}

/// Number of processors available to this process (at least 1).
pub fn processor_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_admits_one() {
        assert_eq!(ExecutionMode::Serial.max_concurrent(), 1);
        assert_eq!(
            ExecutionMode::NonSerial.max_concurrent(),
            processor_count() + 1
        );
    }

    #[test]
    fn parses_mode_and_policy_names() {
        assert_eq!("Serial".parse::<ExecutionMode>(), Ok(ExecutionMode::Serial));
        assert_eq!(
            "non-serial".parse::<ExecutionMode>(),
            Ok(ExecutionMode::NonSerial)
        );
        assert!("parallel".parse::<ExecutionMode>().is_err());
        assert_eq!(ExecutionMode::default(), ExecutionMode::NonSerial);
        assert_eq!(NotifyMode::default(), NotifyMode::Automatic);
        assert_eq!(PolicyKind::default(), PolicyKind::Priority);
        assert_eq!(
            " topological ".parse::<PolicyKind>(),
            Ok(PolicyKind::Topological)
        );
    }
}
