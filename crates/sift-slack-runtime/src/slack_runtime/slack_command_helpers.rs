//! Slash command name matching and usage rendering.

#[derive(Debug, Clone, PartialEq, Eq)]
/// Slash command names the bridge answers to.
pub struct CommandNames {
    pub stress_test: String,
    pub stress_test_two_days: String,
    pub eod_settlements: String,
}

impl Default for CommandNames {
    fn default() -> Self {
        Self {
            stress_test: "/update_stress_test_data".to_string(),
            stress_test_two_days: "/update_stress_test_data_2_days".to_string(),
            eod_settlements: "/update_eod_settlements".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiftCommand {
    /// Import the newest report into one dated grid per day span.
    StressTest { day_spans: Vec<u32> },
    EodSettlements,
    Unknown { command: String },
}

impl SiftCommand {
    pub fn parse(command: &str, names: &CommandNames) -> Self {
        let command = command.trim();
        if command == names.stress_test {
            Self::StressTest { day_spans: vec![1] }
        } else if command == names.stress_test_two_days {
            Self::StressTest {
                day_spans: vec![1, 2],
            }
        } else if command == names.eod_settlements {
            Self::EodSettlements
        } else {
            Self::Unknown {
                command: command.to_string(),
            }
        }
    }
}

pub(super) fn sift_command_usage(names: &CommandNames) -> String {
    [
        "Supported commands:".to_string(),
        format!(
            "- `{}`: import the latest stress test PDF into today's `- 1 day` sheet",
            names.stress_test
        ),
        format!(
            "- `{}`: import it into both the `- 1 day` and `- 2 day` sheets",
            names.stress_test_two_days
        ),
        format!(
            "- `{}`: append the latest EOD settlement message to the settlement sheet",
            names.eod_settlements
        ),
    ]
    .join("\n")
}
