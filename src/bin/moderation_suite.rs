use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use chat_moderator::moderation::{Action, ModerationResult};
use clap::Parser;
use tokio::process::Command;
use tokio::time::timeout;

const CASE_TIMEOUT: Duration = Duration::from_secs(30);

struct Case {
    message: &'static str,
    expected: Action,
    description: &'static str,
}

const CASES: &[Case] = &[
    Case {
        message: "Hello, how are you?",
        expected: Action::Allow,
        description: "Normal greeting",
    },
    Case {
        message: "The meeting is at 3 PM",
        expected: Action::Allow,
        description: "Time reference",
    },
    Case {
        message: "Let's meet at the coffee shop",
        expected: Action::Allow,
        description: "General location",
    },
    Case {
        message: "Thanks for the help!",
        expected: Action::Allow,
        description: "Polite message",
    },
    Case {
        message: "What's the price?",
        expected: Action::Allow,
        description: "Business question",
    },
    Case {
        message: "Can I have your phone number?",
        expected: Action::Warn,
        description: "Direct phone request",
    },
    Case {
        message: "What's your address?",
        expected: Action::Warn,
        description: "Direct address request",
    },
    Case {
        message: "Where should I deliver the package?",
        expected: Action::Warn,
        description: "Delivery address request",
    },
    Case {
        message: "Can you send me your email?",
        expected: Action::Warn,
        description: "Email request",
    },
    Case {
        message: "What's your home address?",
        expected: Action::Warn,
        description: "Home address request",
    },
    Case {
        message: "My phone number is 555-1234",
        expected: Action::Stop,
        description: "Phone number sharing",
    },
    Case {
        message: "My address is 123 Main St",
        expected: Action::Stop,
        description: "Address sharing",
    },
    Case {
        message: "I'm John Smith",
        expected: Action::Stop,
        description: "Name sharing",
    },
    Case {
        message: "My email is john@example.com",
        expected: Action::Stop,
        description: "Email sharing",
    },
    Case {
        message: "I live on Oak Street",
        expected: Action::Stop,
        description: "Location sharing",
    },
];

/// Drives the moderator CLI as a subprocess over a fixed case table.
/// Needs a live GOOGLE_API_KEY; exit code 0 means every case passed.
#[derive(Debug, Parser)]
#[command(name = "moderation_suite")]
struct Args {
    /// Path to the moderator binary; defaults to the sibling of this executable
    #[arg(long)]
    moderator_bin: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    println!("Chat Moderation Test Suite");
    println!("{}", "=".repeat(50));

    let key_present = std::env::var("GOOGLE_API_KEY")
        .map(|key| !key.is_empty())
        .unwrap_or(false);
    if !key_present {
        println!("GOOGLE_API_KEY environment variable not set!");
        println!("Set it with: export GOOGLE_API_KEY='your_key_here'");
        return ExitCode::FAILURE;
    }

    let moderator_bin = match args.moderator_bin.map(Ok).unwrap_or_else(sibling_moderator_bin) {
        Ok(path) => path,
        Err(locate_error) => {
            println!("Cannot locate moderator binary: {locate_error}");
            return ExitCode::FAILURE;
        }
    };

    let mut passed = 0;
    for case in CASES {
        if run_case(&moderator_bin, case).await {
            passed += 1;
        }
    }

    println!();
    println!("{}", "=".repeat(50));
    println!("Test Results: {passed}/{} passed", CASES.len());

    if passed == CASES.len() {
        println!("All tests passed! Moderation service is working correctly.");
        ExitCode::SUCCESS
    } else {
        println!("Some tests failed. Check the moderation logic.");
        ExitCode::FAILURE
    }
}

fn sibling_moderator_bin() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow::anyhow!("executable has no parent directory"))?;
    Ok(dir.join("chat-moderator"))
}

async fn run_case(moderator_bin: &Path, case: &Case) -> bool {
    println!();
    println!("Testing: {}", case.description);
    println!("   Message: '{}'", case.message);
    println!("   Expected: {}", case.expected.as_str());

    let output = timeout(
        CASE_TIMEOUT,
        Command::new(moderator_bin)
            .arg(case.message)
            .kill_on_drop(true)
            .output(),
    )
    .await;

    let output = match output {
        Ok(Ok(output)) => output,
        Ok(Err(spawn_error)) => {
            println!("   ERROR - failed to run moderator: {spawn_error}");
            return false;
        }
        Err(_) => {
            println!("   TIMEOUT - moderator took too long");
            return false;
        }
    };

    if !output.status.success() {
        println!(
            "   ERROR - moderator exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return false;
    }

    check_case_output(case, &String::from_utf8_lossy(&output.stdout))
}

fn check_case_output(case: &Case, stdout: &str) -> bool {
    let result: ModerationResult = match serde_json::from_str(stdout.trim()) {
        Ok(result) => result,
        Err(parse_error) => {
            println!(
                "   JSON ERROR - invalid response ({parse_error}): {}",
                stdout.trim()
            );
            return false;
        }
    };

    println!("   Actual: {}", result.action.as_str());
    println!("   Reason: {}", result.reason);

    if result.action == case.expected {
        println!("   PASS");
        true
    } else {
        println!(
            "   FAIL - expected {}, got {}",
            case.expected.as_str(),
            result.action.as_str()
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use chat_moderator::moderation::Action;

    use super::{CASES, Case, check_case_output};

    const CASE: Case = Case {
        message: "Hello, how are you?",
        expected: Action::Allow,
        description: "Normal greeting",
    };

    #[test]
    fn matching_action_passes() {
        let stdout = r#"{"action":"ALLOW","reason":"Message is appropriate","message_length":19}"#;
        assert!(check_case_output(&CASE, stdout));
    }

    #[test]
    fn trailing_newline_is_tolerated() {
        let stdout = "{\"action\":\"ALLOW\",\"reason\":\"Message is appropriate\"}\n";
        assert!(check_case_output(&CASE, stdout));
    }

    #[test]
    fn mismatched_action_fails() {
        let stdout = r#"{"action":"STOP","reason":"Personal information detected in message"}"#;
        assert!(!check_case_output(&CASE, stdout));
    }

    #[test]
    fn unparsable_output_fails() {
        assert!(!check_case_output(&CASE, "not json"));
        assert!(!check_case_output(&CASE, ""));
        assert!(!check_case_output(&CASE, r#"{"reason":"missing action"}"#));
    }

    #[test]
    fn suite_covers_all_three_actions_evenly() {
        let count = |action: Action| CASES.iter().filter(|c| c.expected == action).count();
        assert_eq!(count(Action::Allow), 5);
        assert_eq!(count(Action::Warn), 5);
        assert_eq!(count(Action::Stop), 5);
    }
}
