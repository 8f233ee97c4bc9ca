//! qagen CLI Library
//!
//! Command-line interface components for the qagen question/answer pipeline.

use qagen_core::QagenError;

pub mod commands;
pub mod config;
pub mod output;

pub use commands::*;
pub use config::*;
pub use output::*;

/// CLI version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Check if running in CI environment
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("JENKINS_URL").is_ok()
}

/// Get the appropriate exit code for an error
///
/// | code | meaning                                        |
/// |------|------------------------------------------------|
/// | 2    | invalid arguments or configuration             |
/// | 3    | nothing survived filtering                     |
/// | 4    | file system failure                            |
/// | 5    | a collaborator was unreachable or timed out    |
/// | 6    | a collaborator answered in an unexpected shape |
/// | 1    | anything else                                  |
pub fn exit_code_for_error(error: &QagenError) -> i32 {
    match error {
        QagenError::Validation { .. }
        | QagenError::PreconditionViolation { .. }
        | QagenError::Config(_) => 2,
        QagenError::EmptyInput { .. } | QagenError::NoValidQa | QagenError::AllDuplicates => 3,
        QagenError::Io(_) => 4,
        QagenError::CollaboratorUnavailable { .. }
        | QagenError::Timeout { .. }
        | QagenError::Http(_) => 5,
        QagenError::UnexpectedOutputFormat { .. } => 6,
        _ => 1,
    }
}
