//! Dispatch error taxonomy and check results
//!
//! Every rejection a dispatch attempt can end in. The `Display` output of each
//! variant is exactly the message delivered to the actor.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use std::fmt;

/// Outcome of a single admission check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    Admitted,
    Denied(String),
}

impl CheckResult {
    pub fn denied(reason: impl Into<String>) -> Self {
        CheckResult::Denied(reason.into())
    }

    pub fn is_admitted(&self) -> bool {
        matches!(self, CheckResult::Admitted)
    }

    /// Denial reason, `None` when admitted
    pub fn message(&self) -> Option<&str> {
        match self {
            CheckResult::Admitted => None,
            CheckResult::Denied(reason) => Some(reason),
        }
    }
}

/// Which single-flight table rejected an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockScope {
    /// One in-flight invocation per actor and route
    Sender,
    /// One in-flight invocation per route across all actors
    Global,
}

/// Failure while converting captured tokens into handler arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// No parser entry covers the declared parameter type
    NoParserForType { param: String, type_name: String },
    /// A parser rejected a token
    ParameterConversionFailed {
        param: String,
        token: String,
        message: String,
    },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::NoParserForType { param, type_name } => {
                write!(f, "No parser registered for <{param}> of type {type_name}")
            }
            BindError::ParameterConversionFailed {
                param,
                token,
                message,
            } => write!(f, "Invalid value '{token}' for <{param}>: {message}"),
        }
    }
}

impl std::error::Error for BindError {}

/// Terminal rejection of one dispatch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Fewer tokens than the pattern needs
    MissingParameters {
        command: String,
        given: Vec<String>,
        missing: Vec<String>,
        usage: String,
    },
    /// A token at `position` does not fit the pattern
    ArgumentMismatch {
        command: String,
        given: Vec<String>,
        position: usize,
        offending: String,
        usage: String,
    },
    SenderKindRejected(String),
    PermissionDenied { permission: String },
    OperatorRequired,
    LockedByPreviousInvocation(LockScope),
    OnCooldown,
    Bind(BindError),
}

impl DispatchError {
    /// Short category name for logs
    pub fn category(&self) -> &'static str {
        match self {
            DispatchError::MissingParameters { .. } => "missing_parameters",
            DispatchError::ArgumentMismatch { .. } => "argument_mismatch",
            DispatchError::SenderKindRejected(_) => "sender_kind",
            DispatchError::PermissionDenied { .. } => "permission",
            DispatchError::OperatorRequired => "operator",
            DispatchError::LockedByPreviousInvocation(_) => "locked",
            DispatchError::OnCooldown => "cooldown",
            DispatchError::Bind(BindError::NoParserForType { .. }) => "no_parser",
            DispatchError::Bind(BindError::ParameterConversionFailed { .. }) => "conversion",
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::MissingParameters {
                command,
                given,
                missing,
                usage,
            } => write!(
                f,
                "Missing parameters: /{} >> {} << [missing part]\nCorrect usage: /{command} {usage}",
                join_command(command, given),
                missing.join(" "),
            ),
            DispatchError::ArgumentMismatch {
                command,
                given,
                offending,
                usage,
                ..
            } => write!(
                f,
                "Argument error: /{} >> {offending} << [error here]\nCorrect usage: /{command} {usage}",
                join_command(command, given),
            ),
            DispatchError::SenderKindRejected(reason) => write!(f, "{reason}"),
            DispatchError::PermissionDenied { permission } => {
                write!(f, "Executing this command requires {permission} permission")
            }
            DispatchError::OperatorRequired => {
                write!(f, "You do not have permission to execute this command.")
            }
            DispatchError::LockedByPreviousInvocation(LockScope::Sender) => write!(
                f,
                "Please wait for the previous command to finish executing first!"
            ),
            DispatchError::LockedByPreviousInvocation(LockScope::Global) => write!(
                f,
                "Please wait for other users' commands to finish executing first!"
            ),
            DispatchError::OnCooldown => write!(f, "Too many operations. Please try again later."),
            DispatchError::Bind(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<BindError> for DispatchError {
    fn from(err: BindError) -> Self {
        DispatchError::Bind(err)
    }
}

fn join_command(command: &str, given: &[String]) -> String {
    if given.is_empty() {
        command.to_string()
    } else {
        format!("{command} {}", given.join(" "))
    }
}
