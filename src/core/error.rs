//! Error types for patchline with contextual messages and exit codes
//!
//! A single unified error type categorizes failures by who has to fix them
//! (configuration vs. git vs. environment) and carries optional help text
//! surfaced by `print_error`.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for patchline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing repos)
  User = 1,
  /// System error (git, I/O)
  System = 2,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for patchline
#[derive(Debug)]
pub enum PatchlineError {
  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl PatchlineError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    PatchlineError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    PatchlineError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      PatchlineError::Message { message, context, help } => PatchlineError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      PatchlineError::Config(_) => ExitCode::User,
      PatchlineError::Git(_) => ExitCode::System,
      PatchlineError::Io(_) => ExitCode::System,
      PatchlineError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      PatchlineError::Config(e) => e.help_message(),
      PatchlineError::Git(e) => e.help_message(),
      PatchlineError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for PatchlineError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PatchlineError::Config(e) => write!(f, "{}", e),
      PatchlineError::Git(e) => write!(f, "{}", e),
      PatchlineError::Io(e) => write!(f, "I/O error: {}", e),
      PatchlineError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for PatchlineError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      PatchlineError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for PatchlineError {
  fn from(err: io::Error) -> Self {
    PatchlineError::Io(err)
  }
}

impl From<String> for PatchlineError {
  fn from(msg: String) -> Self {
    PatchlineError::message(msg)
  }
}

impl From<&str> for PatchlineError {
  fn from(msg: &str) -> Self {
    PatchlineError::message(msg)
  }
}

impl From<toml_edit::TomlError> for PatchlineError {
  fn from(err: toml_edit::TomlError) -> Self {
    PatchlineError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for PatchlineError {
  fn from(err: toml_edit::de::Error) -> Self {
    PatchlineError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for PatchlineError {
  fn from(err: serde_json::Error) -> Self {
    PatchlineError::message(format!("JSON error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for PatchlineError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    PatchlineError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<chrono::ParseError> for PatchlineError {
  fn from(err: chrono::ParseError) -> Self {
    PatchlineError::message(format!("Timestamp parse error: {}", err))
  }
}

/// Convert anyhow::Error to PatchlineError (test helpers use anyhow)
impl From<anyhow::Error> for PatchlineError {
  fn from(err: anyhow::Error) -> Self {
    PatchlineError::message(err.to_string())
  }
}

/// Configuration-related errors
///
/// These are all raised before any repository is touched; the run
/// aborts immediately.
#[derive(Debug)]
pub enum ConfigError {
  /// patchline.toml not found
  NotFound { search_root: PathBuf },

  /// Missing required field
  MissingField { field: String },

  /// The designated version-source repository is absent or unusable
  VersionSource { name: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Create a patchline.toml describing your repositories. See README for a template.".to_string())
      }
      ConfigError::VersionSource { name, .. } => Some(format!(
        "Check that a [[repos]] entry named '{}' exists with a valid path and local_branch.",
        name
      )),
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { search_root } => {
        write!(
          f,
          "No patchline configuration found.\nSearched from: {}",
          search_root.display()
        )
      }
      ConfigError::MissingField { field } => {
        write!(f, "Missing required field in config: {}", field)
      }
      ConfigError::VersionSource { name, reason } => {
        write!(f, "Version-source repository '{}' is unusable: {}", name, reason)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Check out the repository first or fix the path: {}",
        path.display()
      )),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
    }
  }
}

/// Result type alias for patchline
pub type PatchlineResult<T> = Result<T, PatchlineError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> PatchlineResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> PatchlineResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<PatchlineError>,
{
  fn context(self, ctx: impl Into<String>) -> PatchlineResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> PatchlineResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &PatchlineError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
