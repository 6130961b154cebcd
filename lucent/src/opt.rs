//! Context options.

use std::env;
use std::fmt;
use std::str::FromStr;

use log::warn;

/// Environment variable listing extensions to disable, comma- or space-separated.
pub const DISABLE_EXTENSIONS_VAR: &str = "LUCENT_DISABLE_EXTENSIONS";

/// Environment variable listing workarounds to disable, comma- or space-separated.
pub const DISABLE_WORKAROUNDS_VAR: &str = "LUCENT_DISABLE_WORKAROUNDS";

/// Environment variable selecting the [`ContextLog`] mode.
pub const LOG_VAR: &str = "LUCENT_LOG";

/// How chatty context creation is.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ContextLog {
  /// Nothing is logged at info level.
  Quiet,
  /// Renderer, disabled extensions, used features and workarounds are logged at info level.
  Default,
  /// Same as [`ContextLog::Default`], plus every committed dispatch strategy.
  Verbose,
}

impl Default for ContextLog {
  fn default() -> Self {
    ContextLog::Default
  }
}

impl fmt::Display for ContextLog {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      ContextLog::Quiet => f.write_str("quiet"),
      ContextLog::Default => f.write_str("default"),
      ContextLog::Verbose => f.write_str("verbose"),
    }
  }
}

/// Error returned when parsing an unknown [`ContextLog`] name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseContextLogError(pub String);

impl fmt::Display for ParseContextLogError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(
      f,
      "unknown log mode {} (expected quiet, default or verbose)",
      self.0
    )
  }
}

impl std::error::Error for ParseContextLogError {}

impl FromStr for ContextLog {
  type Err = ParseContextLogError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "quiet" => Ok(ContextLog::Quiet),
      "default" => Ok(ContextLog::Default),
      "verbose" => Ok(ContextLog::Verbose),
      other => Err(ParseContextLogError(other.to_owned())),
    }
  }
}

/// Options a context is created with.
///
/// Start from `ContextOpt::default()` (nothing disabled, default logging) or from
/// [`ContextOpt::from_env`], then tweak with the `set_*` methods.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ContextOpt {
  disabled_extensions: Vec<String>,
  disabled_workarounds: Vec<String>,
  log: ContextLog,
}

impl ContextOpt {
  /// Options read from the `LUCENT_*` environment variables.
  pub fn from_env() -> Self {
    Self::from_lookup(|name| env::var(name).ok())
  }

  fn from_lookup<F>(lookup: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let mut opt = ContextOpt::default();

    if let Some(list) = lookup(DISABLE_EXTENSIONS_VAR) {
      opt = opt.set_disabled_extensions(split_list(&list));
    }

    if let Some(list) = lookup(DISABLE_WORKAROUNDS_VAR) {
      opt = opt.set_disabled_workarounds(split_list(&list));
    }

    if let Some(mode) = lookup(LOG_VAR) {
      match mode.parse() {
        Ok(log) => opt = opt.set_log(log),
        Err(e) => warn!("{}: {}", LOG_VAR, e),
      }
    }

    opt
  }

  /// Disable extensions by name, with or without the `GL_` prefix.
  ///
  /// A disabled extension is never reported as supported, even when the version implies it.
  #[inline]
  pub fn set_disabled_extensions<I, S>(self, extensions: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    ContextOpt {
      disabled_extensions: extensions.into_iter().map(Into::into).collect(),
      ..self
    }
  }

  /// Extensions to disable.
  #[inline]
  pub fn disabled_extensions(&self) -> &[String] {
    &self.disabled_extensions
  }

  /// Disable driver workarounds by name. Unknown names are reported and ignored.
  #[inline]
  pub fn set_disabled_workarounds<I, S>(self, workarounds: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    ContextOpt {
      disabled_workarounds: workarounds.into_iter().map(Into::into).collect(),
      ..self
    }
  }

  /// Workarounds to disable.
  #[inline]
  pub fn disabled_workarounds(&self) -> &[String] {
    &self.disabled_workarounds
  }

  /// Set the log mode. Default to [`ContextLog::Default`].
  #[inline]
  pub fn set_log(self, log: ContextLog) -> Self {
    ContextOpt { log, ..self }
  }

  /// Log mode.
  #[inline]
  pub fn log(&self) -> ContextLog {
    self.log
  }
}

fn split_list(list: &str) -> Vec<String> {
  list
    .split(|c: char| c == ',' || c.is_whitespace())
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
    .collect()
}
