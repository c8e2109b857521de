use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical runtime severity levels and their operator-facing codes.
///
/// The numeric codes are part of the level-control API: 6=DEBUG, 5=INFO,
/// 4=WARN, 3=ERROR, 2=FATAL. Codes 0 and 1 are reserved and unused;
/// anything unrecognized resolves to `Info` rather than failing, since
/// level control is an operator input path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    /// Numeric control code for this level.
    pub const fn code(self) -> i32 {
        match self {
            Level::Debug => 6,
            Level::Info => 5,
            Level::Warn => 4,
            Level::Error => 3,
            Level::Fatal => 2,
        }
    }

    /// Canonical upper-case name, round-trippable through [`Level::parse`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// Resolve a numeric control code; unknown codes default to `Info`.
    pub fn from_code(code: i32) -> Self {
        match code {
            6 => Level::Debug,
            5 => Level::Info,
            4 => Level::Warn,
            3 => Level::Error,
            2 => Level::Fatal,
            _ => Level::Info,
        }
    }

    /// Case-insensitive name lookup with the aliases the operator API
    /// accepts: "INFORMATION" for `Info`, "WARNING" for `Warn`,
    /// "CRITICAL" for `Fatal`. Unknown names default to `Info`.
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("DEBUG") {
            Level::Debug
        } else if name.eq_ignore_ascii_case("INFO") || name.eq_ignore_ascii_case("INFORMATION") {
            Level::Info
        } else if name.eq_ignore_ascii_case("WARN") || name.eq_ignore_ascii_case("WARNING") {
            Level::Warn
        } else if name.eq_ignore_ascii_case("ERROR") {
            Level::Error
        } else if name.eq_ignore_ascii_case("FATAL") || name.eq_ignore_ascii_case("CRITICAL") {
            Level::Fatal
        } else {
            Level::Info
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of the level identified by a numeric code; unknown codes render
/// as "INFO".
pub fn level_code_to_string(code: i32) -> &'static str {
    Level::from_code(code).as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for level in [Level::Debug, Level::Info, Level::Warn, Level::Error, Level::Fatal] {
            assert_eq!(Level::from_code(level.code()), level);
            assert_eq!(Level::parse(level.as_str()), level);
        }
    }

    #[test]
    fn name_table() {
        assert_eq!(level_code_to_string(6), "DEBUG");
        assert_eq!(level_code_to_string(5), "INFO");
        assert_eq!(level_code_to_string(4), "WARN");
        assert_eq!(level_code_to_string(3), "ERROR");
        assert_eq!(level_code_to_string(2), "FATAL");
        assert_eq!(level_code_to_string(0), "INFO");
        assert_eq!(level_code_to_string(99), "INFO");
    }

    #[test]
    fn aliases_and_case() {
        assert_eq!(Level::parse("warning"), Level::Warn);
        assert_eq!(Level::parse("WARNING"), Level::parse("WARN"));
        assert_eq!(Level::parse("critical"), Level::Fatal);
        assert_eq!(Level::parse("CRITICAL"), Level::parse("FATAL"));
        assert_eq!(Level::parse("Information"), Level::Info);
    }

    #[test]
    fn unknown_name_defaults_to_info() {
        assert_eq!(Level::parse("verbose"), Level::Info);
        assert_eq!(Level::parse(""), Level::Info);
    }
}
