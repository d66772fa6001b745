//! The closed result-code taxonomy of the OS accessibility API.

use std::fmt;

/// Every result code the OS accessibility API can return.
///
/// The set is closed: a raw value outside this table is a programming error
/// (a code we have never seen and cannot classify) and terminates the
/// process via `from_raw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AxCode {
    Success,
    SystemFailure,
    IllegalArgument,
    InvalidElement,
    InvalidObserver,
    Timeout,
    AttributeUnsupported,
    ActionUnsupported,
    NotificationUnsupported,
    ParameterizedAttributeUnsupported,
    NotImplemented,
    NotificationAlreadyRegistered,
    NotificationNotRegistered,
    ApiDisabled,
    NoValue,
    NotEnoughPrecision,
}

impl AxCode {
    /// Map the numeric OS result to a code. Panics on values outside the
    /// taxonomy: those indicate a contract change in the OS API, not a
    /// runtime condition the engine can degrade around.
    pub fn from_raw(raw: i32) -> AxCode {
        match raw {
            0 => AxCode::Success,
            -25200 => AxCode::SystemFailure,
            -25201 => AxCode::IllegalArgument,
            -25202 => AxCode::InvalidElement,
            -25203 => AxCode::InvalidObserver,
            -25204 => AxCode::Timeout,
            -25205 => AxCode::AttributeUnsupported,
            -25206 => AxCode::ActionUnsupported,
            -25207 => AxCode::NotificationUnsupported,
            -25208 => AxCode::NotImplemented,
            -25209 => AxCode::NotificationAlreadyRegistered,
            -25210 => AxCode::NotificationNotRegistered,
            -25211 => AxCode::ApiDisabled,
            -25212 => AxCode::NoValue,
            -25213 => AxCode::ParameterizedAttributeUnsupported,
            -25214 => AxCode::NotEnoughPrecision,
            other => panic!("unknown accessibility result code {other}"),
        }
    }

    /// Codes that surface to the caller as `AxError`. Everything else
    /// degrades locally to `None` / no-op at the gateway boundary.
    pub fn is_surfaced(self) -> bool {
        matches!(
            self,
            AxCode::InvalidElement | AxCode::ApiDisabled | AxCode::Timeout | AxCode::NotImplemented
        )
    }

    /// Human-readable description, also used when an error value is
    /// flattened into a dump ("Error: <description>").
    pub fn description(self) -> &'static str {
        match self {
            AxCode::Success => "success",
            AxCode::SystemFailure => "system failure",
            AxCode::IllegalArgument => "illegal argument",
            AxCode::InvalidElement => "invalid element",
            AxCode::InvalidObserver => "invalid observer",
            AxCode::Timeout => "request timed out",
            AxCode::AttributeUnsupported => "attribute unsupported",
            AxCode::ActionUnsupported => "action unsupported",
            AxCode::NotificationUnsupported => "notification unsupported",
            AxCode::ParameterizedAttributeUnsupported => "parameterized attribute unsupported",
            AxCode::NotImplemented => "accessibility not implemented",
            AxCode::NotificationAlreadyRegistered => "notification already registered",
            AxCode::NotificationNotRegistered => "notification not registered",
            AxCode::ApiDisabled => "accessibility API disabled",
            AxCode::NoValue => "no value",
            AxCode::NotEnoughPrecision => "not enough precision",
        }
    }
}

impl fmt::Display for AxCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A surfaced accessibility failure.
///
/// Only the four surfaced codes travel in this type; degradable codes are
/// absorbed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxError {
    code: AxCode,
}

impl AxError {
    pub fn new(code: AxCode) -> Self {
        debug_assert!(code.is_surfaced(), "degradable code {code:?} raised as AxError");
        AxError { code }
    }

    pub fn code(&self) -> AxCode {
        self.code
    }
}

impl fmt::Display for AxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "accessibility call failed: {}", self.code)
    }
}

impl std::error::Error for AxError {}

pub type AxResult<T> = Result<T, AxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_codes_round_trip() {
        assert_eq!(AxCode::from_raw(0), AxCode::Success);
        assert_eq!(AxCode::from_raw(-25202), AxCode::InvalidElement);
        assert_eq!(AxCode::from_raw(-25211), AxCode::ApiDisabled);
        assert_eq!(AxCode::from_raw(-25213), AxCode::ParameterizedAttributeUnsupported);
        assert_eq!(AxCode::from_raw(-25214), AxCode::NotEnoughPrecision);
    }

    #[test]
    #[should_panic(expected = "unknown accessibility result code")]
    fn unknown_raw_code_panics() {
        AxCode::from_raw(-1);
    }

    #[test]
    fn surfaced_split_matches_propagation_policy() {
        for surfaced in [
            AxCode::InvalidElement,
            AxCode::ApiDisabled,
            AxCode::Timeout,
            AxCode::NotImplemented,
        ] {
            assert!(surfaced.is_surfaced(), "{surfaced:?}");
        }
        for degradable in [
            AxCode::NoValue,
            AxCode::AttributeUnsupported,
            AxCode::ParameterizedAttributeUnsupported,
            AxCode::ActionUnsupported,
            AxCode::NotificationNotRegistered,
            AxCode::NotificationAlreadyRegistered,
            AxCode::IllegalArgument,
            AxCode::SystemFailure,
        ] {
            assert!(!degradable.is_surfaced(), "{degradable:?}");
        }
    }

    #[test]
    fn error_display_carries_description() {
        let err = AxError::new(AxCode::Timeout);
        assert!(err.to_string().contains("timed out"));
    }
}
