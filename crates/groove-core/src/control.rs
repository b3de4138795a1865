//! Remote-control messages
//!
//! Addresses are resolved and values type-checked when a message arrives on
//! the control thread. What crosses into the block processor is a small
//! `Copy` value with nothing to free.

use std::fmt;
use std::str::FromStr;

use crate::error::{ControlError, Result};

/// Parameter a control message targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterAddress {
    SwingRatio,
    AccentAmount,
    HumanizeTiming,
    HumanizeVelocity,
    RemoteEnabled,
    RemotePort,
}

impl ParameterAddress {
    pub const ALL: [Self; 6] = [
        Self::SwingRatio,
        Self::AccentAmount,
        Self::HumanizeTiming,
        Self::HumanizeVelocity,
        Self::RemoteEnabled,
        Self::RemotePort,
    ];

    /// Wire address, case-sensitive
    pub fn path(self) -> &'static str {
        match self {
            Self::SwingRatio => "/style/swing",
            Self::AccentAmount => "/style/accent",
            Self::HumanizeTiming => "/style/humanizeTiming",
            Self::HumanizeVelocity => "/style/humanizeVelocity",
            Self::RemoteEnabled => "/style/enable",
            Self::RemotePort => "/style/port",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.path() == path)
    }

    fn expected_type(self) -> &'static str {
        match self {
            Self::RemoteEnabled => "boolean",
            Self::RemotePort => "integer",
            _ => "real",
        }
    }
}

impl fmt::Display for ParameterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for ParameterAddress {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_path(s).ok_or_else(|| ControlError::UnknownAddress(s.to_string()))
    }
}

/// Typed scalar carried by a control message
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    Bool(bool),
    Int(i32),
    Real(f32),
}

impl ControlValue {
    /// Reals accept integers, as senders often drop the fraction
    pub fn as_real(self) -> Option<f32> {
        match self {
            Self::Real(v) => Some(v),
            Self::Int(v) => Some(v as f32),
            Self::Bool(_) => None,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(v),
            Self::Int(0) => Some(false),
            Self::Int(1) => Some(true),
            _ => None,
        }
    }

    /// Integral view for the port; reals truncate toward zero
    pub fn as_int(self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(i64::from(v)),
            Self::Real(v) if !v.is_nan() => Some(v as i64),
            _ => None,
        }
    }
}

/// A single "set this parameter" request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlMessage {
    pub address: ParameterAddress,
    pub value: ControlValue,
}

impl ControlMessage {
    /// Build without validation. `ParameterStore::apply` still rejects a bad pairing.
    pub fn new(address: ParameterAddress, value: ControlValue) -> Self {
        Self { address, value }
    }

    /// Resolve a wire address and validate the value against it
    pub fn parse(path: &str, value: ControlValue) -> Result<Self> {
        Self::checked(path.parse()?, value)
    }

    pub fn checked(address: ParameterAddress, value: ControlValue) -> Result<Self> {
        let message = Self::new(address, value);
        message.validate()?;
        Ok(message)
    }

    pub fn validate(&self) -> Result<()> {
        let wrong_type = || ControlError::WrongType {
            address: self.address.path(),
            expected: self.address.expected_type(),
        };

        match self.address {
            ParameterAddress::RemoteEnabled => self.value.as_bool().map(drop).ok_or_else(wrong_type),
            ParameterAddress::RemotePort => match self.value {
                ControlValue::Real(v) if v.is_nan() => Err(ControlError::NotANumber(self.address.path())),
                v => v.as_int().map(drop).ok_or_else(wrong_type),
            },
            _ => match self.value.as_real() {
                Some(v) if v.is_nan() => Err(ControlError::NotANumber(self.address.path())),
                Some(_) => Ok(()),
                None => Err(wrong_type()),
            },
        }
    }
}
