use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};

/// Payment state of a registration. Stored and displayed with the Portuguese labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationStatus {
    Pending,
    Paid,
}

impl RegistrationStatus {
    pub const ALL: [RegistrationStatus; 2] = [RegistrationStatus::Pending, RegistrationStatus::Paid];

    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "Pendente",
            RegistrationStatus::Paid => "Pago",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pendente" => Ok(RegistrationStatus::Pending),
            "Pago" => Ok(RegistrationStatus::Paid),
            other => Err(format!("unknown registration status: {other:?}")),
        }
    }
}

impl Serialize for RegistrationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
