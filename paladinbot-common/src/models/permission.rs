use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// A capability a chatter can hold, derived from their chat badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Admin,
    Broadcaster,
    Moderator,
    Vip,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Admin => "admin",
            Permission::Broadcaster => "broadcaster",
            Permission::Moderator => "moderator",
            Permission::Vip => "vip",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Permission::Admin),
            "broadcaster" => Ok(Permission::Broadcaster),
            "moderator" => Ok(Permission::Moderator),
            "vip" => Ok(Permission::Vip),
            other => Err(format!("unknown permission '{}'", other)),
        }
    }
}
