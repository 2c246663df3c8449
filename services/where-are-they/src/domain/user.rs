use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Child, SchoolBus};

/// Identity shared by observed and observer users.
///
/// `password` holds the stored Argon2 hash and is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub id_number: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub email: String,
}

/// A monitored party, usually the driver of a school bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservedUser {
    #[serde(flatten)]
    pub user: User,
    pub privacy_key: String,
    pub company_name: String,
    pub school_bus: Option<SchoolBus>,
}

/// A guardian watching one or more observed users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObserverUser {
    #[serde(flatten)]
    pub user: User,
    pub children: Vec<Child>,
    pub observed_users: Vec<ObservedUser>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserKind {
    Observed,
    Observer,
}

impl UserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserKind::Observed => "observed",
            UserKind::Observer => "observer",
        }
    }
}

impl fmt::Display for UserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "observed" => Ok(UserKind::Observed),
            "observer" => Ok(UserKind::Observer),
            other => Err(format!("unknown user kind: {}", other)),
        }
    }
}

/// A persisted user in one of its two roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserAccount {
    Observed(ObservedUser),
    Observer(ObserverUser),
}

impl UserAccount {
    pub fn user(&self) -> &User {
        match self {
            UserAccount::Observed(observed) => &observed.user,
            UserAccount::Observer(observer) => &observer.user,
        }
    }

    pub fn id(&self) -> i64 {
        self.user().id
    }

    pub fn kind(&self) -> UserKind {
        match self {
            UserAccount::Observed(_) => UserKind::Observed,
            UserAccount::Observer(_) => UserKind::Observer,
        }
    }

    pub fn into_observer(self) -> Option<ObserverUser> {
        match self {
            UserAccount::Observer(observer) => Some(observer),
            UserAccount::Observed(_) => None,
        }
    }

    pub fn into_observed(self) -> Option<ObservedUser> {
        match self {
            UserAccount::Observed(observed) => Some(observed),
            UserAccount::Observer(_) => None,
        }
    }
}

/// Identity fields supplied when registering a user. `password` is the
/// already-hashed value by the time it reaches a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRegistration {
    pub name: String,
    pub last_name: String,
    pub id_number: String,
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewUserAccount {
    Observed {
        identity: UserRegistration,
        privacy_key: String,
        company_name: String,
    },
    Observer {
        identity: UserRegistration,
    },
}

impl NewUserAccount {
    pub fn identity(&self) -> &UserRegistration {
        match self {
            NewUserAccount::Observed { identity, .. } => identity,
            NewUserAccount::Observer { identity } => identity,
        }
    }

    pub fn kind(&self) -> UserKind {
        match self {
            NewUserAccount::Observed { .. } => UserKind::Observed,
            NewUserAccount::Observer { .. } => UserKind::Observer,
        }
    }
}

/// Username/password pair presented at login. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}
