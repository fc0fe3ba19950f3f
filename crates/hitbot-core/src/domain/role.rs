//! Role gating for commands.
//!
//! Each registration names the least-privileged role allowed to run it.  The
//! chat service reports a sender's standing as a `role` string plus a set of
//! membership flags; [`RequiredRole::is_satisfied_by`] maps those onto a
//! simple hierarchy:
//!
//! ```text
//! staff ⊂ owner ⊂ admin ⊂ subscriber ⊂ follower ⊂ user ⊂ anon
//!                 admin ⊂ community ⊂ user
//! ```
//!
//! (`A ⊂ B` reads "everyone who is A also satisfies B".)

use std::fmt;
use std::str::FromStr;

use crate::domain::registry::RegistryError;
use crate::protocol::messages::ChatParams;

/// The minimum standing a sender needs to trigger a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredRole {
    /// Anyone, including anonymous viewers.
    Anon,
    /// Any logged-in sender.
    User,
    Follower,
    Subscriber,
    Community,
    /// Channel moderators (`role == "admin"`), owners and staff.
    Admin,
    Owner,
    Staff,
}

impl RequiredRole {
    /// Returns `true` if the sender of `event` meets this requirement.
    pub fn is_satisfied_by(self, event: &ChatParams) -> bool {
        match self {
            RequiredRole::Anon => true,
            RequiredRole::User => {
                let anonymous = event.role.is_empty() || event.role.eq_ignore_ascii_case("anon");
                !anonymous
                    || event.is_follower
                    || RequiredRole::Community.is_satisfied_by(event)
                    || RequiredRole::Subscriber.is_satisfied_by(event)
            }
            RequiredRole::Staff => event.is_staff,
            RequiredRole::Owner => event.is_owner || event.is_staff,
            RequiredRole::Admin => event.is_admin_level(),
            RequiredRole::Community => event.is_community || event.is_admin_level(),
            RequiredRole::Subscriber => event.is_subscriber || event.is_admin_level(),
            RequiredRole::Follower => {
                event.is_follower || RequiredRole::Subscriber.is_satisfied_by(event)
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequiredRole::Anon => "anon",
            RequiredRole::User => "user",
            RequiredRole::Follower => "follower",
            RequiredRole::Subscriber => "subscriber",
            RequiredRole::Community => "community",
            RequiredRole::Admin => "admin",
            RequiredRole::Owner => "owner",
            RequiredRole::Staff => "staff",
        }
    }
}

impl FromStr for RequiredRole {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "anon" | "any" => Ok(RequiredRole::Anon),
            "user" => Ok(RequiredRole::User),
            "follower" => Ok(RequiredRole::Follower),
            "subscriber" | "sub" => Ok(RequiredRole::Subscriber),
            "community" => Ok(RequiredRole::Community),
            "admin" | "mod" | "moderator" => Ok(RequiredRole::Admin),
            "owner" => Ok(RequiredRole::Owner),
            "staff" => Ok(RequiredRole::Staff),
            _ => Err(RegistryError::UnknownRole(s.to_string())),
        }
    }
}

impl fmt::Display for RequiredRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
