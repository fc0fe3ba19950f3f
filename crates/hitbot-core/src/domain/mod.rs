//! Domain layer: pure bot logic with no I/O.
//!
//! # What belongs here?
//!
//! - **`identity`** – Who the bot is (name, name colour, verbosity).
//! - **`role`** – The role a sender must hold to run a command.
//! - **`registry`** – Command registrations: a global table plus per-channel
//!   override tables, and the traits handlers implement.
//! - **`dispatch`** – Turning a chat line into (at most) one handler call.

pub mod dispatch;
pub mod identity;
pub mod registry;
pub mod role;
