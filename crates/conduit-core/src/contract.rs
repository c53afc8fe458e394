//! Handler contracts.
//!
//! A [`Contract`] names what the dispatch core asks the handler-lookup
//! capability for: "the command handler for `CreateUser`", "every notification
//! handler for `UserCreated`". It is a plain value built from a [`TypeId`], so
//! constructing one never involves runtime type construction.

use crate::message::{Notification, Request, RequestKind};
use serde::Serialize;
use std::any::{type_name, TypeId};
use std::fmt;

/// The handler-contract family a message is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerFamily {
    /// State-mutating requests, exactly one handler.
    Command,
    /// Read-only requests, exactly one handler.
    Query,
    /// Broadcast events, zero or more handlers.
    Notification,
}

impl HandlerFamily {
    /// Returns the family name used in logs and metrics labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Query => "query",
            Self::Notification => "notification",
        }
    }
}

impl fmt::Display for HandlerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of a handler contract.
///
/// Two contracts are equal when they share family and message type. The type
/// name is carried for diagnostics only.
///
/// # Example
///
/// ```
/// use conduit_core::{Contract, HandlerFamily, Notification};
///
/// struct UserCreated;
/// impl Notification for UserCreated {}
///
/// let contract = Contract::notification::<UserCreated>();
/// assert_eq!(contract.family(), HandlerFamily::Notification);
/// assert!(contract.message_name().ends_with("UserCreated"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Contract {
    family: HandlerFamily,
    message: TypeId,
    message_name: &'static str,
}

impl Contract {
    /// Contract for the single handler of request `R`.
    ///
    /// The family follows the request's kind (command or query).
    #[must_use]
    pub fn request<R: Request>() -> Self {
        Self {
            family: <R::Kind as RequestKind>::FAMILY,
            message: TypeId::of::<R>(),
            message_name: type_name::<R>(),
        }
    }

    /// Contract for every handler of notification `N`.
    #[must_use]
    pub fn notification<N: Notification>() -> Self {
        Self {
            family: HandlerFamily::Notification,
            message: TypeId::of::<N>(),
            message_name: type_name::<N>(),
        }
    }

    /// Returns the handler family.
    #[must_use]
    pub const fn family(&self) -> HandlerFamily {
        self.family
    }

    /// Returns the message type id.
    #[must_use]
    pub const fn message(&self) -> TypeId {
        self.message
    }

    /// Returns the message type name.
    #[must_use]
    pub const fn message_name(&self) -> &'static str {
        self.message_name
    }
}

impl PartialEq for Contract {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family && self.message == other.message
    }
}

impl Eq for Contract {}

impl std::hash::Hash for Contract {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.family.hash(state);
        self.message.hash(state);
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} handler for {}", self.family, self.message_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{AddCommand, EchoQuery, UserCreated};

    #[test]
    fn test_request_contract_follows_kind() {
        assert_eq!(
            Contract::request::<AddCommand>().family(),
            HandlerFamily::Command
        );
        assert_eq!(Contract::request::<EchoQuery>().family(), HandlerFamily::Query);
    }

    #[test]
    fn test_contract_equality() {
        assert_eq!(
            Contract::request::<AddCommand>(),
            Contract::request::<AddCommand>()
        );
        assert_ne!(
            Contract::request::<AddCommand>(),
            Contract::request::<EchoQuery>()
        );
        assert_ne!(
            Contract::request::<EchoQuery>().message(),
            Contract::notification::<UserCreated>().message()
        );
    }

    #[test]
    fn test_contract_display() {
        let contract = Contract::request::<AddCommand>();
        let display = contract.to_string();
        assert!(display.starts_with("command handler for "));
        assert!(display.ends_with("AddCommand"));
    }

    #[test]
    fn test_family_serializes_snake_case() {
        let json = serde_json::to_string(&HandlerFamily::Notification).unwrap();
        assert_eq!(json, "\"notification\"");
    }
}
