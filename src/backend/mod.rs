//! Backend selectors and operation names.
//!
//! Every adapter is addressed by a [`BackendKind`] and every CRUD call by an
//! [`Operation`]. Both render to the lowercase names used in selector strings,
//! log lines and error messages.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// The four storage backends a facade can route to.
///
/// Parsing accepts exactly the lowercase selector strings:
///
/// ```
/// use jsonvault::backend::BackendKind;
///
/// assert_eq!("local".parse::<BackendKind>().unwrap(), BackendKind::Local);
/// assert_eq!(BackendKind::Transactional.to_string(), "transactional");
/// assert!("indexeddb".parse::<BackendKind>().is_err());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Persistent key-value store that survives restarts.
    Local,
    /// Key-value store that lives as long as the facade does.
    Session,
    /// Versioned embedded database with one named collection.
    Transactional,
    /// Remote HTTP resource collection.
    Remote,
}

impl BackendKind {
    /// Whether this backend keeps values as prefixed keys in a flat key-value store.
    pub fn is_key_value(self) -> bool {
        matches!(self, BackendKind::Local | BackendKind::Session)
    }
}

/// The adapter contract's four verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Store,
    Retrieve,
    Update,
    Delete,
}

impl Operation {
    /// Store, update and delete need a write transaction; retrieve only reads.
    pub fn is_write(self) -> bool {
        !matches!(self, Operation::Retrieve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn selectors_round_trip_through_display() {
        for kind in BackendKind::iter() {
            let parsed: BackendKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn unknown_and_differently_cased_selectors_are_rejected() {
        assert!("bogus".parse::<BackendKind>().is_err());
        assert!("Local".parse::<BackendKind>().is_err());
        assert!("".parse::<BackendKind>().is_err());
    }

    #[test]
    fn only_retrieve_is_read_only() {
        let writes: Vec<_> = Operation::iter().filter(|op| op.is_write()).collect();
        assert_eq!(writes, vec![Operation::Store, Operation::Update, Operation::Delete]);
    }
}
