//! UID sets for UID FETCH.

use super::Uid;

/// UID-based sequence set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UidSet {
    /// Single UID.
    Single(Uid),
    /// Range from start to highest UID.
    RangeFrom(Uid),
    /// Multiple UID specifications.
    Set(Vec<Self>),
}

impl UidSet {
    /// Every message in the folder (`1:*`).
    #[must_use]
    pub const fn everything() -> Self {
        Self::RangeFrom(Uid(std::num::NonZeroU32::MIN))
    }

    /// Builds a set listing each UID in order.
    ///
    /// Returns `None` for an empty list.
    #[must_use]
    pub fn from_uids(uids: impl IntoIterator<Item = Uid>) -> Option<Self> {
        let mut items: Vec<Self> = uids.into_iter().map(Self::Single).collect();
        match items.len() {
            0 => None,
            1 => items.pop(),
            _ => Some(Self::Set(items)),
        }
    }
}

impl std::fmt::Display for UidSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::RangeFrom(start) => write!(f, "{start}:*"),
            Self::Set(items) => {
                let s: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", s.join(","))
            }
        }
    }
}
