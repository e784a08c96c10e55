//! The contract every PV data source implements.
//!
//! A data source answers four questions about its backing store (which PV ids
//! exist, what happened in a time window, and the earliest/latest visible
//! timestamps) and can derive a copy of itself that is blind to anything after
//! a given "now". Models hold on to those derived copies during training and
//! inference so that future observations cannot leak into features.

pub mod error;

use crate::{observations::Observations, source::error::SourceResult, timestamp::Timestamp};

/// Identifier of a single PV site.
pub type PvId = String;

/// The PV ids requested from [`PvDataSource::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PvSelection {
    /// A single PV id.
    One(PvId),
    /// An ordered list of PV ids. Must not be empty.
    Many(Vec<PvId>),
}

impl PvSelection {
    /// The selected ids in request order.
    pub fn ids(&self) -> &[PvId] {
        match self {
            PvSelection::One(id) => std::slice::from_ref(id),
            PvSelection::Many(ids) => ids,
        }
    }
}

impl From<&str> for PvSelection {
    fn from(id: &str) -> Self {
        PvSelection::One(id.to_string())
    }
}

impl From<String> for PvSelection {
    fn from(id: String) -> Self {
        PvSelection::One(id)
    }
}

impl From<Vec<String>> for PvSelection {
    fn from(ids: Vec<String>) -> Self {
        PvSelection::Many(ids)
    }
}

impl From<&[&str]> for PvSelection {
    fn from(ids: &[&str]) -> Self {
        PvSelection::Many(ids.iter().map(|id| id.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PvSelection {
    fn from(ids: [&str; N]) -> Self {
        PvSelection::Many(ids.iter().map(|id| id.to_string()).collect())
    }
}

/// Read-only access to historical PV observations with a causal cutoff.
///
/// Implementations keep an instance-local cutoff (`None` meaning unbounded).
/// No method ever returns data with a timestamp after that cutoff, and
/// [`without_future`](PvDataSource::without_future) is the only way to
/// produce an instance with a tighter one.
pub trait PvDataSource {
    /// Observations for `pv_ids` with `start <= ts <= min(end, cutoff)`.
    ///
    /// Omitted bounds are unbounded on that side. A window that is already
    /// closed (start after the effective end) yields an empty table rather
    /// than an error.
    ///
    /// # Errors
    ///
    /// `SourceError::NotFound` naming every unknown id, and
    /// `SourceError::EmptySelection` for an empty id list.
    fn get(
        &self,
        pv_ids: &PvSelection,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> SourceResult<Observations>;

    /// Every PV id in the backing store, in backend-defined order.
    ///
    /// The cutoff restricts timestamps only, never identities.
    fn list_pv_ids(&self) -> Vec<PvId>;

    /// Earliest visible timestamp.
    fn min_ts(&self) -> Timestamp;

    /// Latest visible timestamp.
    fn max_ts(&self) -> Timestamp;

    /// The instance cutoff. `None` when nothing has been hidden yet.
    fn cutoff(&self) -> Option<Timestamp>;

    /// A copy of this source that cannot see anything at or after
    /// `now - blackout_minutes`.
    ///
    /// The receiver is left untouched and the copy's cutoff is never later
    /// than the receiver's.
    fn without_future(&self, now: Timestamp, blackout_minutes: u32) -> Self
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_conversions_preserve_order() {
        assert_eq!(PvSelection::from("A").ids(), ["A".to_string()]);
        assert_eq!(
            PvSelection::from(["B", "A"]).ids(),
            ["B".to_string(), "A".to_string()]
        );

        let ids: &[&str] = &["C"];
        assert_eq!(
            PvSelection::from(ids),
            PvSelection::Many(vec!["C".to_string()])
        );
    }
}
