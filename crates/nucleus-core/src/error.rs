//! Error types for the kernel.

use nucleus_events::DispatchError;
use nucleus_properties::PropertyError;
use nucleus_resolver::ResolveError;
use nucleus_types::{EntityId, GroupId};

use crate::config::ConfigError;

/// Top-level error for kernel assembly and execution.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// Component ordering failed.
    #[error("dependency resolution failed: {source}")]
    Resolve {
        /// The underlying resolver error.
        #[from]
        source: ResolveError,
    },

    /// A labeler, subscription or grouping was rejected.
    #[error("event dispatch error: {source}")]
    Dispatch {
        /// The underlying dispatch error.
        #[from]
        source: DispatchError,
    },

    /// A property operation failed.
    #[error("property error: {source}")]
    Property {
        /// The underlying property error.
        #[from]
        source: PropertyError,
    },

    /// The configuration could not be loaded or is invalid.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// A plan was scheduled before the current time.
    #[error("cannot schedule a plan at {time} when the time is already {now}")]
    PastPlan {
        /// The requested plan time.
        time: f64,
        /// The current simulation time.
        now: f64,
    },

    /// An operation named an entity that does not exist.
    #[error("unknown entity {entity}")]
    UnknownEntity {
        /// The missing entity.
        entity: EntityId,
    },

    /// An operation named a grouping that does not exist.
    #[error("unknown group {group}")]
    UnknownGroup {
        /// The missing grouping.
        group: GroupId,
    },

    /// Component or plan code reported a failure of its own.
    #[error("{reason}")]
    Rejected {
        /// Explanation supplied by the failing code.
        reason: String,
    },
}
