//! Selection, bulk policy update, cleanup, split, and merge orchestrators.
//!
//! Everything here operates on an already-built [`panflow_graph::ConfigGraph`]
//! and a live [`panflow_tree::Tree`]; callers are responsible for rebuilding
//! the graph after a mutation before handing it to the next orchestrator.

mod bulk;
mod cleanup;
mod merge;
mod selector;
mod split;

pub use bulk::{bulk_update_policies, BulkOperation, BulkUpdateRequest, DescriptionMode, LoggingMode, RenameMode};
pub use cleanup::{disabled_policies, unused_objects, UnusedObjectsRequest, ALL_OBJECT_KINDS};
pub use merge::{merge_object, merge_policy, MergeObjectRequest, MergePolicyRequest};
pub use selector::{Criteria, CriteriaOp, CriteriaValue, Selector};
pub use split::{split_bidirectional, SplitRequest};

/// Convenience re-export so a caller that already depends on `panflow-ops`
/// for orchestration doesn't need a direct `panflow-report` dependency just
/// to turn the returned [`panflow_model::Journal`] into a [`panflow_report::Summary`].
pub use panflow_report::{summarize, Summary};
