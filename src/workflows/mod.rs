//! The upgrade and sync workflows.
//!
//! Each workflow is a plain [`Workflow`](crate::steps::Workflow) built from a
//! parameter set; running it is the sequencer's job.

pub mod ops;
pub mod params;
pub mod quick;
pub mod sync;

pub use params::{
    date_tag, validate_suffix, QuickInput, QuickParams, RebuildInput, RebuildParams,
    SecondRemote, SourcePushInput, SourcePushParams, StandardInput, StandardParams, SyncMode,
};
pub use quick::quick_workflow;
pub use sync::{rebuild_workflow, source_push_workflow, standard_workflow};
