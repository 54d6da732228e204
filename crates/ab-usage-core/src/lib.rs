//! Core types and state machines for the AgenticBilling usage tool.
//!
//! This crate provides everything needed to build, edit and validate one
//! CloudEvents-compliant usage event:
//!
//! - **Model**: [`UsageEvent`], [`UsageData`], [`Meter`] and the envelope
//!   constants.
//! - **Templates**: [`TemplateKind`] and [`new_template`] for the six
//!   recognized usage domains.
//! - **Editing**: the document [`Node`] tree, [`FieldPath`] addressing,
//!   [`EditOp`] mutations and the interactive [`quick_edit`] /
//!   [`full_edit`] modes.
//! - **Validation**: [`validate`] and [`ValidationError`].
//! - **Preview loop**: [`run_preview_cycle`] driving send/edit/cancel
//!   against an injected [`UsageTransport`].
//!
//! Everything here is synchronous, in-memory and single-user; the only
//! I/O is the injected [`Prompt`] console and, at the send transition,
//! one call into the transport collaborator.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod coerce;
pub mod editor;
pub mod event;
pub mod ids;
pub mod node;
pub mod preview;
pub mod prompt;
pub mod template;
pub mod transport;
pub mod validate;

pub use coerce::{CoercionError, Scalar, ScalarKind};
pub use editor::{full_edit, quick_edit};
pub use event::{Meter, UsageData, UsageEvent, CONTENT_TYPE, EVENT_TYPE, SPEC_VERSION};
pub use ids::{IdGenerator, SequenceIds, UlidIds};
pub use node::{EditError, EditOp, FieldPath, Node, PathSeg};
pub use preview::{run_preview_cycle, Outcome};
pub use prompt::{Prompt, ScriptedPrompt};
pub use template::{new_template, TemplateKind, UnknownTemplate};
pub use transport::{TransportError, UsageTransport};
pub use validate::{validate, ValidationError};
