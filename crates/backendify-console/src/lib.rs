// crates/backendify-console/src/lib.rs
// ============================================================================
// Module: Backendify Console Library
// Description: Schema-driven record interface over the remote API contract.
// Purpose: Expose registry, resolver, forms, tables, and mutation handling.
// Dependencies: backendify-core, backendify-config
// ============================================================================

//! ## Overview
//! The console discovers collections and typed fields at runtime and turns
//! them into input controls, relation choice lists, and record tables. Reads go
//! through a tag-invalidated [`QueryCache`]; writes go through the
//! [`MutationCoordinator`], which invalidates dependent queries before it
//! returns. Every component works against any [`backendify_core::RemoteApi`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cache;
pub mod form;
pub mod lifetime;
pub mod mapper;
pub mod mutations;
pub mod queries;
pub mod registry;
pub mod relations;
pub mod session;
pub mod table;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cache::QueryCache;
pub use form::ControlKind;
pub use form::ControlSpec;
pub use form::FormError;
pub use form::FormValue;
pub use form::RecordForm;
pub use form::SubmitMode;
pub use form::build_input_schema;
pub use lifetime::ViewLifetime;
pub use lifetime::ViewToken;
pub use mapper::apply_server_error;
pub use mutations::DeletedRecord;
pub use mutations::MutationCoordinator;
pub use mutations::RecordWriteError;
pub use mutations::SchemaWriteError;
pub use queries::DataQueries;
pub use registry::SchemaRegistry;
pub use relations::ChoiceStatus;
pub use relations::RelationCandidate;
pub use relations::RelationChoices;
pub use relations::RelationResolver;
pub use relations::build_preview;
pub use session::ConsoleSession;
pub use table::ConfirmedDelete;
pub use table::DeleteRequest;
pub use table::MISSING_PLACEHOLDER;
pub use table::RecordTable;
pub use table::TableColumn;
pub use table::TableRow;
pub use telemetry::ClientEvent;
pub use telemetry::ClientEventSink;
pub use telemetry::FileEventSink;
pub use telemetry::NoopEventSink;
pub use telemetry::QueryOutcome;
pub use telemetry::StderrEventSink;
