// crates/backendify-cli/src/cli.rs
// ============================================================================
// Module: CLI Definitions
// Description: clap command tree for the backendify binary.
// Purpose: Declare every command, argument, and default in one place.
// Dependencies: clap, backendify-core
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use backendify_core::OnDeleteAction;
use backendify_core::RuleType;
use backendify_core::ScalarType;
use backendify_core::WebhookEvent;
use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

use crate::args::parse_event;
use crate::args::parse_rule_type;

// ============================================================================
// SECTION: Top Level
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "backendify", version, about = "Schema-aware data client for Backendify projects")]
pub struct Cli {
    /// Optional config file path (defaults to backendify.toml or env override).
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
    /// Project identifier (overrides `project.default_id`).
    #[arg(long, value_name = "PROJECT", global = true)]
    pub project: Option<String>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collection schema utilities.
    Collections {
        /// Selected collections subcommand.
        #[command(subcommand)]
        command: CollectionsCommand,
    },
    /// Field schema utilities.
    Fields {
        /// Selected fields subcommand.
        #[command(subcommand)]
        command: FieldsCommand,
    },
    /// Record data utilities.
    Records {
        /// Selected records subcommand.
        #[command(subcommand)]
        command: RecordsCommand,
    },
    /// Relation schema utilities.
    Relations {
        /// Selected relations subcommand.
        #[command(subcommand)]
        command: RelationsCommand,
    },
    /// Field validation rule utilities.
    Rules {
        /// Selected rules subcommand.
        #[command(subcommand)]
        command: RulesCommand,
    },
    /// Webhook utilities.
    Webhooks {
        /// Selected webhooks subcommand.
        #[command(subcommand)]
        command: WebhooksCommand,
    },
}

// ============================================================================
// SECTION: Collections and Fields
// ============================================================================

/// Collections subcommands.
#[derive(Subcommand, Debug)]
pub enum CollectionsCommand {
    /// List collections.
    List,
    /// Create a collection.
    Create(CollectionCreateCommand),
}

/// Arguments for `collections create`.
#[derive(Args, Debug)]
pub struct CollectionCreateCommand {
    /// Machine name (lowercase letters, digits, underscores).
    pub name: String,
    /// Display name (defaults to the machine name).
    #[arg(long, value_name = "TEXT")]
    pub display_name: Option<String>,
}

/// Fields subcommands.
#[derive(Subcommand, Debug)]
pub enum FieldsCommand {
    /// List the fields of a collection.
    List {
        /// Collection machine name.
        collection: String,
    },
    /// Add a scalar field to a collection.
    Create(FieldCreateCommand),
}

/// Scalar field types accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldTypeArg {
    /// Short text.
    String,
    /// Long text.
    Text,
    /// Whole number.
    Int,
    /// Decimal number.
    Float,
    /// Boolean.
    Bool,
    /// Calendar date.
    Date,
    /// Date and time.
    Datetime,
    /// UUID.
    Uuid,
}

impl From<FieldTypeArg> for ScalarType {
    fn from(arg: FieldTypeArg) -> Self {
        match arg {
            FieldTypeArg::String => Self::String,
            FieldTypeArg::Text => Self::Text,
            FieldTypeArg::Int => Self::Int,
            FieldTypeArg::Float => Self::Float,
            FieldTypeArg::Bool => Self::Bool,
            FieldTypeArg::Date => Self::Date,
            FieldTypeArg::Datetime => Self::DateTime,
            FieldTypeArg::Uuid => Self::Uuid,
        }
    }
}

/// Arguments for `fields create`.
#[derive(Args, Debug)]
pub struct FieldCreateCommand {
    /// Collection machine name.
    pub collection: String,
    /// Field machine name.
    #[arg(long, value_name = "NAME")]
    pub name: String,
    /// Display name (defaults to the machine name).
    #[arg(long, value_name = "TEXT")]
    pub display_name: Option<String>,
    /// Field type.
    #[arg(long = "type", value_enum, value_name = "TYPE")]
    pub field_type: FieldTypeArg,
    /// Require a value on create.
    #[arg(long, action = ArgAction::SetTrue)]
    pub required: bool,
    /// Enforce unique values.
    #[arg(long, action = ArgAction::SetTrue)]
    pub unique: bool,
    /// Index the column.
    #[arg(long, action = ArgAction::SetTrue)]
    pub indexed: bool,
    /// Server-side default value.
    #[arg(long, value_name = "VALUE")]
    pub default: Option<String>,
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Records subcommands.
#[derive(Subcommand, Debug)]
pub enum RecordsCommand {
    /// List one page of records as a table.
    List(RecordListCommand),
    /// Fetch one record as JSON.
    Get {
        /// Collection machine name.
        collection: String,
        /// Record identifier.
        id: String,
    },
    /// Create a record from `--set name=value` assignments.
    Create(RecordCreateCommand),
    /// Update the assigned fields of a record.
    Update(RecordUpdateCommand),
    /// Delete a record after confirmation.
    Delete(RecordDeleteCommand),
}

/// Arguments for `records list`.
#[derive(Args, Debug)]
pub struct RecordListCommand {
    /// Collection machine name.
    pub collection: String,
    /// Page size (defaults to `console.page_size`).
    #[arg(long, value_name = "N")]
    pub limit: Option<u32>,
    /// Page offset.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub offset: u32,
    /// Sort key, `field` or `-field`; repeatable.
    #[arg(long, value_name = "FIELD")]
    pub sort: Vec<String>,
    /// Filter, `field=value` or `field__op=value`; repeatable.
    #[arg(long, value_name = "FILTER")]
    pub filter: Vec<String>,
}

/// Arguments for `records create`.
#[derive(Args, Debug)]
pub struct RecordCreateCommand {
    /// Collection machine name.
    pub collection: String,
    /// Field assignment, `name=value`; repeatable.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,
    /// Print relation candidates before submitting.
    #[arg(long, action = ArgAction::SetTrue)]
    pub show_choices: bool,
}

/// Arguments for `records update`.
#[derive(Args, Debug)]
pub struct RecordUpdateCommand {
    /// Collection machine name.
    pub collection: String,
    /// Record identifier.
    pub id: String,
    /// Field assignment, `name=value`; repeatable.
    #[arg(long = "set", value_name = "NAME=VALUE", required = true)]
    pub set: Vec<String>,
}

/// Arguments for `records delete`.
#[derive(Args, Debug)]
pub struct RecordDeleteCommand {
    /// Collection machine name.
    pub collection: String,
    /// Record identifier.
    pub id: String,
    /// Skip the confirmation prompt.
    #[arg(long, action = ArgAction::SetTrue)]
    pub yes: bool,
}

// ============================================================================
// SECTION: Relations
// ============================================================================

/// Relations subcommands.
#[derive(Subcommand, Debug)]
pub enum RelationsCommand {
    /// List the relation fields a collection owns.
    List {
        /// Collection machine name.
        collection: String,
    },
    /// List relation fields of other collections that target this one.
    Reverse {
        /// Collection machine name.
        collection: String,
    },
    /// Add a relation field to a collection.
    Create(RelationCreateCommand),
    /// Show supported relation types and on-delete actions.
    Options,
}

/// On-delete actions accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnDeleteArg {
    /// Block deletion while references exist.
    Restrict,
    /// Delete referencing records.
    Cascade,
    /// Null out the reference.
    SetNull,
}

impl From<OnDeleteArg> for OnDeleteAction {
    fn from(arg: OnDeleteArg) -> Self {
        match arg {
            OnDeleteArg::Restrict => Self::Restrict,
            OnDeleteArg::Cascade => Self::Cascade,
            OnDeleteArg::SetNull => Self::SetNull,
        }
    }
}

/// Arguments for `relations create`.
#[derive(Args, Debug)]
pub struct RelationCreateCommand {
    /// Owning collection machine name.
    pub collection: String,
    /// Relation field machine name.
    #[arg(long, value_name = "NAME")]
    pub name: String,
    /// Display name (defaults to the machine name).
    #[arg(long, value_name = "TEXT")]
    pub display_name: Option<String>,
    /// Target collection machine name.
    #[arg(long, value_name = "COLLECTION")]
    pub target: String,
    /// Action applied to referencing records when a target is deleted.
    #[arg(long, value_enum, value_name = "ACTION", default_value_t = OnDeleteArg::Restrict)]
    pub on_delete: OnDeleteArg,
    /// Require a value on create.
    #[arg(long, action = ArgAction::SetTrue)]
    pub required: bool,
    /// Target field shown when displaying the relation.
    #[arg(long, value_name = "FIELD")]
    pub display_field: Option<String>,
}

// ============================================================================
// SECTION: Validation Rules
// ============================================================================

/// Rules subcommands.
#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// List the rules of one field, lowest priority first.
    List {
        /// Collection machine name.
        collection: String,
        /// Field machine name.
        field: String,
    },
    /// Attach a rule to a field.
    Create(RuleCreateCommand),
    /// Change a rule's config, message, priority, or activity.
    Update(RuleUpdateCommand),
    /// Delete a rule.
    Delete {
        /// Collection the rule's field belongs to.
        collection: String,
        /// Rule identifier.
        id: String,
    },
    /// Check `--set name=value` assignments against the rules without writing.
    Validate {
        /// Collection machine name.
        collection: String,
        /// Field assignment, `name=value`; repeatable.
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,
    },
    /// Show supported rule types and their config keys.
    Types,
}

/// Arguments for `rules create`.
#[derive(Args, Debug)]
pub struct RuleCreateCommand {
    /// Collection machine name.
    pub collection: String,
    /// Field machine name.
    pub field: String,
    /// Rule type, for example `min_length` or `email`.
    #[arg(long = "type", value_name = "TYPE", value_parser = parse_rule_type)]
    pub rule_type: RuleType,
    /// Config entry, `key=value` with a JSON or plain text value; repeatable.
    #[arg(long, value_name = "KEY=VALUE")]
    pub config: Vec<String>,
    /// Message reported instead of the rule's default.
    #[arg(long, value_name = "TEXT")]
    pub message: Option<String>,
    /// Evaluation order; lower runs first.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub priority: i64,
}

/// Arguments for `rules update`.
#[derive(Args, Debug)]
pub struct RuleUpdateCommand {
    /// Collection the rule's field belongs to.
    pub collection: String,
    /// Rule identifier.
    pub id: String,
    /// Replacement config entry, `key=value`; repeatable.
    #[arg(long, value_name = "KEY=VALUE")]
    pub config: Vec<String>,
    /// Replacement message.
    #[arg(long, value_name = "TEXT")]
    pub message: Option<String>,
    /// Replacement priority.
    #[arg(long, value_name = "N")]
    pub priority: Option<i64>,
    /// Enable or disable the rule.
    #[arg(long, value_name = "BOOL")]
    pub active: Option<bool>,
}

// ============================================================================
// SECTION: Webhooks
// ============================================================================

/// Webhooks subcommands.
#[derive(Subcommand, Debug)]
pub enum WebhooksCommand {
    /// List webhooks.
    List,
    /// Create a webhook; its signing secret is printed once.
    Create(WebhookCreateCommand),
    /// Delete a webhook.
    Delete {
        /// Webhook identifier.
        id: String,
    },
    /// Show the delivery log of a webhook.
    Deliveries {
        /// Webhook identifier.
        id: String,
    },
}

/// Arguments for `webhooks create`.
#[derive(Args, Debug)]
pub struct WebhookCreateCommand {
    /// Display name.
    #[arg(long, value_name = "NAME")]
    pub name: String,
    /// Delivery URL (http or https).
    #[arg(long, value_name = "URL")]
    pub url: String,
    /// Subscribed event; repeatable.
    #[arg(long = "event", value_name = "EVENT", required = true, value_parser = parse_event)]
    pub events: Vec<WebhookEvent>,
}
