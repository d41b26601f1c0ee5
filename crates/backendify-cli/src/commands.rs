// crates/backendify-cli/src/commands.rs
// ============================================================================
// Module: CLI Command Execution
// Description: Runs parsed commands against a console session.
// Purpose: Map each subcommand onto registry, query, and mutation calls.
// Dependencies: backendify-console, backendify-core, serde_json
// ============================================================================

//! ## Overview
//! Output goes through a [`Terminal`] so commands can be driven with in-memory
//! buffers. Record writes run through the console form and coordinator, which
//! means local validation happens before any request and server validation
//! errors are printed per field.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::BufRead;
use std::io::Write;

use backendify_console::ConsoleSession;
use backendify_console::DeleteRequest;
use backendify_console::RecordForm;
use backendify_console::RecordTable;
use backendify_console::RecordWriteError;
use backendify_console::RelationChoices;
use backendify_console::SchemaWriteError;
use backendify_console::SubmitMode;
use backendify_core::Collection;
use backendify_core::Field;
use backendify_core::FieldKind;
use backendify_core::NewField;
use backendify_core::NewRelationField;
use backendify_core::NewValidationRule;
use backendify_core::NewWebhook;
use backendify_core::Record;
use backendify_core::RecordId;
use backendify_core::RelationOption;
use backendify_core::RuleId;
use backendify_core::RulePatch;
use backendify_core::SubscribedEvent;
use backendify_core::ValidationErrorSet;
use backendify_core::ValidationRule;
use backendify_core::WebhookId;
use serde::Serialize;

use crate::args::build_query;
use crate::args::is_confirmation;
use crate::args::parse_assignment;
use crate::args::parse_config;
use crate::cli::CollectionCreateCommand;
use crate::cli::CollectionsCommand;
use crate::cli::Command;
use crate::cli::FieldCreateCommand;
use crate::cli::FieldsCommand;
use crate::cli::RecordCreateCommand;
use crate::cli::RecordDeleteCommand;
use crate::cli::RecordListCommand;
use crate::cli::RecordUpdateCommand;
use crate::cli::RecordsCommand;
use crate::cli::RelationCreateCommand;
use crate::cli::RelationsCommand;
use crate::cli::RuleCreateCommand;
use crate::cli::RuleUpdateCommand;
use crate::cli::RulesCommand;
use crate::cli::WebhookCreateCommand;
use crate::cli::WebhooksCommand;
use crate::error::CliError;
use crate::error::CliResult;
use crate::error::output_error;

// ============================================================================
// SECTION: Terminal
// ============================================================================

/// Output and confirmation streams for one command.
pub struct Terminal<'a> {
    /// Command output.
    out: &'a mut dyn Write,
    /// Confirmation answers.
    input: &'a mut dyn BufRead,
}

impl<'a> Terminal<'a> {
    /// Wraps output and input streams.
    pub fn new(out: &'a mut dyn Write, input: &'a mut dyn BufRead) -> Self {
        Self {
            out,
            input,
        }
    }

    /// Writes one line.
    fn line(&mut self, message: &str) -> CliResult<()> {
        writeln!(self.out, "{message}").map_err(|err| output_error("stdout", &err))
    }

    /// Writes preformatted text as is.
    fn text(&mut self, text: &str) -> CliResult<()> {
        self.out.write_all(text.as_bytes()).map_err(|err| output_error("stdout", &err))
    }

    /// Writes a value as pretty JSON.
    fn json<T: Serialize>(&mut self, value: &T) -> CliResult<()> {
        let rendered = serde_json::to_string_pretty(value)
            .map_err(|err| CliError::new(format!("failed to render json: {err}")))?;
        self.line(&rendered)
    }

    /// Prompts for a yes/no answer; anything but yes declines.
    fn confirm(&mut self, prompt: &str) -> CliResult<bool> {
        write!(self.out, "{prompt} [y/N] ").map_err(|err| output_error("stdout", &err))?;
        self.out.flush().map_err(|err| output_error("stdout", &err))?;
        let mut answer = String::new();
        self.input
            .read_line(&mut answer)
            .map_err(|err| CliError::new(format!("failed to read confirmation: {err}")))?;
        Ok(is_confirmation(&answer))
    }
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Executes one command.
///
/// # Errors
///
/// Returns [`CliError`] when the command fails; rejected record writes have
/// already printed their per-field errors.
pub async fn execute(
    command: Command,
    session: &ConsoleSession,
    terminal: &mut Terminal<'_>,
) -> CliResult<()> {
    match command {
        Command::Collections {
            command,
        } => command_collections(command, session, terminal).await,
        Command::Fields {
            command,
        } => command_fields(command, session, terminal).await,
        Command::Records {
            command,
        } => command_records(command, session, terminal).await,
        Command::Relations {
            command,
        } => command_relations(command, session, terminal).await,
        Command::Rules {
            command,
        } => command_rules(command, session, terminal).await,
        Command::Webhooks {
            command,
        } => command_webhooks(command, session, terminal).await,
    }
}

// ============================================================================
// SECTION: Collections and Fields
// ============================================================================

/// Executes `collections` subcommands.
async fn command_collections(
    command: CollectionsCommand,
    session: &ConsoleSession,
    terminal: &mut Terminal<'_>,
) -> CliResult<()> {
    match command {
        CollectionsCommand::List => {
            let collections = session.registry().list_collections().await?;
            for collection in &collections {
                let system = if collection.is_system { "  (system)" } else { "" };
                terminal.line(&format!(
                    "{}  {}  {}{system}",
                    collection.id, collection.name, collection.display_name
                ))?;
            }
            Ok(())
        }
        CollectionsCommand::Create(CollectionCreateCommand {
            name,
            display_name,
        }) => {
            let display_name = display_name.unwrap_or_else(|| name.clone());
            let created = session
                .coordinator()
                .create_collection(&name, &display_name)
                .await
                .map_err(schema_error)?;
            terminal.line(&format!("created collection {} ({})", created.name, created.id))
        }
    }
}

/// Executes `fields` subcommands.
async fn command_fields(
    command: FieldsCommand,
    session: &ConsoleSession,
    terminal: &mut Terminal<'_>,
) -> CliResult<()> {
    match command {
        FieldsCommand::List {
            collection,
        } => {
            let registry = session.registry();
            let fields = registry.list_fields(&collection).await?;
            let collections = registry.list_collections().await?;
            for field in &fields {
                let mut line =
                    format!("{}  {}  {}", field.name, field.display_name, field.type_label());
                if let FieldKind::Relation(spec) = &field.kind {
                    let target = collection_name(&collections, spec.target_collection_id.as_str());
                    line.push_str(&format!(" -> {target} ({})", spec.on_delete.as_str()));
                }
                if field.is_required {
                    line.push_str("  required");
                }
                if field.is_unique {
                    line.push_str("  unique");
                }
                terminal.line(&line)?;
            }
            Ok(())
        }
        FieldsCommand::Create(command) => create_field(command, session, terminal).await,
    }
}

/// Executes `fields create`.
async fn create_field(
    command: FieldCreateCommand,
    session: &ConsoleSession,
    terminal: &mut Terminal<'_>,
) -> CliResult<()> {
    let display_name = command.display_name.unwrap_or_else(|| command.name.clone());
    let mut payload = NewField::new(command.name, display_name, command.field_type.into())?
        .required(command.required);
    payload.is_unique = command.unique;
    payload.is_indexed = command.indexed;
    payload.default_value = command.default;
    let created = session
        .coordinator()
        .create_field(&command.collection, &payload)
        .await
        .map_err(schema_error)?;
    terminal.line(&format!(
        "created field {}.{} ({})",
        command.collection, created.name, created.id
    ))
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Executes `records` subcommands.
async fn command_records(
    command: RecordsCommand,
    session: &ConsoleSession,
    terminal: &mut Terminal<'_>,
) -> CliResult<()> {
    match command {
        RecordsCommand::List(command) => list_records(command, session, terminal).await,
        RecordsCommand::Get {
            collection,
            id,
        } => {
            let record = session.queries().get_record(&collection, &RecordId::parse(&id)).await?;
            terminal.json(&record)
        }
        RecordsCommand::Create(command) => create_record(command, session, terminal).await,
        RecordsCommand::Update(command) => update_record(command, session, terminal).await,
        RecordsCommand::Delete(command) => delete_record(command, session, terminal).await,
    }
}

/// Executes `records list`.
async fn list_records(
    command: RecordListCommand,
    session: &ConsoleSession,
    terminal: &mut Terminal<'_>,
) -> CliResult<()> {
    let settings = session.settings();
    let limit = command.limit.unwrap_or(settings.page_size);
    let query = build_query(limit, command.offset, &command.sort, &command.filter)?;
    let fields = session.registry().list_fields(&command.collection).await?;
    let page = session.queries().list_records(&command.collection, &query).await?;
    let table = RecordTable::render(&command.collection, &fields, &page, settings.max_cell_chars);
    terminal.text(&table.to_text())?;
    terminal.line(&format!("{} of {} records", table.rows().len(), table.total()))
}

/// Builds a form for `collection` filled from `--set` assignments.
///
/// Relation values are matched against the field's candidates first.
async fn filled_form(
    collection: &str,
    assignments: &[String],
    session: &ConsoleSession,
) -> CliResult<(RecordForm, Vec<Field>)> {
    let fields = session.registry().list_fields(collection).await?;
    let mut form = RecordForm::new(&fields);
    for raw in assignments {
        let assignment = parse_assignment(raw)?;
        let relation = fields
            .iter()
            .find(|field| field.name == assignment.field && field.is_relation());
        let set = match relation {
            Some(field) => {
                let collections = session.registry().list_collections().await?;
                let choices = session.resolver().resolve(field, &collections).await;
                form.set_choice_input(&assignment.field, &assignment.value, &choices.candidates)
            }
            None => form.set_input(&assignment.field, &assignment.value),
        };
        set.map_err(|err| CliError::new(format!("{err} (collection {collection})")))?;
    }
    Ok((form, fields))
}

/// Executes `records create`.
async fn create_record(
    command: RecordCreateCommand,
    session: &ConsoleSession,
    terminal: &mut Terminal<'_>,
) -> CliResult<()> {
    let (mut form, fields) = filled_form(&command.collection, &command.set, session).await?;
    if command.show_choices {
        let collections = session.registry().list_collections().await?;
        for choices in session.resolver().resolve_all(&fields, &collections).await {
            write_choices(terminal, &choices)?;
        }
    }
    let result = session.coordinator().submit_create(&command.collection, &mut form).await;
    let record = written_record(terminal, result)?;
    terminal.line(&format!("created {} #{}", command.collection, record.id))?;
    terminal.json(&record)
}

/// Executes `records update`.
async fn update_record(
    command: RecordUpdateCommand,
    session: &ConsoleSession,
    terminal: &mut Terminal<'_>,
) -> CliResult<()> {
    let (mut form, _) = filled_form(&command.collection, &command.set, session).await?;
    let id = RecordId::parse(&command.id);
    let result = session.coordinator().submit_update(&command.collection, &id, &mut form).await;
    let record = written_record(terminal, result)?;
    terminal.line(&format!("updated {} #{}", command.collection, record.id))?;
    terminal.json(&record)
}

/// Executes `records delete`.
async fn delete_record(
    command: RecordDeleteCommand,
    session: &ConsoleSession,
    terminal: &mut Terminal<'_>,
) -> CliResult<()> {
    let request = DeleteRequest::new(command.collection, RecordId::parse(&command.id));
    if !command.yes {
        let prompt = format!("Delete {} #{}?", request.collection(), request.id());
        if !terminal.confirm(&prompt)? {
            return terminal.line("aborted");
        }
    }
    let deleted =
        session.coordinator().delete_record(request.confirm()).await.map_err(|err| match err {
            RecordWriteError::Failed(api) => CliError::from(api),
            RecordWriteError::Rejected(_) => CliError::new("delete rejected"),
        })?;
    terminal.line(&format!("deleted {} #{}", deleted.collection(), deleted.id()))
}

/// Unwraps a record write, printing per-field errors on rejection.
fn written_record(
    terminal: &mut Terminal<'_>,
    result: Result<Record, RecordWriteError>,
) -> CliResult<Record> {
    match result {
        Ok(record) => Ok(record),
        Err(RecordWriteError::Rejected(errors)) => {
            write_validation_errors(terminal, &errors)?;
            Err(CliError::new("record rejected"))
        }
        Err(RecordWriteError::Failed(api)) => Err(api.into()),
    }
}

/// Prints one line per field violation.
fn write_validation_errors(
    terminal: &mut Terminal<'_>,
    errors: &ValidationErrorSet,
) -> CliResult<()> {
    for (field, messages) in errors.iter() {
        for message in messages {
            terminal.line(&format!("  {field}: {message}"))?;
        }
    }
    Ok(())
}

/// Prints the candidate list of one relation control.
fn write_choices(terminal: &mut Terminal<'_>, choices: &RelationChoices) -> CliResult<()> {
    if let Some(label) = choices.status.label() {
        return terminal.line(&format!("{}: {label}", choices.field));
    }
    let target = choices.target.as_ref().map_or("?", |target| target.name.as_str());
    terminal.line(&format!("{} -> {target}:", choices.field))?;
    for candidate in &choices.candidates {
        terminal.line(&format!("  {candidate}"))?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Relations
// ============================================================================

/// Executes `relations` subcommands.
async fn command_relations(
    command: RelationsCommand,
    session: &ConsoleSession,
    terminal: &mut Terminal<'_>,
) -> CliResult<()> {
    let registry = session.registry();
    match command {
        RelationsCommand::List {
            collection,
        } => {
            let owner = require_collection(session, &collection).await?;
            let collections = registry.list_collections().await?;
            for field in registry.list_relation_fields(&owner.id).await? {
                if let Some(spec) = field.relation() {
                    let target = collection_name(&collections, spec.target_collection_id.as_str());
                    terminal.line(&format!(
                        "{}.{} -> {target}  {}  on delete {}",
                        owner.name,
                        field.name,
                        spec.relation_type.as_str(),
                        spec.on_delete.as_str()
                    ))?;
                }
            }
            Ok(())
        }
        RelationsCommand::Reverse {
            collection,
        } => {
            let target = require_collection(session, &collection).await?;
            for edge in registry.list_reverse_relations(&target.id).await? {
                terminal.line(&format!("{} -> {}", edge.edge_label(), target.name))?;
            }
            Ok(())
        }
        RelationsCommand::Create(command) => create_relation(command, session, terminal).await,
        RelationsCommand::Options => {
            let options = registry.relation_options().await?;
            terminal.line("relation types:")?;
            write_options(terminal, &options.relation_types)?;
            terminal.line("on delete actions:")?;
            write_options(terminal, &options.on_delete_actions)
        }
    }
}

/// Executes `relations create`.
async fn create_relation(
    command: RelationCreateCommand,
    session: &ConsoleSession,
    terminal: &mut Terminal<'_>,
) -> CliResult<()> {
    let owner = require_collection(session, &command.collection).await?;
    let target = require_collection(session, &command.target).await?;
    let display_name = command.display_name.unwrap_or_else(|| command.name.clone());
    let mut payload = NewRelationField::new(command.name, display_name, target.id.clone())?;
    payload.on_delete = command.on_delete.into();
    payload.is_required = command.required;
    payload.display_field = command.display_field;
    let created = session
        .coordinator()
        .create_relation_field(&owner, &payload)
        .await
        .map_err(schema_error)?;
    terminal.line(&format!(
        "created relation {}.{} -> {} ({})",
        owner.name, created.name, target.name, created.id
    ))
}

/// Prints advertised relation options.
fn write_options(terminal: &mut Terminal<'_>, options: &[RelationOption]) -> CliResult<()> {
    for option in options {
        match &option.description {
            Some(description) => {
                terminal.line(&format!("  {}  {}  ({description})", option.value, option.label))?;
            }
            None => terminal.line(&format!("  {}  {}", option.value, option.label))?,
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Validation Rules
// ============================================================================

/// Executes `rules` subcommands.
async fn command_rules(
    command: RulesCommand,
    session: &ConsoleSession,
    terminal: &mut Terminal<'_>,
) -> CliResult<()> {
    match command {
        RulesCommand::List {
            collection,
            field,
        } => {
            for rule in session.registry().list_rules(&collection, &field).await? {
                write_rule(terminal, &rule)?;
            }
            Ok(())
        }
        RulesCommand::Create(command) => create_rule(command, session, terminal).await,
        RulesCommand::Update(command) => update_rule(command, session, terminal).await,
        RulesCommand::Delete {
            collection,
            id,
        } => {
            let id = RuleId::new(id);
            session.coordinator().delete_rule(&collection, &id).await.map_err(schema_error)?;
            terminal.line(&format!("deleted rule {id}"))
        }
        RulesCommand::Validate {
            collection,
            set,
        } => {
            let (mut form, _) = filled_form(&collection, &set, session).await?;
            let result = session
                .coordinator()
                .validate_form(&collection, &mut form, SubmitMode::Create)
                .await;
            match result {
                Ok(()) => terminal.line("valid"),
                Err(RecordWriteError::Rejected(errors)) => {
                    write_validation_errors(terminal, &errors)?;
                    Err(CliError::new("record invalid"))
                }
                Err(RecordWriteError::Failed(api)) => Err(api.into()),
            }
        }
        RulesCommand::Types => {
            for info in session.registry().rule_types().await? {
                let config: Vec<String> = info
                    .config_schema
                    .iter()
                    .map(|(key, kind)| format!("{key}:{}", kind.as_str().unwrap_or("?")))
                    .collect();
                terminal.line(&format!(
                    "{}  applies to {}  config [{}]",
                    info.rule_type,
                    info.applies_to.join(", "),
                    config.join(", ")
                ))?;
            }
            Ok(())
        }
    }
}

/// Executes `rules create`.
async fn create_rule(
    command: RuleCreateCommand,
    session: &ConsoleSession,
    terminal: &mut Terminal<'_>,
) -> CliResult<()> {
    let fields = session.registry().list_fields(&command.collection).await?;
    let field = fields.iter().find(|field| field.name == command.field).ok_or_else(|| {
        CliError::new(format!(
            "unknown field '{}' (collection {})",
            command.field, command.collection
        ))
    })?;
    let mut payload = NewValidationRule::new(command.rule_type)
        .with_config(parse_config(&command.config)?)?
        .with_priority(command.priority);
    if let Some(message) = command.message {
        payload = payload.with_message(message);
    }
    let created = session
        .coordinator()
        .create_rule(&command.collection, field, &payload)
        .await
        .map_err(schema_error)?;
    terminal.line(&format!(
        "created rule {} on {}.{}",
        created.id, command.collection, field.name
    ))?;
    write_rule(terminal, &created)
}

/// Executes `rules update`.
async fn update_rule(
    command: RuleUpdateCommand,
    session: &ConsoleSession,
    terminal: &mut Terminal<'_>,
) -> CliResult<()> {
    let config = parse_config(&command.config)?;
    let patch = RulePatch {
        config: (!config.is_empty()).then_some(config),
        error_message: command.message,
        priority: command.priority,
        is_active: command.active,
    };
    let id = RuleId::new(command.id);
    let updated = session
        .coordinator()
        .update_rule(&command.collection, &id, &patch)
        .await
        .map_err(schema_error)?;
    write_rule(terminal, &updated)
}

/// Prints one rule on a single line.
fn write_rule(terminal: &mut Terminal<'_>, rule: &ValidationRule) -> CliResult<()> {
    let state = if rule.is_active { "active" } else { "inactive" };
    let config = rule.config.as_ref().map_or_else(String::new, |config| {
        format!("  {}", serde_json::Value::Object(config.clone()))
    });
    let message =
        rule.error_message.as_ref().map_or_else(String::new, |message| format!("  \"{message}\""));
    terminal.line(&format!(
        "{}  {}  priority={}  {state}{config}{message}",
        rule.id, rule.rule_type, rule.priority
    ))
}

// ============================================================================
// SECTION: Webhooks
// ============================================================================

/// Executes `webhooks` subcommands.
async fn command_webhooks(
    command: WebhooksCommand,
    session: &ConsoleSession,
    terminal: &mut Terminal<'_>,
) -> CliResult<()> {
    match command {
        WebhooksCommand::List => {
            for webhook in session.queries().list_webhooks().await? {
                let events: Vec<&str> =
                    webhook.events.iter().map(SubscribedEvent::as_str).collect();
                let state = if webhook.is_active { "active" } else { "inactive" };
                terminal.line(&format!(
                    "{}  {}  {}  [{}]  {state}",
                    webhook.id,
                    webhook.name,
                    webhook.url,
                    events.join(", ")
                ))?;
            }
            Ok(())
        }
        WebhooksCommand::Create(WebhookCreateCommand {
            name,
            url,
            events,
        }) => {
            let payload = NewWebhook::new(name, &url, events)?;
            let created =
                session.coordinator().create_webhook(&payload).await.map_err(schema_error)?;
            terminal.line(&format!(
                "created webhook {} ({})",
                created.webhook.name, created.webhook.id
            ))?;
            terminal.line(&format!("secret: {}", created.secret.expose()))?;
            terminal.line("store this secret now; it will not be shown again")
        }
        WebhooksCommand::Delete {
            id,
        } => {
            let id = WebhookId::new(id);
            session.coordinator().delete_webhook(&id).await.map_err(schema_error)?;
            terminal.line(&format!("deleted webhook {id}"))
        }
        WebhooksCommand::Deliveries {
            id,
        } => {
            let id = WebhookId::new(id);
            for delivery in session.queries().list_deliveries(&id).await? {
                let response = delivery
                    .response_status
                    .map_or_else(|| "-".to_string(), |status| status.to_string());
                terminal.line(&format!(
                    "{}  {}  {}  attempts={}  response={response}",
                    delivery.id, delivery.event_type, delivery.status, delivery.attempts
                ))?;
            }
            Ok(())
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Looks up a collection by machine name.
async fn require_collection(session: &ConsoleSession, name: &str) -> CliResult<Collection> {
    session
        .registry()
        .find_collection_by_name(name)
        .await?
        .ok_or_else(|| CliError::new(format!("unknown collection '{name}'")))
}

/// Returns the name of a collection id, or the id itself when unknown.
fn collection_name<'a>(collections: &'a [Collection], id: &'a str) -> &'a str {
    collections
        .iter()
        .find(|collection| collection.id.as_str() == id)
        .map_or(id, |collection| collection.name.as_str())
}

/// Converts a schema write failure.
fn schema_error(err: SchemaWriteError) -> CliError {
    match err {
        SchemaWriteError::Invalid(model) => model.into(),
        SchemaWriteError::Api(api) => api.into(),
    }
}
