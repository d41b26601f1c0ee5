// crates/backendify-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Parses and runs CLI commands against the in-memory service.
// Purpose: Validate command output, prompts, and error reporting.
// Dependencies: backendify-cli, backendify-client, tokio
// ============================================================================

//! ## Overview
//! Parses and runs CLI commands against the in-memory service to validate
//! command output, prompts, and error reporting.

#![allow(dead_code, reason = "Common module may have unused helpers.")]
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use backendify_cli::Cli;
use backendify_core::OnDeleteAction;
use clap::Parser;

use crate::common::blog_harness;

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn command_tree_parses_global_flags_anywhere() {
    let cli = Cli::try_parse_from([
        "backendify", "records", "list", "posts", "--project", "p9", "--limit", "5",
    ])
    .unwrap();
    assert_eq!(cli.project.as_deref(), Some("p9"));
    let no_event = ["backendify", "webhooks", "create", "--name", "n", "--url", "https://x.io"];
    assert!(Cli::try_parse_from(no_event).is_err());
    assert!(
        Cli::try_parse_from([
            "backendify", "webhooks", "create", "--name", "n", "--url", "https://x.io", "--event",
            "record.moved",
        ])
        .is_err()
    );
    let bad_type = ["backendify", "fields", "create", "posts", "--name", "x", "--type", "blob"];
    assert!(Cli::try_parse_from(bad_type).is_err());
}

// ============================================================================
// SECTION: Schema
// ============================================================================

#[tokio::test]
async fn collections_and_fields_are_listed_and_created() {
    let harness = blog_harness(OnDeleteAction::SetNull).await;
    let listed = harness.ok(&["collections", "list"]).await;
    assert!(listed.contains("categories  Categories"));
    assert!(listed.contains("posts  Posts"));

    let created = harness.ok(&["collections", "create", "tags", "--display-name", "Tags"]).await;
    assert!(created.starts_with("created collection tags"));
    assert!(harness.ok(&["collections", "list"]).await.contains("tags  Tags"));

    harness.ok(&["fields", "create", "posts", "--name", "published", "--type", "bool"]).await;
    let fields = harness.ok(&["fields", "list", "posts"]).await;
    let lines: Vec<&str> = fields.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("title  Title  string"));
    assert!(lines[0].ends_with("required"));
    assert!(lines[2].starts_with("category  Category  relation -> categories (SET NULL)"));
    assert!(lines[3].starts_with("published  published  bool"));
}

#[tokio::test]
async fn bad_collection_name_fails_locally() {
    let harness = blog_harness(OnDeleteAction::SetNull).await;
    let before = harness.api.request_count();
    let outcome = harness.run(&["collections", "create", "Tags"], "").await;
    assert!(outcome.result.unwrap_err().message().starts_with("invalid input"));
    assert_eq!(harness.api.request_count(), before);
}

#[tokio::test]
async fn relations_commands_show_both_directions_and_options() {
    let harness = blog_harness(OnDeleteAction::SetNull).await;
    let owned = harness.ok(&["relations", "list", "posts"]).await;
    assert_eq!(owned.trim(), "posts.category -> categories  many_to_one  on delete SET NULL");
    let reverse = harness.ok(&["relations", "reverse", "categories"]).await;
    assert_eq!(reverse.trim(), "posts.category -> categories");
    let options = harness.ok(&["relations", "options"]).await;
    assert!(options.contains("Many to One"));
    assert!(options.contains("Set reference to null"));
}

#[tokio::test]
async fn relation_create_refuses_self_reference() {
    let harness = blog_harness(OnDeleteAction::SetNull).await;
    let outcome = harness
        .run(&["relations", "create", "posts", "--name", "parent", "--target", "posts"], "")
        .await;
    assert!(outcome.result.is_err());
    let created = harness
        .ok(&[
            "relations", "create", "categories", "--name", "featured", "--target", "posts",
            "--on-delete", "cascade",
        ])
        .await;
    assert!(created.starts_with("created relation categories.featured -> posts"));
    let reverse = harness.ok(&["relations", "reverse", "posts"]).await;
    assert_eq!(reverse.trim(), "categories.featured -> posts");
}

// ============================================================================
// SECTION: Records
// ============================================================================

#[tokio::test]
async fn records_create_then_list_shows_the_row() {
    let harness = blog_harness(OnDeleteAction::SetNull).await;
    let created = harness.ok(&["records", "create", "categories", "--set", "name=Tech"]).await;
    assert!(created.starts_with("created categories #1"));
    harness
        .ok(&[
            "records", "create", "posts", "--set", "title=Hello", "--set", "views=3", "--set",
            "category=1",
        ])
        .await;

    let listed = harness.ok(&["records", "list", "posts"]).await;
    let lines: Vec<&str> = listed.lines().collect();
    assert!(lines[0].starts_with("id  Title"));
    assert!(lines[2].starts_with("1   Hello  3"));
    assert_eq!(lines.last().copied(), Some("1 of 1 records"));

    let filtered = harness.ok(&["records", "list", "posts", "--filter", "views__gt=5"]).await;
    assert!(filtered.ends_with("0 of 0 records\n"));
}

#[tokio::test]
async fn missing_required_field_prints_errors_without_a_request() {
    let harness = blog_harness(OnDeleteAction::SetNull).await;
    harness.ok(&["fields", "list", "posts"]).await;
    let before = harness.api.request_count();

    let outcome = harness.run(&["records", "create", "posts", "--set", "views=many"], "").await;

    assert_eq!(outcome.result.unwrap_err().message(), "record rejected");
    assert!(outcome.stdout.contains("  title: This field is required"));
    assert!(outcome.stdout.contains("  views: Must be a whole number"));
    assert_eq!(harness.api.request_count(), before);
}

#[tokio::test]
async fn show_choices_lists_relation_candidates() {
    let harness = blog_harness(OnDeleteAction::SetNull).await;
    harness.ok(&["records", "create", "categories", "--set", "name=Tech"]).await;
    let output = harness
        .ok(&[
            "records", "create", "posts", "--set", "title=Rust", "--set", "category=1",
            "--show-choices",
        ])
        .await;
    assert!(output.starts_with("category -> categories:\n  #1: Tech\n"));
    let fetched = harness.ok(&["records", "get", "posts", "1"]).await;
    assert!(fetched.contains("\"category_id\": 1"));
}

#[tokio::test]
async fn update_patches_only_assigned_fields() {
    let harness = blog_harness(OnDeleteAction::SetNull).await;
    harness.ok(&["records", "create", "posts", "--set", "title=Draft", "--set", "views=1"]).await;
    let updated = harness.ok(&["records", "update", "posts", "1", "--set", "views=2"]).await;
    assert!(updated.starts_with("updated posts #1"));
    assert!(updated.contains("\"title\": \"Draft\""));
    assert!(updated.contains("\"views\": 2"));
}

#[tokio::test]
async fn delete_requires_confirmation() {
    let harness = blog_harness(OnDeleteAction::SetNull).await;
    harness.ok(&["records", "create", "categories", "--set", "name=Tech"]).await;

    let declined = harness.run(&["records", "delete", "categories", "1"], "n\n").await;
    assert!(declined.result.is_ok());
    assert!(declined.stdout.starts_with("Delete categories #1? [y/N] "));
    assert!(declined.stdout.ends_with("aborted\n"));
    assert!(harness.ok(&["records", "list", "categories"]).await.ends_with("1 of 1 records\n"));

    let accepted = harness.run(&["records", "delete", "categories", "1"], "yes\n").await;
    assert!(accepted.result.is_ok());
    assert!(accepted.stdout.ends_with("deleted categories #1\n"));
    assert!(harness.ok(&["records", "list", "categories"]).await.ends_with("0 of 0 records\n"));
}

#[tokio::test]
async fn restricted_delete_reports_the_conflict() {
    let harness = blog_harness(OnDeleteAction::Restrict).await;
    harness.ok(&["records", "create", "categories", "--set", "name=Tech"]).await;
    harness
        .ok(&["records", "create", "posts", "--set", "title=Pinned", "--set", "category=1"])
        .await;

    let outcome = harness.run(&["records", "delete", "categories", "1", "--yes"], "").await;

    let message = outcome.result.unwrap_err().message().to_string();
    assert!(message.contains("409"));
    assert!(message.contains("RESTRICT"));
}

// ============================================================================
// SECTION: Webhooks
// ============================================================================

#[tokio::test]
async fn webhook_secret_is_printed_only_on_create() {
    let harness = blog_harness(OnDeleteAction::SetNull).await;
    let created = harness
        .ok(&[
            "webhooks", "create", "--name", "notify", "--url", "https://hooks.example.com/in",
            "--event", "record.created",
        ])
        .await;
    assert!(created.contains("secret: whsec_"));

    let listed = harness.ok(&["webhooks", "list"]).await;
    assert!(listed.contains("notify  https://hooks.example.com/in  [record.created]  active"));
    assert!(!listed.contains("whsec_"));

    harness.ok(&["records", "create", "categories", "--set", "name=Tech"]).await;
    let id = listed.split_whitespace().next().unwrap().to_string();
    let deliveries = harness.ok(&["webhooks", "deliveries", &id]).await;
    assert!(deliveries.contains("record.created"));

    assert!(harness.ok(&["webhooks", "delete", &id]).await.starts_with("deleted webhook"));
    assert_eq!(harness.ok(&["webhooks", "list"]).await, "");
}

// ============================================================================
// SECTION: Validation Rules
// ============================================================================

#[tokio::test]
async fn rules_are_created_listed_and_enforced_on_dry_run() {
    let harness = blog_harness(OnDeleteAction::SetNull).await;
    let created = harness
        .ok(&[
            "rules", "create", "posts", "title", "--type", "min_length", "--config", "min=5",
            "--priority", "2",
        ])
        .await;
    assert!(created.starts_with("created rule "));
    let id = created.split_whitespace().nth(2).unwrap().to_string();

    let listed = harness.ok(&["rules", "list", "posts", "title"]).await;
    assert!(listed.contains(&format!("{id}  min_length  priority=2  active")));
    assert!(listed.contains(r#"{"min":5}"#));

    let outcome = harness.run(&["rules", "validate", "posts", "--set", "title=Hi"], "").await;
    assert!(outcome.result.is_err());
    assert!(outcome.stdout.contains("title: Must be at least 5 characters"));
    let valid = harness.ok(&["rules", "validate", "posts", "--set", "title=Hello world"]).await;
    assert_eq!(valid, "valid\n");

    harness.ok(&["rules", "update", "posts", &id, "--active", "false"]).await;
    let inactive = harness.ok(&["rules", "validate", "posts", "--set", "title=Hi"]).await;
    assert_eq!(inactive, "valid\n");
    harness.ok(&["rules", "delete", "posts", &id]).await;
    assert!(harness.ok(&["rules", "list", "posts", "title"]).await.is_empty());
}

#[tokio::test]
async fn rule_for_the_wrong_field_type_fails_locally() {
    let harness = blog_harness(OnDeleteAction::SetNull).await;
    let before = harness.api.request_count();

    let outcome = harness.run(&["rules", "create", "posts", "views", "--type", "email"], "").await;

    assert!(outcome.result.unwrap_err().message().contains("email"));
    assert_eq!(harness.api.request_count(), before + 1);
    let unknown_type = ["backendify", "rules", "create", "posts", "title", "--type", "phone"];
    assert!(Cli::try_parse_from(unknown_type).is_err());
    let types = harness.ok(&["rules", "types"]).await;
    assert!(types.contains("min_length  applies to string  config [min:int]"));
}

#[tokio::test]
async fn relation_value_is_matched_against_listed_candidates() {
    let harness = blog_harness(OnDeleteAction::SetNull).await;
    harness.ok(&["records", "create", "categories", "--set", "name=Tech"]).await;

    let created = harness
        .ok(&["records", "create", "posts", "--set", "title=Hello", "--set", "category=1"])
        .await;

    assert!(created.contains("\"category_id\": 1"));
}
