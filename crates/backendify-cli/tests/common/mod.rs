// crates/backendify-cli/tests/common/mod.rs
// ============================================================================
// Module: CLI Test Helpers
// Description: Runs parsed commands against a seeded in-memory service.
// Purpose: Drive the CLI end to end without a network or a spawned binary.
// Dependencies: backendify-cli, backendify-client, backendify-console
// ============================================================================

use std::io::Cursor;
use std::sync::Arc;

use backendify_cli::Cli;
use backendify_cli::CliResult;
use backendify_cli::Terminal;
use backendify_cli::execute;
use backendify_client::InMemoryApi;
use backendify_config::ConsoleConfig;
use backendify_console::ConsoleSession;
use backendify_console::NoopEventSink;
use backendify_core::NewCollection;
use backendify_core::NewField;
use backendify_core::NewRelationField;
use backendify_core::OnDeleteAction;
use backendify_core::ProjectId;
use backendify_core::RemoteApi;
use backendify_core::ScalarType;
use clap::Parser;

/// Seeded service plus a session over it.
pub struct Harness {
    /// Seeded in-memory service.
    pub api: InMemoryApi,
    /// Session over the service.
    pub session: ConsoleSession,
}

/// Output of one command run.
pub struct Outcome {
    /// Command result.
    pub result: CliResult<()>,
    /// Everything written to the terminal.
    pub stdout: String,
}

/// Seeds `categories(name)` and `posts(title, views, category -> categories)`.
pub async fn blog_harness(on_delete: OnDeleteAction) -> Harness {
    let api = InMemoryApi::new().with_project("p1");
    let p = ProjectId::new("p1");
    let categories = api
        .create_collection(&p, &NewCollection::new("categories", "Categories").unwrap())
        .await
        .unwrap();
    let name = NewField::new("name", "Name", ScalarType::String).unwrap().required(true);
    api.create_field(&p, "categories", &name).await.unwrap();
    let posts =
        api.create_collection(&p, &NewCollection::new("posts", "Posts").unwrap()).await.unwrap();
    let title = NewField::new("title", "Title", ScalarType::String).unwrap().required(true);
    api.create_field(&p, "posts", &title).await.unwrap();
    let views = NewField::new("views", "Views", ScalarType::Int).unwrap();
    api.create_field(&p, "posts", &views).await.unwrap();
    let mut relation =
        NewRelationField::new("category", "Category", categories.id.clone()).unwrap();
    relation.on_delete = on_delete;
    api.create_relation_field(&p, &posts.id, &relation).await.unwrap();
    let session = ConsoleSession::new(
        Arc::new(api.clone()),
        p,
        ConsoleConfig::default(),
        Arc::new(NoopEventSink),
    );
    Harness {
        api,
        session,
    }
}

impl Harness {
    /// Parses `args` and runs the command with `stdin` as confirmation input.
    pub async fn run(&self, args: &[&str], stdin: &str) -> Outcome {
        let argv = std::iter::once("backendify").chain(args.iter().copied());
        let cli = Cli::try_parse_from(argv).unwrap();
        let mut out: Vec<u8> = Vec::new();
        let mut input = Cursor::new(stdin.as_bytes().to_vec());
        let result = {
            let mut terminal = Terminal::new(&mut out, &mut input);
            execute(cli.command, &self.session, &mut terminal).await
        };
        Outcome {
            result,
            stdout: String::from_utf8(out).unwrap(),
        }
    }

    /// Runs a command that must succeed and returns its output.
    pub async fn ok(&self, args: &[&str]) -> String {
        let outcome = self.run(args, "").await;
        assert!(outcome.result.is_ok(), "{:?}\n{}", outcome.result, outcome.stdout);
        outcome.stdout
    }
}
