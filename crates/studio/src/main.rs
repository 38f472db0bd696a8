//! `sora-studio` -- track and manage remote video generation jobs.
//!
//! Submits generation jobs to the OpenAI `/videos` API, keeps a
//! locally persisted job list in sync with remote status via polling,
//! and exposes the usual job actions (remix, delete, download).
//!
//! # Environment variables
//!
//! | Variable          | Required | Default         | Description                          |
//! |-------------------|----------|-----------------|--------------------------------------|
//! | `OPENAI_API_KEY`  | no*      | --              | Credential; overrides the persisted one |
//! | `SORA_STUDIO_DIR` | no       | `.sora-studio`  | Data directory (jobs + settings)     |
//!
//! *Required for every command that talks to the remote API.

use sora_studio::{app::Studio, commands};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "\
usage: sora-studio <command> [args]

commands:
  create <prompt> [--model M] [--seconds N] [--size WxH] [--input FILE]
  list
  show <id>
  refresh
  watch
  remix <id> <prompt...>
  delete <id>
  download <id> [--thumbnail] [--out FILE]
  export [FILE]
  config [--duration N] [--size WxH] [--interval N] [--key KEY]
";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sora_studio=info,sora_store=info,sora_gateway=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprint!("{USAGE}");
        std::process::exit(2);
    }
    let command = args.remove(0);

    let mut studio = Studio::init(Studio::paths_from_env());

    let result = match command.as_str() {
        "create" => commands::create(&studio, args).await,
        "list" => {
            commands::list(&studio);
            Ok(())
        }
        "show" => match args.first() {
            Some(id) => commands::show(&studio, id).await,
            None => usage_error("show requires a job id"),
        },
        "refresh" => commands::refresh(&studio).await,
        "watch" => commands::watch(&studio).await,
        "remix" => match args.split_first() {
            Some((id, prompt_words)) if !prompt_words.is_empty() => {
                commands::remix(&studio, id, &prompt_words.join(" ")).await
            }
            _ => usage_error("remix requires a job id and a prompt"),
        },
        "delete" => match args.first() {
            Some(id) => commands::delete(&studio, id).await,
            None => usage_error("delete requires a job id"),
        },
        "download" => match args.split_first() {
            Some((id, rest)) => commands::download(&studio, id, rest.to_vec()).await,
            None => usage_error("download requires a job id"),
        },
        "export" => commands::export(&studio, args.first().map(String::as_str)),
        "config" => commands::config(&mut studio, args),
        _ => {
            eprint!("{USAGE}");
            std::process::exit(2);
        }
    };

    studio.teardown();

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

fn usage_error(message: &str) -> anyhow::Result<()> {
    anyhow::bail!("{message}\n\n{USAGE}")
}
