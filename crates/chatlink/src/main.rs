use std::{process::ExitCode, sync::Arc};

use clap::Parser;

use chatlink_core::{
    activation::{ActivationAttempt, ActivationRequest, Activator},
    config::Config,
    domain::{BotId, ChatKind, OwnerId},
};
use chatlink_supabase::SupabaseStore;
use chatlink_telegram::TelegramDirectory;

/// Activate a bot's VIP group or channel.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Dashboard user that owns the bot
    owner: String,

    /// Bot row id
    bot_id: String,

    /// Declared chat type (group or channel)
    declared_type: ChatKind,

    /// Chat link, @handle or numeric id
    chat: String,
}

impl Cli {
    fn into_request(self) -> ActivationRequest {
        ActivationRequest {
            owner: OwnerId(self.owner),
            bot_id: BotId(self.bot_id),
            raw_input: self.chat,
            declared_type: self.declared_type,
        }
    }
}

/// What the process prints and how it exits.
#[derive(Debug)]
struct Report {
    exit_code: u8,
    stdout: Vec<String>,
    stderr: Vec<String>,
}

fn report(attempt: ActivationAttempt) -> anyhow::Result<Report> {
    match attempt.result {
        Ok(outcome) => Ok(Report {
            exit_code: 0,
            stdout: vec![outcome.summary(), serde_json::to_string_pretty(&outcome)?],
            stderr: Vec::new(),
        }),
        Err(err) => {
            let username = attempt.bot_username.as_deref().unwrap_or("your_bot");
            let mut stderr = vec![err.to_string()];
            stderr.extend(
                err.remediation_steps(username)
                    .into_iter()
                    .map(|step| format!("  {step}")),
            );
            Ok(Report {
                exit_code: 2,
                stdout: Vec::new(),
                stderr,
            })
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    chatlink_core::logging::init("chatlink")?;

    let req = Cli::parse().into_request();

    let cfg = Config::load()?;
    let directory = Arc::new(TelegramDirectory::new(
        &cfg.telegram_api_url,
        cfg.request_timeout,
    )?);
    let store = Arc::new(SupabaseStore::new(
        cfg.store_url.clone(),
        cfg.store_service_key.clone(),
        cfg.request_timeout,
    )?);

    let activator = Activator::new(directory, store, &cfg);
    let report = report(activator.attempt(&req).await)?;

    for line in &report.stdout {
        println!("{line}");
    }
    for line in &report.stderr {
        eprintln!("{line}");
    }
    Ok(ExitCode::from(report.exit_code))
}
