//! `chatmux run`: one-shot turn.
//!
//! Creates a throwaway in-memory conversation, runs a single message
//! through the pipeline and prints the reply. Useful for scripting.

use cm_domain::config::Config;
use cm_pipeline::{TurnError, TurnRequest};

use crate::bootstrap;

pub async fn run(
    config: &Config,
    message: String,
    mode: Option<&str>,
    json_output: bool,
) -> anyhow::Result<()> {
    let explicit_mode = super::parse_mode_flag(mode)?;
    let coordinator = bootstrap::build_ephemeral(config)?;
    let conversation = coordinator.store().create_conversation(None).await?;

    let req = TurnRequest {
        conversation_id: conversation.id,
        message,
        explicit_mode,
    };

    let reply = match coordinator.handle_message(req).await {
        Ok(outcome) => outcome.reply,
        // The in-memory log failing does not matter for a one-shot run.
        Err(TurnError::NotPersisted { reply, .. }) => *reply,
        Err(e) => return Err(e.into()),
    };

    if json_output {
        let json = serde_json::to_string_pretty(&reply)
            .map_err(|e| anyhow::anyhow!("serializing reply: {e}"))?;
        println!("{json}");
    } else {
        eprintln!("\x1b[2m[{} · {}]\x1b[0m", reply.mode, reply.generation.as_str());
        println!("{}", reply.text);
    }

    Ok(())
}
