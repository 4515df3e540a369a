//! Sample application served by `parley-server`.
//!
//! - `/ping`: global, replies "Pong!"
//! - `/echo text:<string>`: global, repeats `text` with a feedback button;
//!   autocomplete suggests phrases. Guilds passed with `--dev-guild` get an
//!   ephemeral variant that shadows the global one.
//! - `Greet`: user context menu, greets the target user.
//! - component handler: the feedback button opens a modal.
//! - modal handler: thanks the user for the submitted feedback.

use serde_json::{json, Value};

use parley_core::handler::{handler, HandlerReply, HandlerResult};
use parley_core::{
    CommandDeclaration, ConfigurationError, Interaction, InteractionResponse, OptionDeclaration,
    Registry,
};

pub const FEEDBACK_BUTTON: &str = "echo:feedback";
pub const FEEDBACK_MODAL: &str = "echo:feedback-modal";
pub const FEEDBACK_INPUT: &str = "feedback";

const SUGGESTIONS: &[&str] = &["hello", "hello world", "good morning", "good night", "thanks"];
const MAX_SUGGESTIONS: usize = 25;

pub fn registry<G>(dev_guilds: G) -> Result<Registry, ConfigurationError>
where
    G: IntoIterator,
    G::Item: Into<parley_core::GuildId>,
{
    let dev_guilds: Vec<parley_core::GuildId> = dev_guilds.into_iter().map(Into::into).collect();

    let mut builder = Registry::builder()
        .command(CommandDeclaration::chat_input("ping", "Check that the bot is alive", handler(ping)))
        .command(echo_declaration("Repeat a message back", handler(echo)))
        .command(CommandDeclaration::user("Greet", handler(greet)))
        .component_handler(handler(component))
        .modal_handler(handler(modal));

    if !dev_guilds.is_empty() {
        builder = builder.command(
            echo_declaration("Repeat a message back (only you can see it)", handler(echo_private))
                .guilds(dev_guilds),
        );
    }

    builder.build()
}

fn echo_declaration(description: &str, echo: parley_core::HandlerRef) -> CommandDeclaration {
    CommandDeclaration::chat_input("echo", description, echo)
        .option(OptionDeclaration::new("text", "string", "What to repeat").required().autocomplete())
        .autocomplete(handler(suggest))
}

async fn ping(_: Interaction) -> HandlerResult {
    Ok(HandlerReply::Respond(InteractionResponse::message("Pong!")))
}

async fn echo(interaction: Interaction) -> HandlerResult {
    let Some(text) = interaction.option("text").and_then(|o| o.as_str()) else {
        return Ok(HandlerReply::Reject("echo invoked without text".into()));
    };
    Ok(HandlerReply::Respond(InteractionResponse::message_with(json!({
        "content": text,
        "components": [{
            "type": 1,
            "components": [{
                "type": 2,
                "style": 2,
                "label": "Send feedback",
                "custom_id": FEEDBACK_BUTTON,
            }],
        }],
    }))))
}

async fn echo_private(interaction: Interaction) -> HandlerResult {
    match interaction.option("text").and_then(|o| o.as_str()) {
        Some(text) => Ok(HandlerReply::Respond(InteractionResponse::ephemeral(text))),
        None => Ok(HandlerReply::Reject("echo invoked without text".into())),
    }
}

async fn suggest(interaction: Interaction) -> HandlerResult {
    let typed = interaction
        .focused_option()
        .and_then(|o| o.as_str())
        .unwrap_or_default()
        .to_lowercase();

    let mut choices: Vec<String> = Vec::new();
    if !typed.is_empty() {
        choices.push(typed.clone());
    }
    choices.extend(
        SUGGESTIONS
            .iter()
            .filter(|s| s.starts_with(&typed) && **s != typed)
            .map(|s| s.to_string()),
    );
    choices.truncate(MAX_SUGGESTIONS);

    Ok(HandlerReply::Respond(InteractionResponse::autocomplete(
        choices.into_iter().map(|c| (c.clone(), c)),
    )))
}

async fn greet(interaction: Interaction) -> HandlerResult {
    let Some(target) = interaction.data.as_ref().and_then(|d| d.target_id.as_deref()) else {
        return Ok(HandlerReply::Reject("user command without a target".into()));
    };
    let greeting = match interaction.invoking_user_id() {
        Some(from) if from != target => format!("<@{from}> says hello to <@{target}>!"),
        _ => format!("Hello, <@{target}>!"),
    };
    Ok(HandlerReply::Respond(InteractionResponse::message(greeting)))
}

async fn component(interaction: Interaction) -> HandlerResult {
    if interaction.custom_id() != Some(FEEDBACK_BUTTON) {
        return Ok(HandlerReply::Acknowledge);
    }
    Ok(HandlerReply::Respond(InteractionResponse::modal(
        FEEDBACK_MODAL,
        "Feedback",
        vec![json!({
            "type": 1,
            "components": [{
                "type": 4,
                "custom_id": FEEDBACK_INPUT,
                "label": "What do you think?",
                "style": 2,
                "required": true,
            }],
        })],
    )))
}

async fn modal(interaction: Interaction) -> HandlerResult {
    if interaction.custom_id() != Some(FEEDBACK_MODAL) {
        return Ok(HandlerReply::Reject(format!(
            "unexpected modal {:?}",
            interaction.custom_id()
        )));
    }
    let feedback = interaction
        .data
        .as_ref()
        .and_then(|d| submitted_value(&d.components, FEEDBACK_INPUT))
        .unwrap_or_default();
    Ok(HandlerReply::Respond(InteractionResponse::ephemeral(format!(
        "Thanks for the feedback ({} characters)",
        feedback.chars().count()
    ))))
}

/// Value of the text input `custom_id` inside a modal's action rows.
fn submitted_value<'a>(rows: &'a [Value], custom_id: &str) -> Option<&'a str> {
    rows.iter()
        .filter_map(|row| row["components"].as_array())
        .flatten()
        .find(|input| input["custom_id"] == custom_id)
        .and_then(|input| input["value"].as_str())
}
