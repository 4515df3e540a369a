//! Wire model for interactions and command definitions.
//!
//! Two families of types live here:
//!
//! - **Outbound definitions** ([`CommandDefinition`], [`OptionDefinition`]):
//!   what the registry hands to the command-registration client. They
//!   serialize to exactly the JSON the platform's bulk-overwrite endpoints
//!   expect.
//! - **Inbound payloads** ([`Interaction`] and friends): the decoded webhook
//!   body. Decoding is tolerant: unknown fields are kept in overlay maps and
//!   unknown interaction type values decode to [`InteractionType::Unknown`]
//!   or [`InteractionType::Unrecognized`].
//!
//! Enumerations with numeric wire codes serialize as plain integers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::ConfigurationError;

/// Snowflake id of a guild, kept in its wire form (a decimal string).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(pub String);

impl GuildId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GuildId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for GuildId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for GuildId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Kind of an inbound interaction.
///
/// Decoding never fails on a present `type` field: codes this build does not
/// know decode to [`InteractionType::Unknown`], and values that are not a
/// non-negative integer decode to [`InteractionType::Unrecognized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum InteractionType {
    Ping,
    ApplicationCommand,
    MessageComponent,
    ApplicationCommandAutocomplete,
    ModalSubmit,
    /// A type code this build does not know about.
    Unknown(u64),
    /// A type value that is not a type code at all (negative, fractional, text).
    Unrecognized,
}

impl InteractionType {
    /// Numeric wire code, if the value was one.
    pub fn code(self) -> Option<u64> {
        match self {
            Self::Ping => Some(1),
            Self::ApplicationCommand => Some(2),
            Self::MessageComponent => Some(3),
            Self::ApplicationCommandAutocomplete => Some(4),
            Self::ModalSubmit => Some(5),
            Self::Unknown(code) => Some(code),
            Self::Unrecognized => None,
        }
    }
}

impl From<u64> for InteractionType {
    fn from(code: u64) -> Self {
        match code {
            1 => Self::Ping,
            2 => Self::ApplicationCommand,
            3 => Self::MessageComponent,
            4 => Self::ApplicationCommandAutocomplete,
            5 => Self::ModalSubmit,
            other => Self::Unknown(other),
        }
    }
}

impl From<Value> for InteractionType {
    fn from(value: Value) -> Self {
        value.as_u64().map_or(Self::Unrecognized, Self::from)
    }
}

impl From<InteractionType> for Value {
    fn from(kind: InteractionType) -> Self {
        kind.code().map_or(Value::Null, Value::from)
    }
}

/// Kind of application command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CommandKind {
    /// Slash command typed into the chat input.
    ChatInput,
    /// Entry in a user's context menu.
    UserContextMenu,
    /// Entry in a message's context menu.
    MessageContextMenu,
}

impl TryFrom<u8> for CommandKind {
    type Error = ConfigurationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::ChatInput),
            2 => Ok(Self::UserContextMenu),
            3 => Ok(Self::MessageContextMenu),
            code => Err(ConfigurationError::UnknownCode { what: "command kind", code }),
        }
    }
}

impl From<CommandKind> for u8 {
    fn from(kind: CommandKind) -> Self {
        match kind {
            CommandKind::ChatInput => 1,
            CommandKind::UserContextMenu => 2,
            CommandKind::MessageContextMenu => 3,
        }
    }
}

/// Closed set of option types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OptionType {
    SubCommand,
    SubCommandGroup,
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
}

impl OptionType {
    const ALL: [OptionType; 11] = [
        Self::SubCommand,
        Self::SubCommandGroup,
        Self::String,
        Self::Integer,
        Self::Boolean,
        Self::User,
        Self::Channel,
        Self::Role,
        Self::Mentionable,
        Self::Number,
        Self::Attachment,
    ];

    /// Resolve a symbolic type name such as `"string"` or `"sub_command"`.
    ///
    /// Matching ignores ASCII case; `-` and `_` are interchangeable and the
    /// separator inside `sub_command` may be omitted.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let normalized = symbol.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "sub_command" | "subcommand" => Some(Self::SubCommand),
            "sub_command_group" | "subcommand_group" => Some(Self::SubCommandGroup),
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "user" => Some(Self::User),
            "channel" => Some(Self::Channel),
            "role" => Some(Self::Role),
            "mentionable" => Some(Self::Mentionable),
            "number" => Some(Self::Number),
            "attachment" => Some(Self::Attachment),
            _ => None,
        }
    }

    /// Whether `min`/`max` bounds apply to this type.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Number)
    }

    /// Whether options of this type carry nested options.
    pub fn is_group(self) -> bool {
        matches!(self, Self::SubCommand | Self::SubCommandGroup)
    }
}

impl TryFrom<u8> for OptionType {
    type Error = ConfigurationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        code.checked_sub(1)
            .and_then(|i| Self::ALL.get(usize::from(i)).copied())
            .ok_or(ConfigurationError::UnknownCode { what: "option type", code })
    }
}

impl From<OptionType> for u8 {
    fn from(kind: OptionType) -> Self {
        match kind {
            OptionType::SubCommand => 1,
            OptionType::SubCommandGroup => 2,
            OptionType::String => 3,
            OptionType::Integer => 4,
            OptionType::Boolean => 5,
            OptionType::User => 6,
            OptionType::Channel => 7,
            OptionType::Role => 8,
            OptionType::Mentionable => 9,
            OptionType::Number => 10,
            OptionType::Attachment => 11,
        }
    }
}

/// Channel kinds a channel option may be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ChannelKind {
    GuildText,
    Dm,
    GuildVoice,
    GroupDm,
    GuildCategory,
    GuildAnnouncement,
    AnnouncementThread,
    PublicThread,
    PrivateThread,
    GuildStageVoice,
    GuildDirectory,
    GuildForum,
    GuildMedia,
}

impl ChannelKind {
    const CODES: [(ChannelKind, u8); 13] = [
        (Self::GuildText, 0),
        (Self::Dm, 1),
        (Self::GuildVoice, 2),
        (Self::GroupDm, 3),
        (Self::GuildCategory, 4),
        (Self::GuildAnnouncement, 5),
        (Self::AnnouncementThread, 10),
        (Self::PublicThread, 11),
        (Self::PrivateThread, 12),
        (Self::GuildStageVoice, 13),
        (Self::GuildDirectory, 14),
        (Self::GuildForum, 15),
        (Self::GuildMedia, 16),
    ];

    /// Resolve a symbolic channel kind such as `"guild_text"` or `"voice"`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let normalized = symbol.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "guild_text" | "text" => Some(Self::GuildText),
            "dm" => Some(Self::Dm),
            "guild_voice" | "voice" => Some(Self::GuildVoice),
            "group_dm" => Some(Self::GroupDm),
            "guild_category" | "category" => Some(Self::GuildCategory),
            "guild_announcement" | "guild_news" | "news" => Some(Self::GuildAnnouncement),
            "announcement_thread" | "news_thread" => Some(Self::AnnouncementThread),
            "public_thread" => Some(Self::PublicThread),
            "private_thread" => Some(Self::PrivateThread),
            "guild_stage_voice" | "stage" => Some(Self::GuildStageVoice),
            "guild_directory" => Some(Self::GuildDirectory),
            "guild_forum" | "forum" => Some(Self::GuildForum),
            "guild_media" | "media" => Some(Self::GuildMedia),
            _ => None,
        }
    }

    /// Platform integer code.
    pub fn code(self) -> u8 {
        Self::CODES
            .iter()
            .find(|(kind, _)| *kind == self)
            .map_or(0, |(_, code)| *code)
    }
}

impl TryFrom<u8> for ChannelKind {
    type Error = ConfigurationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::CODES
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(kind, _)| *kind)
            .ok_or(ConfigurationError::UnknownCode { what: "channel kind", code })
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> Self {
        kind.code()
    }
}

// ---------------------------------------------------------------------------
// Outbound definitions
// ---------------------------------------------------------------------------

fn is_false(value: &bool) -> bool {
    !*value
}

/// One predefined choice on an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub name: String,
    pub value: Value,
}

/// Option of a chat input command, as registered with the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OptionType,
    pub description: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<OptionChoice>,
    #[serde(rename = "min_value", default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Number>,
    #[serde(rename = "max_value", default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Number>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub autocomplete: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channel_types: Vec<ChannelKind>,
    /// Nested options of a sub-command or sub-command group.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDefinition>,
}

/// Command as registered with the platform.
///
/// `extra` is an opaque overlay flattened into the wire object, for platform
/// fields this model does not name (`default_member_permissions`, `nsfw`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CommandKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDefinition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Inbound payloads
// ---------------------------------------------------------------------------

/// Option value as submitted by the invoking user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDataOption {
    pub name: String,
    /// Raw option type code; kept numeric so unknown codes still decode.
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandDataOption>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub focused: bool,
}

impl CommandDataOption {
    /// Whether this entry is a sub-command or group wrapping further options.
    pub fn is_group(&self) -> bool {
        OptionType::try_from(self.kind).is_ok_and(OptionType::is_group)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.value.as_ref().and_then(Value::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_ref().and_then(Value::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_ref().and_then(Value::as_bool)
    }
}

/// Kind-specific interaction data.
///
/// Command interactions fill `name`/`options`/`resolved`; component and modal
/// interactions fill `custom_id` and `values`/`components`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandDataOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One decoded interaction webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub application_id: String,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionData>,
    /// Absent for interactions that originate in a direct message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<GuildId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Interaction {
    /// Minimal interaction of the given kind, mostly useful in tests.
    pub fn new(kind: InteractionType) -> Self {
        Self {
            id: String::new(),
            application_id: String::new(),
            kind,
            data: None,
            guild_id: None,
            channel_id: None,
            token: String::new(),
            member: None,
            user: None,
            extra: Map::new(),
        }
    }

    /// Name of the invoked command, for command and autocomplete interactions.
    pub fn command_name(&self) -> Option<&str> {
        self.data.as_ref()?.name.as_deref()
    }

    /// Developer-defined id of the component or modal that fired.
    pub fn custom_id(&self) -> Option<&str> {
        self.data.as_ref()?.custom_id.as_deref()
    }

    /// Look up a submitted option by name, descending through sub-commands.
    pub fn option(&self, name: &str) -> Option<&CommandDataOption> {
        find_option(&self.data.as_ref()?.options, name)
    }

    /// The option the user is currently typing into (autocomplete only).
    pub fn focused_option(&self) -> Option<&CommandDataOption> {
        find_focused(&self.data.as_ref()?.options)
    }

    /// Names of the invoked sub-command group and sub-command, outermost first.
    pub fn subcommand_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut options = self.data.as_ref().map_or(&[][..], |d| d.options.as_slice());
        while let Some(group) = options.iter().find(|o| o.is_group()) {
            path.push(group.name.as_str());
            options = group.options.as_slice();
        }
        path
    }

    /// Id of the user who triggered the interaction.
    ///
    /// Guild interactions carry the user under `member.user`; direct
    /// messages carry it under `user`.
    pub fn invoking_user_id(&self) -> Option<&str> {
        self.member
            .as_ref()
            .and_then(|member| member.get("user"))
            .or(self.user.as_ref())
            .and_then(|user| user.get("id"))
            .and_then(Value::as_str)
    }
}

fn find_option<'a>(options: &'a [CommandDataOption], name: &str) -> Option<&'a CommandDataOption> {
    options.iter().find_map(|option| {
        if option.is_group() {
            find_option(&option.options, name)
        } else if option.name == name {
            Some(option)
        } else {
            None
        }
    })
}

fn find_focused(options: &[CommandDataOption]) -> Option<&CommandDataOption> {
    options.iter().find_map(|option| {
        if option.focused {
            Some(option)
        } else {
            find_focused(&option.options)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn interaction_type_codes() {
        assert_eq!(InteractionType::from(1), InteractionType::Ping);
        assert_eq!(InteractionType::from(5), InteractionType::ModalSubmit);
        assert_eq!(InteractionType::from(99), InteractionType::Unknown(99));
        assert_eq!(InteractionType::ApplicationCommandAutocomplete.code(), Some(4));
        assert_eq!(InteractionType::Unrecognized.code(), None);
    }

    #[test]
    fn non_integer_type_values_still_decode() {
        for value in [json!(-1), json!("2"), json!(2.0), json!(null), json!({"code": 2})] {
            let interaction: Interaction = serde_json::from_value(json!({"type": value})).unwrap();
            assert_eq!(interaction.kind, InteractionType::Unrecognized, "{value}");
        }
    }

    #[test]
    fn missing_type_is_a_decode_error() {
        assert!(serde_json::from_value::<Interaction>(json!({"id": "1"})).is_err());
    }

    #[test]
    fn unknown_interaction_type_still_decodes() {
        let interaction: Interaction = serde_json::from_value(json!({"type": 42})).unwrap();
        assert_eq!(interaction.kind, InteractionType::Unknown(42));
    }

    #[test]
    fn option_type_symbols() {
        assert_eq!(OptionType::from_symbol("string"), Some(OptionType::String));
        assert_eq!(OptionType::from_symbol("SUB_COMMAND"), Some(OptionType::SubCommand));
        assert_eq!(OptionType::from_symbol("subcommand-group"), Some(OptionType::SubCommandGroup));
        assert_eq!(OptionType::from_symbol("colour"), None);
    }

    #[test]
    fn option_type_code_roundtrip_covers_all() {
        for code in 1..=11u8 {
            let kind = OptionType::try_from(code).unwrap();
            assert_eq!(u8::from(kind), code);
        }
        assert!(OptionType::try_from(0).is_err());
        assert!(OptionType::try_from(12).is_err());
    }

    #[test]
    fn channel_kind_symbols_map_to_platform_codes() {
        assert_eq!(ChannelKind::from_symbol("guild_text").map(ChannelKind::code), Some(0));
        assert_eq!(ChannelKind::from_symbol("voice").map(ChannelKind::code), Some(2));
        assert_eq!(ChannelKind::from_symbol("guild_forum").map(ChannelKind::code), Some(15));
        assert_eq!(ChannelKind::from_symbol("nebula"), None);
        assert!(ChannelKind::try_from(7).is_err());
    }

    #[test]
    fn command_definition_wire_shape() {
        let definition = CommandDefinition {
            name: "echo".into(),
            kind: CommandKind::ChatInput,
            description: Some("Echo text".into()),
            options: vec![OptionDefinition {
                name: "where".into(),
                kind: OptionType::Channel,
                description: "Target".into(),
                required: true,
                choices: vec![],
                min: None,
                max: None,
                autocomplete: false,
                channel_types: vec![ChannelKind::GuildText, ChannelKind::GuildForum],
                options: vec![],
            }],
            extra: Map::from_iter([("nsfw".to_string(), json!(false))]),
        };

        assert_eq!(
            serde_json::to_value(&definition).unwrap(),
            json!({
                "name": "echo",
                "type": 1,
                "description": "Echo text",
                "nsfw": false,
                "options": [{
                    "name": "where",
                    "type": 7,
                    "description": "Target",
                    "required": true,
                    "channel_types": [0, 15]
                }]
            })
        );
    }

    #[test]
    fn context_menu_definition_omits_description() {
        let definition = CommandDefinition {
            name: "Greet".into(),
            kind: CommandKind::UserContextMenu,
            description: None,
            options: vec![],
            extra: Map::new(),
        };
        assert_eq!(
            serde_json::to_value(&definition).unwrap(),
            json!({"name": "Greet", "type": 2})
        );
    }

    fn autocomplete_payload() -> Interaction {
        serde_json::from_value(json!({
            "id": "1",
            "application_id": "2",
            "type": 4,
            "guild_id": "G1",
            "token": "tok",
            "member": {"user": {"id": "u-member"}},
            "locale": "en-GB",
            "data": {
                "name": "tag",
                "type": 1,
                "options": [{
                    "name": "edit",
                    "type": 1,
                    "options": [
                        {"name": "key", "type": 3, "value": "rust"},
                        {"name": "body", "type": 3, "value": "ow", "focused": true}
                    ]
                }]
            }
        }))
        .unwrap()
    }

    #[test]
    fn accessors_descend_through_subcommands() {
        let interaction = autocomplete_payload();
        assert_eq!(interaction.command_name(), Some("tag"));
        assert_eq!(interaction.guild_id, Some(GuildId::from("G1")));
        assert_eq!(interaction.subcommand_path(), vec!["edit"]);
        assert_eq!(interaction.option("key").and_then(CommandDataOption::as_str), Some("rust"));
        assert_eq!(interaction.focused_option().map(|o| o.name.as_str()), Some("body"));
        assert!(interaction.option("missing").is_none());
    }

    #[test]
    fn unknown_fields_are_kept() {
        let interaction = autocomplete_payload();
        assert_eq!(interaction.extra.get("locale"), Some(&json!("en-GB")));
    }

    #[test]
    fn invoking_user_prefers_member() {
        let interaction = autocomplete_payload();
        assert_eq!(interaction.invoking_user_id(), Some("u-member"));

        let mut dm = Interaction::new(InteractionType::ApplicationCommand);
        dm.user = Some(json!({"id": "u-dm"}));
        assert_eq!(dm.invoking_user_id(), Some("u-dm"));
    }

    proptest::proptest! {
        #[test]
        fn any_type_code_decodes_and_keeps_its_value(code in proptest::prelude::any::<u64>()) {
            let interaction: Interaction = serde_json::from_value(json!({"type": code})).unwrap();
            proptest::prop_assert_eq!(interaction.kind.code(), Some(code));
            proptest::prop_assert_eq!(
                matches!(interaction.kind, InteractionType::Unknown(_)),
                !(1..=5).contains(&code)
            );
        }
    }
}
