//! Command registry: declarations in, immutable routing table out.
//!
//! Applications describe their commands as plain [`CommandDeclaration`]
//! values (name, kind, description, options, handlers, guild scope) and fold
//! them into a [`Registry`] once at startup with [`RegistryBuilder::build`] or
//! [`build`]. Option types and channel kinds are given symbolically
//! (`"string"`, `"guild_text"`) and resolved here, so a typo fails the build
//! instead of a request.
//!
//! # Resolution rules
//!
//! - A declaration with no guild ids is global, keyed by name.
//! - A declaration with guild ids is inserted once per guild, keyed by
//!   `(guild_id, name)`.
//! - Within one build, a later declaration for the same key replaces the
//!   earlier one (last write wins). The same holds for the single component
//!   and modal handler slots. Collisions are logged, not rejected.
//!
//! The built registry is never mutated; share it behind an `Arc` and read it
//! concurrently without locking.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use crate::constants::{MAX_CHOICES, MAX_DESCRIPTION_LEN, MAX_NAME_LEN, MAX_OPTIONS};
use crate::error::ConfigurationError;
use crate::handler::HandlerRef;
use crate::types::{
    ChannelKind, CommandDefinition, CommandKind, GuildId, OptionChoice, OptionDefinition,
    OptionType,
};

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// Application-authored description of one option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDeclaration {
    pub name: String,
    /// Symbolic option type, resolved with [`OptionType::from_symbol`].
    pub kind: String,
    pub description: String,
    pub required: bool,
    pub choices: Vec<OptionChoice>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub autocomplete: bool,
    /// Symbolic channel kinds, resolved with [`ChannelKind::from_symbol`].
    pub channel_types: Vec<String>,
    pub options: Vec<OptionDeclaration>,
}

impl OptionDeclaration {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            description: description.into(),
            required: false,
            choices: Vec::new(),
            min: None,
            max: None,
            autocomplete: false,
            channel_types: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn choice(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.choices.push(OptionChoice { name: name.into(), value: value.into() });
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn autocomplete(mut self) -> Self {
        self.autocomplete = true;
        self
    }

    pub fn channel_types<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channel_types.extend(kinds.into_iter().map(Into::into));
        self
    }

    /// Nested option of a sub-command or sub-command group.
    pub fn option(mut self, option: OptionDeclaration) -> Self {
        self.options.push(option);
        self
    }
}

/// Application-authored description of one command and its handlers.
#[derive(Clone)]
pub struct CommandDeclaration {
    pub name: String,
    pub kind: CommandKind,
    pub description: Option<String>,
    pub options: Vec<OptionDeclaration>,
    /// Wire properties passed through untouched.
    pub extra: Map<String, Value>,
    pub handler: HandlerRef,
    pub autocomplete_handler: Option<HandlerRef>,
    /// Empty means global.
    pub guild_ids: Vec<GuildId>,
}

impl CommandDeclaration {
    pub fn new(name: impl Into<String>, kind: CommandKind, handler: HandlerRef) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            options: Vec::new(),
            extra: Map::new(),
            handler,
            autocomplete_handler: None,
            guild_ids: Vec::new(),
        }
    }

    /// Slash command.
    pub fn chat_input(name: impl Into<String>, description: impl Into<String>, handler: HandlerRef) -> Self {
        let mut declaration = Self::new(name, CommandKind::ChatInput, handler);
        declaration.description = Some(description.into());
        declaration
    }

    /// User context-menu command.
    pub fn user(name: impl Into<String>, handler: HandlerRef) -> Self {
        Self::new(name, CommandKind::UserContextMenu, handler)
    }

    /// Message context-menu command.
    pub fn message(name: impl Into<String>, handler: HandlerRef) -> Self {
        Self::new(name, CommandKind::MessageContextMenu, handler)
    }

    pub fn option(mut self, option: OptionDeclaration) -> Self {
        self.options.push(option);
        self
    }

    pub fn autocomplete(mut self, handler: HandlerRef) -> Self {
        self.autocomplete_handler = Some(handler);
        self
    }

    /// Scope the command to a guild. May be repeated.
    pub fn guild(mut self, guild_id: impl Into<GuildId>) -> Self {
        self.guild_ids.push(guild_id.into());
        self
    }

    pub fn guilds<I, G>(mut self, guild_ids: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<GuildId>,
    {
        self.guild_ids.extend(guild_ids.into_iter().map(Into::into));
        self
    }

    /// Set an extra wire property such as `default_member_permissions`.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for CommandDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDeclaration")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("guild_ids", &self.guild_ids)
            .finish_non_exhaustive()
    }
}

/// One record of the declaration pass.
#[derive(Clone)]
pub enum Declaration {
    Command(CommandDeclaration),
    ComponentHandler(HandlerRef),
    ModalHandler(HandlerRef),
}

impl From<CommandDeclaration> for Declaration {
    fn from(declaration: CommandDeclaration) -> Self {
        Self::Command(declaration)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// A compiled command with its handlers and scope.
#[derive(Clone)]
pub struct CommandEntry {
    definition: CommandDefinition,
    handler: HandlerRef,
    autocomplete_handler: Option<HandlerRef>,
    guild_ids: BTreeSet<GuildId>,
}

impl CommandEntry {
    /// Wire definition, as sent to the registration endpoints.
    pub fn definition(&self) -> &CommandDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    pub fn autocomplete_handler(&self) -> Option<&HandlerRef> {
        self.autocomplete_handler.as_ref()
    }

    /// Guilds the command is scoped to; empty for a global command.
    pub fn guild_ids(&self) -> &BTreeSet<GuildId> {
        &self.guild_ids
    }

    pub fn is_global(&self) -> bool {
        self.guild_ids.is_empty()
    }
}

fn same_handler(a: &HandlerRef, b: &HandlerRef) -> bool {
    Arc::ptr_eq(a, b)
}

fn same_optional_handler(a: &Option<HandlerRef>, b: &Option<HandlerRef>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => same_handler(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Entries are equal when their definitions and scope match and they point
/// at the very same handler instances.
impl PartialEq for CommandEntry {
    fn eq(&self, other: &Self) -> bool {
        self.definition == other.definition
            && self.guild_ids == other.guild_ids
            && same_handler(&self.handler, &other.handler)
            && same_optional_handler(&self.autocomplete_handler, &other.autocomplete_handler)
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("definition", &self.definition)
            .field("autocomplete", &self.autocomplete_handler.is_some())
            .field("guild_ids", &self.guild_ids)
            .finish_non_exhaustive()
    }
}

/// Immutable routing table built from declarations.
#[derive(Clone, Default)]
pub struct Registry {
    global_commands: BTreeMap<String, CommandEntry>,
    guild_commands: BTreeMap<(GuildId, String), CommandEntry>,
    component_handler: Option<HandlerRef>,
    modal_handler: Option<HandlerRef>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Find the entry for a command invoked from `guild_id`.
    ///
    /// A guild-scoped entry for `(guild_id, name)` takes priority over a
    /// global entry of the same name.
    pub fn resolve_command(&self, guild_id: Option<&GuildId>, name: &str) -> Option<&CommandEntry> {
        guild_id
            .and_then(|guild| self.guild_command(guild, name))
            .or_else(|| self.global_command(name))
    }

    pub fn global_command(&self, name: &str) -> Option<&CommandEntry> {
        self.global_commands.get(name)
    }

    pub fn guild_command(&self, guild_id: &GuildId, name: &str) -> Option<&CommandEntry> {
        self.guild_commands.get(&(guild_id.clone(), name.to_string()))
    }

    pub fn component_handler(&self) -> Option<&HandlerRef> {
        self.component_handler.as_ref()
    }

    pub fn modal_handler(&self) -> Option<&HandlerRef> {
        self.modal_handler.as_ref()
    }

    /// Number of global commands.
    pub fn global_len(&self) -> usize {
        self.global_commands.len()
    }

    /// Number of `(guild, command)` pairs.
    pub fn guild_len(&self) -> usize {
        self.guild_commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.global_commands.is_empty()
            && self.guild_commands.is_empty()
            && self.component_handler.is_none()
            && self.modal_handler.is_none()
    }

    /// Payload for the global bulk-overwrite endpoint, ordered by name.
    pub fn global_definitions(&self) -> Vec<CommandDefinition> {
        self.global_commands
            .values()
            .map(|entry| entry.definition.clone())
            .collect()
    }

    /// Payload for each guild's bulk-overwrite endpoint, ordered by name.
    pub fn guild_definitions(&self) -> BTreeMap<GuildId, Vec<CommandDefinition>> {
        let mut by_guild: BTreeMap<GuildId, Vec<CommandDefinition>> = BTreeMap::new();
        for ((guild_id, _), entry) in &self.guild_commands {
            by_guild
                .entry(guild_id.clone())
                .or_default()
                .push(entry.definition.clone());
        }
        by_guild
    }

    fn apply(&mut self, declaration: Declaration) -> Result<(), ConfigurationError> {
        match declaration {
            Declaration::Command(command) => {
                let entry = compile_command(command)?;
                self.insert(entry);
            }
            Declaration::ComponentHandler(handler) => {
                if self.component_handler.replace(handler).is_some() {
                    warn!("component handler declared twice; last declaration wins");
                }
            }
            Declaration::ModalHandler(handler) => {
                if self.modal_handler.replace(handler).is_some() {
                    warn!("modal handler declared twice; last declaration wins");
                }
            }
        }
        Ok(())
    }

    fn insert(&mut self, entry: CommandEntry) {
        let name = entry.definition.name.clone();
        if entry.is_global() {
            debug!(command = %name, "registered global command");
            if self.global_commands.insert(name.clone(), entry).is_some() {
                warn!(command = %name, "global command declared twice; last declaration wins");
            }
            return;
        }
        for guild_id in entry.guild_ids.clone() {
            debug!(command = %name, guild = %guild_id, "registered guild command");
            let key = (guild_id.clone(), name.clone());
            if self.guild_commands.insert(key, entry.clone()).is_some() {
                warn!(command = %name, guild = %guild_id, "guild command declared twice; last declaration wins");
            }
        }
    }
}

impl PartialEq for Registry {
    fn eq(&self, other: &Self) -> bool {
        self.global_commands == other.global_commands
            && self.guild_commands == other.guild_commands
            && same_optional_handler(&self.component_handler, &other.component_handler)
            && same_optional_handler(&self.modal_handler, &other.modal_handler)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("global_commands", &self.global_commands.keys().collect::<Vec<_>>())
            .field("guild_commands", &self.guild_commands.keys().collect::<Vec<_>>())
            .field("component_handler", &self.component_handler.is_some())
            .field("modal_handler", &self.modal_handler.is_some())
            .finish()
    }
}

/// Accumulates declarations, then folds them into a [`Registry`].
#[derive(Clone, Default)]
pub struct RegistryBuilder {
    declarations: Vec<Declaration>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(mut self, declaration: CommandDeclaration) -> Self {
        self.declarations.push(Declaration::Command(declaration));
        self
    }

    /// Handler for every message-component interaction. Replaces any earlier one.
    pub fn component_handler(mut self, handler: HandlerRef) -> Self {
        self.declarations.push(Declaration::ComponentHandler(handler));
        self
    }

    /// Handler for every modal submission. Replaces any earlier one.
    pub fn modal_handler(mut self, handler: HandlerRef) -> Self {
        self.declarations.push(Declaration::ModalHandler(handler));
        self
    }

    pub fn build(self) -> Result<Registry, ConfigurationError> {
        build(self.declarations)
    }
}

/// Fold declarations, in order, into a registry.
pub fn build<I>(declarations: I) -> Result<Registry, ConfigurationError>
where
    I: IntoIterator<Item = Declaration>,
{
    declarations
        .into_iter()
        .try_fold(Registry::default(), |mut registry, declaration| {
            registry.apply(declaration)?;
            Ok(registry)
        })
}

// ---------------------------------------------------------------------------
// Compilation and validation
// ---------------------------------------------------------------------------

fn compile_command(declaration: CommandDeclaration) -> Result<CommandEntry, ConfigurationError> {
    let CommandDeclaration {
        name,
        kind,
        description,
        options,
        extra,
        handler,
        autocomplete_handler,
        guild_ids,
    } = declaration;

    let description = match kind {
        CommandKind::ChatInput => {
            check_chat_name(&name)?;
            let description = description.ok_or_else(|| ConfigurationError::MissingDescription(name.clone()))?;
            check_description(&name, &description)?;
            Some(description)
        }
        CommandKind::UserContextMenu | CommandKind::MessageContextMenu => {
            check_context_menu_name(&name)?;
            if !options.is_empty() {
                return Err(ConfigurationError::OptionsOnContextMenu(name));
            }
            if autocomplete_handler.is_some() {
                return Err(ConfigurationError::AutocompleteOnContextMenu(name));
            }
            description
        }
    };

    check_count(&name, "options", options.len(), MAX_OPTIONS)?;
    let options = options
        .into_iter()
        .map(compile_option)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CommandEntry {
        definition: CommandDefinition { name, kind, description, options, extra },
        handler,
        autocomplete_handler,
        guild_ids: guild_ids.into_iter().collect(),
    })
}

fn compile_option(declaration: OptionDeclaration) -> Result<OptionDefinition, ConfigurationError> {
    let OptionDeclaration {
        name,
        kind,
        description,
        required,
        choices,
        min,
        max,
        autocomplete,
        channel_types,
        options,
    } = declaration;

    let Some(option_type) = OptionType::from_symbol(&kind) else {
        return Err(ConfigurationError::UnknownOptionType { option: name, kind });
    };
    check_chat_name(&name)?;
    check_description(&name, &description)?;

    if autocomplete && !choices.is_empty() {
        return Err(ConfigurationError::ChoicesWithAutocomplete(name));
    }
    check_count(&name, "choices", choices.len(), MAX_CHOICES)?;

    let (min, max) = compile_bounds(&name, option_type, min, max)?;

    if !channel_types.is_empty() && option_type != OptionType::Channel {
        return Err(ConfigurationError::ChannelTypesOnNonChannel(name));
    }
    let channel_types = channel_types
        .iter()
        .map(|symbol| {
            ChannelKind::from_symbol(symbol).ok_or_else(|| ConfigurationError::UnknownChannelKind {
                option: name.clone(),
                kind: symbol.clone(),
            })
        })
        .collect::<Result<BTreeSet<_>, _>>()?
        .into_iter()
        .collect();

    if !options.is_empty() && !option_type.is_group() {
        return Err(ConfigurationError::UnexpectedNesting(name));
    }
    check_count(&name, "options", options.len(), MAX_OPTIONS)?;
    let options = options
        .into_iter()
        .map(compile_option)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OptionDefinition {
        name,
        kind: option_type,
        description,
        required,
        choices,
        min,
        max,
        autocomplete,
        channel_types,
        options,
    })
}

fn compile_bounds(
    name: &str,
    option_type: OptionType,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<(Option<Number>, Option<Number>), ConfigurationError> {
    let invalid = |reason| ConfigurationError::InvalidBounds { option: name.to_string(), reason };

    if (min.is_some() || max.is_some()) && !option_type.is_numeric() {
        return Err(invalid("bounds only apply to integer and number options"));
    }
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(invalid("min exceeds max"));
        }
    }

    let convert = |bound: Option<f64>| -> Result<Option<Number>, ConfigurationError> {
        let Some(value) = bound else {
            return Ok(None);
        };
        if !value.is_finite() {
            return Err(invalid("bound must be finite"));
        }
        if option_type == OptionType::Integer {
            if value.fract() != 0.0 || value >= i64::MAX as f64 || value < i64::MIN as f64 {
                return Err(invalid("integer bound must be a whole number"));
            }
            return Ok(Some(Number::from(value as i64)));
        }
        Number::from_f64(value)
            .map(Some)
            .ok_or_else(|| invalid("bound must be finite"))
    };

    Ok((convert(min)?, convert(max)?))
}

fn check_chat_name(name: &str) -> Result<(), ConfigurationError> {
    let len = name.chars().count();
    let valid_chars = name
        .chars()
        .all(|c| c == '-' || c == '_' || (c.is_alphanumeric() && !c.is_uppercase()));
    if (1..=MAX_NAME_LEN).contains(&len) && valid_chars {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidName(name.to_string()))
    }
}

fn check_context_menu_name(name: &str) -> Result<(), ConfigurationError> {
    let len = name.chars().count();
    if (1..=MAX_NAME_LEN).contains(&len) && !name.trim().is_empty() {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidName(name.to_string()))
    }
}

fn check_description(name: &str, description: &str) -> Result<(), ConfigurationError> {
    let len = description.chars().count();
    if (1..=MAX_DESCRIPTION_LEN).contains(&len) {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidDescription(name.to_string()))
    }
}

fn check_count(name: &str, what: &'static str, count: usize, max: usize) -> Result<(), ConfigurationError> {
    if count > max {
        return Err(ConfigurationError::TooMany { name: name.to_string(), what, count, max });
    }
    Ok(())
}
