//! Builder types for command trees.
//!
//! Nodes are plain values; nothing is checked until
//! [`CommandTreeBuilder::build`], which validates the whole forest at once.

use std::collections::HashSet;
use std::sync::Arc;

use synthos_types::command::{CommandSpec, OptionKind, OptionSpec, SubcommandSpec};
use synthos_types::error::CommandTreeError;

use super::handler::{Handler, SharedHandler};
use super::tree::{CommandEntry, CommandTree, Route};

/// A leaf option of a command or subcommand.
pub struct OptionNode {
    name: String,
    description: String,
    kind: OptionKind,
    required: bool,
}

impl OptionNode {
    pub fn new(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind,
            required: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn build(self, parent: &str) -> Result<OptionSpec, CommandTreeError> {
        if self.name.is_empty() {
            return Err(CommandTreeError::EmptyOptionName {
                command: parent.to_string(),
            });
        }
        if self.description.is_empty() {
            return Err(CommandTreeError::EmptyOptionDescription {
                command: parent.to_string(),
                option: self.name,
            });
        }
        Ok(OptionSpec {
            name: self.name,
            description: self.description,
            kind: self.kind,
            required: self.required,
        })
    }
}

/// Second-level node. It cannot nest further.
pub struct SubcommandNode {
    name: String,
    description: String,
    options: Vec<OptionNode>,
    handler: Option<SharedHandler>,
}

impl SubcommandNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            options: Vec::new(),
            handler: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn option(mut self, option: OptionNode) -> Self {
        self.options.push(option);
        self
    }

    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    fn build(self, parent: &str) -> Result<(SubcommandSpec, SharedHandler), CommandTreeError> {
        let path = format!("{parent} {}", self.name);
        if self.name.is_empty() {
            return Err(CommandTreeError::EmptyName);
        }
        if self.description.is_empty() {
            return Err(CommandTreeError::EmptyDescription { name: path });
        }
        let Some(handler) = self.handler else {
            return Err(CommandTreeError::MissingHandler { name: path });
        };
        let options = build_options(self.options, &path)?;
        let spec = SubcommandSpec {
            name: self.name,
            description: self.description,
            options,
        };
        Ok((spec, handler))
    }
}

/// Top-level command. Carries either a handler or subcommands, never both.
pub struct CommandNode {
    name: String,
    description: String,
    options: Vec<OptionNode>,
    subcommands: Vec<SubcommandNode>,
    handler: Option<SharedHandler>,
}

impl CommandNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            options: Vec::new(),
            subcommands: Vec::new(),
            handler: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn option(mut self, option: OptionNode) -> Self {
        self.options.push(option);
        self
    }

    pub fn subcommand(mut self, subcommand: SubcommandNode) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    fn build(self) -> Result<CommandEntry, CommandTreeError> {
        let Self {
            name,
            description,
            options,
            subcommands,
            handler,
        } = self;
        if name.is_empty() {
            return Err(CommandTreeError::EmptyName);
        }
        if description.is_empty() {
            return Err(CommandTreeError::EmptyDescription { name });
        }
        let options = build_options(options, &name)?;

        let (route, subcommand_specs) = match handler {
            Some(_) if !subcommands.is_empty() => {
                return Err(CommandTreeError::HandlerAndSubcommands { name });
            }
            Some(handler) => (Route::Handler(handler), Vec::new()),
            None if subcommands.is_empty() => {
                return Err(CommandTreeError::MissingHandler { name });
            }
            None => {
                if !options.is_empty() {
                    return Err(CommandTreeError::OptionsAndSubcommands { name });
                }
                ensure_unique(
                    &format!("command '{name}'"),
                    subcommands.iter().map(|s| s.name.as_str()),
                )?;
                let mut specs = Vec::with_capacity(subcommands.len());
                let mut handlers = Vec::with_capacity(subcommands.len());
                for node in subcommands {
                    let (spec, handler) = node.build(&name)?;
                    handlers.push((spec.name.clone(), handler));
                    specs.push(spec);
                }
                (Route::Subcommands(handlers), specs)
            }
        };

        Ok(CommandEntry {
            spec: CommandSpec {
                name,
                description,
                options,
                subcommands: subcommand_specs,
            },
            route,
        })
    }
}

/// Collects top-level commands for one session.
#[derive(Default)]
pub struct CommandTreeBuilder {
    commands: Vec<CommandNode>,
}

impl CommandTreeBuilder {
    pub fn command(mut self, command: CommandNode) -> Self {
        self.commands.push(command);
        self
    }

    /// Validate every node and freeze the tree.
    ///
    /// Fails on the first violation: an empty name or description, a command
    /// without a handler and without subcommands, a command with both, a
    /// subcommand without a handler, or duplicate sibling names.
    pub fn build(self) -> Result<CommandTree, CommandTreeError> {
        ensure_unique(
            "the command tree",
            self.commands.iter().map(|c| c.name.as_str()),
        )?;
        let entries = self
            .commands
            .into_iter()
            .map(CommandNode::build)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CommandTree::from_entries(entries))
    }
}

fn build_options(options: Vec<OptionNode>, parent: &str) -> Result<Vec<OptionSpec>, CommandTreeError> {
    ensure_unique(
        &format!("options of '{parent}'"),
        options.iter().map(|o| o.name.as_str()),
    )?;
    options.into_iter().map(|o| o.build(parent)).collect()
}

fn ensure_unique<'a>(
    scope: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), CommandTreeError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(CommandTreeError::DuplicateName {
                scope: scope.to_string(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
