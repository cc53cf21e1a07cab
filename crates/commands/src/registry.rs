use std::collections::HashMap;

use crate::{
    Command, CommandDescriptor, echo::EchoCommand, help::HelpCommand, poem::PoemCommand,
    price::PriceCommand, swap::SwapCommand,
};

/// Ordered table of commands, keyed by dispatch token.
pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
    by_name: HashMap<&'static str, usize>,
    descriptors: Vec<CommandDescriptor>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            by_name: HashMap::new(),
            descriptors: Vec::new(),
        }
    }

    /// Registry with every built-in command.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(HelpCommand));
        registry.register(Box::new(EchoCommand));
        registry.register(Box::new(PoemCommand));
        registry.register(Box::new(PriceCommand));
        registry.register(Box::new(SwapCommand));
        registry
    }

    /// Add a command. A command with the same name replaces the earlier one
    /// in place, keeping its position in the help listing.
    pub fn register(&mut self, command: Box<dyn Command>) {
        let descriptor = command.descriptor();
        match self.by_name.get(descriptor.name) {
            Some(&idx) => {
                self.commands[idx] = command;
                self.descriptors[idx] = descriptor;
            },
            None => {
                self.by_name.insert(descriptor.name, self.commands.len());
                self.commands.push(command);
                self.descriptors.push(descriptor);
            },
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.by_name
            .get(name)
            .map(|&idx| self.commands[idx].as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> &[CommandDescriptor] {
        &self.descriptors
    }

    pub fn list(&self) -> Vec<&'static str> {
        self.descriptors.iter().map(|d| d.name).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
