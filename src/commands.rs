/// Shell commands and prefix/alias matching

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All commands the shell understands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "projects",
    aliases: &["ps", "list"],
    usage: "projects [--name N] [--page P] [--size S]",
    description: "List projects",
  },
  Command {
    name: "project",
    aliases: &["p", "show"],
    usage: "project <id>",
    description: "Show one project",
  },
  Command {
    name: "config",
    aliases: &["c", "cat"],
    usage: "config <id>",
    description: "Print a project's compose configuration",
  },
  Command {
    name: "config-set",
    aliases: &["cs", "apply"],
    usage: "config-set <id> <file>",
    description: "Validate and upload a compose file",
  },
  Command {
    name: "update",
    aliases: &["u", "rename"],
    usage: "update <id> [--name N] [--description D]",
    description: "Change a project's name or description",
  },
  Command {
    name: "nodes",
    aliases: &["n", "node"],
    usage: "nodes <project> [--name N] [--page P] [--size S]",
    description: "List a project's nodes",
  },
  Command {
    name: "auto-sync",
    aliases: &["as", "sync"],
    usage: "auto-sync <project> <node> <on|off>",
    description: "Toggle automatic sync on a node",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    usage: "refresh",
    description: "Drop cached reads so the next command refetches",
  },
  Command {
    name: "help",
    aliases: &["h", "?"],
    usage: "help",
    description: "Show this list",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Leave the shell",
  },
];

/// Get suggestions for a given input, best match first
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0));
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
    }
  }

  // Stable, so table order breaks ties
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Resolve a typed command word to a command name.
///
/// Exact names and aliases always win. A prefix or fuzzy match only counts
/// when it is unambiguous.
pub fn resolve(input: &str) -> Result<&'static Command, Vec<&'static Command>> {
  let input_lower = input.to_lowercase();
  let suggestions = get_suggestions(&input_lower);

  let exact = suggestions
    .first()
    .copied()
    .filter(|cmd| cmd.name == input_lower || cmd.aliases.contains(&input_lower.as_str()));
  if let Some(cmd) = exact {
    return Ok(cmd);
  }
  if suggestions.len() == 1 {
    return Ok(suggestions[0]);
  }
  Err(suggestions)
}

/// The help text listing every command
pub fn help() -> String {
  let width = COMMANDS.iter().map(|c| c.usage.len()).max().unwrap_or(0);
  let mut out = String::new();
  for cmd in COMMANDS {
    out.push_str(&format!(
      "  {:width$}  {} ({})\n",
      cmd.usage,
      cmd.description,
      cmd.aliases.join(", "),
      width = width
    ));
  }
  out
}
