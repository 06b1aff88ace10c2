//! Available commands, role access and autocomplete logic

use crate::api::types::Role;

const EVERYONE: &[Role] = &[Role::Admin, Role::Supervisor, Role::Operator];
const MANAGERS: &[Role] = &[Role::Admin, Role::Supervisor];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  /// Roles allowed to run the command
  pub roles: &'static [Role],
}

impl Command {
  pub fn allows(&self, role: Role) -> bool {
    self.roles.contains(&role)
  }
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "dashboard",
    aliases: &["d", "home", "earnings"],
    description: "Daily and monthly earnings",
    roles: EVERYONE,
  },
  Command {
    name: "services",
    aliases: &["s", "service"],
    description: "Services performed by day",
    roles: EVERYONE,
  },
  Command {
    name: "agenda",
    aliases: &["a", "appointments", "calendar"],
    description: "Appointments for the day",
    roles: EVERYONE,
  },
  Command {
    name: "sales",
    aliases: &["sale"],
    description: "Product sales by day",
    roles: MANAGERS,
  },
  Command {
    name: "inventory",
    aliases: &["i", "stock", "products"],
    description: "Products and stock levels",
    roles: MANAGERS,
  },
  Command {
    name: "income",
    aliases: &["incomes", "extra"],
    description: "Additional income by day",
    roles: MANAGERS,
  },
  Command {
    name: "payments",
    aliases: &["p", "pay", "payroll"],
    description: "Payments owed to employees",
    roles: ADMIN_ONLY,
  },
  Command {
    name: "expenses",
    aliases: &["e", "expense", "costs"],
    description: "Operating expenses by month",
    roles: ADMIN_ONLY,
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit shopdesk",
    roles: EVERYONE,
  },
];

/// Look up a command by exact name or alias.
pub fn find(name: &str) -> Option<&'static Command> {
  let name = name.trim().to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == name || cmd.aliases.contains(&name.as_str()))
}

/// Autocomplete suggestions for a given input, limited to what `role` may run
pub fn get_suggestions(input: &str, role: Role) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();
  let visible = COMMANDS.iter().filter(|cmd| cmd.allows(role));

  if input_lower.is_empty() {
    return visible.collect();
  }

  let mut matches: Vec<(&Command, u32)> = visible
    .filter_map(|cmd| match_rank(cmd, &input_lower).map(|rank| (cmd, rank)))
    .collect();

  // Stable sort keeps declaration order within a rank
  matches.sort_by_key(|(_, rank)| *rank);
  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

fn match_rank(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}
