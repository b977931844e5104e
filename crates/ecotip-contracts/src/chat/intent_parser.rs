use super::command_registry::{
    Action, CommandSpec, ACTIVITY_COMMAND, NO_ARG_COMMANDS, QUANTITY_COMMANDS, RAW_ARG_COMMANDS,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    Noop,
    SetCarKm(f64),
    SetMeatMeals(u32),
    SetElectricityKwh(f64),
    SetActivity {
        car_km: f64,
        meat_meals: u32,
        electricity_kwh: f64,
    },
    SetModel(String),
    GenerateTip,
    UnlockPro,
    Show,
    Help,
    Quit,
    Invalid {
        command: String,
        reason: String,
    },
    Unknown {
        command: String,
        arg: String,
    },
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<Action> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn split_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg.split_whitespace().map(str::to_string).collect(),
    }
}

fn parse_real(command: &str, raw: &str) -> Result<f64, ChatCommand> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| invalid(command, format!("'{raw}' is not a number")))
}

fn parse_count(command: &str, raw: &str) -> Result<u32, ChatCommand> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| invalid(command, format!("'{raw}' is not a whole number")))
}

fn invalid(command: &str, reason: String) -> ChatCommand {
    ChatCommand::Invalid {
        command: command.to_string(),
        reason,
    }
}

fn parse_quantity(command: &str, action: Action, arg: &str) -> ChatCommand {
    let parts = split_args(arg);
    let [value] = parts.as_slice() else {
        return invalid(command, format!("/{command} takes exactly one value"));
    };
    let parsed = match action {
        Action::SetCarKm => parse_real(command, value).map(ChatCommand::SetCarKm),
        Action::SetMeatMeals => parse_count(command, value).map(ChatCommand::SetMeatMeals),
        _ => parse_real(command, value).map(ChatCommand::SetElectricityKwh),
    };
    parsed.unwrap_or_else(|err| err)
}

fn parse_activity(command: &str, arg: &str) -> ChatCommand {
    let parts = split_args(arg);
    let [car, meals, kwh] = parts.as_slice() else {
        return invalid(command, format!("/{command} takes <km> <meals> <kwh>"));
    };
    activity_values(command, car, meals, kwh).unwrap_or_else(|err| err)
}

fn activity_values(
    command: &str,
    car: &str,
    meals: &str,
    kwh: &str,
) -> Result<ChatCommand, ChatCommand> {
    Ok(ChatCommand::SetActivity {
        car_km: parse_real(command, car)?,
        meat_meals: parse_count(command, meals)?,
        electricity_kwh: parse_real(command, kwh)?,
    })
}

fn no_arg_command(action: Action) -> ChatCommand {
    match action {
        Action::GenerateTip => ChatCommand::GenerateTip,
        Action::UnlockPro => ChatCommand::UnlockPro,
        Action::Show => ChatCommand::Show,
        Action::Help => ChatCommand::Help,
        _ => ChatCommand::Quit,
    }
}

pub fn parse_command(text: &str) -> ChatCommand {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return ChatCommand::Noop;
    }

    let Some(slash_tail) = trimmed.strip_prefix('/') else {
        return ChatCommand::Unknown {
            command: String::new(),
            arg: trimmed.to_string(),
        };
    };
    let command_len = slash_tail
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .count();
    let command = slash_tail[..command_len].to_ascii_lowercase();
    let arg = slash_tail[command_len..].trim();

    if command == ACTIVITY_COMMAND.command {
        return parse_activity(&command, arg);
    }
    if let Some(action) = find_action(&command, QUANTITY_COMMANDS) {
        return parse_quantity(&command, action, arg);
    }
    if find_action(&command, RAW_ARG_COMMANDS).is_some() {
        if arg.is_empty() {
            return invalid(&command, format!("/{command} requires a value"));
        }
        return ChatCommand::SetModel(arg.to_string());
    }
    if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
        return no_arg_command(action);
    }

    ChatCommand::Unknown {
        command,
        arg: arg.to_string(),
    }
}
