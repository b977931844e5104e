#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    SetCarKm,
    SetMeatMeals,
    SetElectricityKwh,
    SetActivity,
    SetModel,
    GenerateTip,
    UnlockPro,
    Show,
    Help,
    Quit,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: Action,
}

pub(crate) const QUANTITY_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "car",
        action: Action::SetCarKm,
    },
    CommandSpec {
        command: "meat",
        action: Action::SetMeatMeals,
    },
    CommandSpec {
        command: "power",
        action: Action::SetElectricityKwh,
    },
    CommandSpec {
        command: "kwh",
        action: Action::SetElectricityKwh,
    },
];

pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "model",
    action: Action::SetModel,
}];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "tip",
        action: Action::GenerateTip,
    },
    CommandSpec {
        command: "unlock",
        action: Action::UnlockPro,
    },
    CommandSpec {
        command: "show",
        action: Action::Show,
    },
    CommandSpec {
        command: "help",
        action: Action::Help,
    },
    CommandSpec {
        command: "quit",
        action: Action::Quit,
    },
    CommandSpec {
        command: "exit",
        action: Action::Quit,
    },
];

pub(crate) const ACTIVITY_COMMAND: CommandSpec = CommandSpec {
    command: "log",
    action: Action::SetActivity,
};

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/car <km>",
    "/meat <meals>",
    "/power <kwh>",
    "/log <km> <meals> <kwh>",
    "/tip",
    "/unlock",
    "/show",
    "/model <id>",
    "/help",
    "/quit",
];
