use crate::services::fullscreen_watcher::WatcherCommand;
use std::str::FromStr;

/// Пункты меню оболочки
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Toggle,
    Reset,
    About,
    Status,
    Help,
    Quit,
}

impl MenuAction {
    pub const ALL: [MenuAction; 6] = [
        MenuAction::Toggle,
        MenuAction::Reset,
        MenuAction::About,
        MenuAction::Status,
        MenuAction::Help,
        MenuAction::Quit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::Toggle => "Toggle Active",
            MenuAction::Reset => "Reset Counter",
            MenuAction::About => "About",
            MenuAction::Status => "Status",
            MenuAction::Help => "Help",
            MenuAction::Quit => "Quit",
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            MenuAction::Toggle => "toggle",
            MenuAction::Reset => "reset",
            MenuAction::About => "about",
            MenuAction::Status => "status",
            MenuAction::Help => "help",
            MenuAction::Quit => "quit",
        }
    }

    /// Команда для наблюдателя, если пункт меняет его состояние
    pub fn watcher_command(&self) -> Option<WatcherCommand> {
        match self {
            MenuAction::Toggle => Some(WatcherCommand::Toggle),
            MenuAction::Reset => Some(WatcherCommand::Reset),
            MenuAction::Quit => Some(WatcherCommand::Quit),
            MenuAction::About | MenuAction::Status | MenuAction::Help => None,
        }
    }
}

impl FromStr for MenuAction {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "toggle" | "t" | "pause" | "resume" => Ok(MenuAction::Toggle),
            "reset" | "r" => Ok(MenuAction::Reset),
            "about" | "a" => Ok(MenuAction::About),
            "status" | "s" => Ok(MenuAction::Status),
            "help" | "h" | "?" => Ok(MenuAction::Help),
            "quit" | "q" | "exit" => Ok(MenuAction::Quit),
            other => Err(format!("Неизвестная команда: {}", other)),
        }
    }
}

pub fn help_text() -> String {
    let mut lines = vec!["Команды:".to_string()];
    for action in MenuAction::ALL {
        lines.push(format!("  {:<8} {}", action.keyword(), action.label()));
    }
    lines.push("Сигналы: SIGUSR1 = Toggle Active, SIGUSR2 = Reset Counter, Ctrl+C = Quit".to_string());
    lines.join("\n")
}
