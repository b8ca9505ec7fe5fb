use std::fmt;
use strum_macros::EnumString;

/// A named UI event. Recognised control events get their own variant;
/// everything else (widget changes, model buttons) passes through as
/// `Widget` with its key.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
pub enum UiEvent {
    #[strum(serialize = "setup")]
    Setup,
    #[strum(serialize = "go once")]
    GoOnce,
    #[strum(serialize = "go")]
    Go,
    #[strum(serialize = "Stop")]
    Stop,
    #[strum(
        serialize = "Exit",
        serialize = "Escape:27",
        serialize = "q",
        serialize = "Q",
        serialize = "D:68",
        serialize = "d:68"
    )]
    Exit,
    #[strum(default)]
    Widget(String),
}

impl UiEvent {
    /// Never fails: unknown names become `Widget`.
    pub fn parse(name: &str) -> UiEvent {
        name.parse()
            .unwrap_or_else(|_| UiEvent::Widget(name.to_string()))
    }

    pub fn widget(key: &str) -> UiEvent {
        UiEvent::Widget(key.to_string())
    }

    pub fn name(&self) -> &str {
        match self {
            UiEvent::Setup => "setup",
            UiEvent::GoOnce => "go once",
            UiEvent::Go => "go",
            UiEvent::Stop => "Stop",
            UiEvent::Exit => "Exit",
            UiEvent::Widget(key) => key,
        }
    }

    pub fn is_control(&self) -> bool {
        !matches!(self, UiEvent::Widget(_))
    }
}

impl fmt::Display for UiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
