//! Main menu entries

/// Main menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuChoice {
    Exit,
    Record,
    Replay,
}

impl MenuChoice {
    /// All entries in display order
    pub const ALL: [MenuChoice; 3] = [MenuChoice::Exit, MenuChoice::Record, MenuChoice::Replay];

    /// Key the user types to pick this entry
    pub fn key(&self) -> &'static str {
        match self {
            MenuChoice::Exit => "0",
            MenuChoice::Record => "1",
            MenuChoice::Replay => "2",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::Exit => "Exit program",
            MenuChoice::Record => "Start new recording",
            MenuChoice::Replay => "Replay existing recording",
        }
    }

    /// Parse user input, ignoring surrounding whitespace
    pub fn from_input(input: &str) -> Option<Self> {
        let input = input.trim();
        Self::ALL.into_iter().find(|c| c.key() == input)
    }
}
