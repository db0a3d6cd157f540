//! Keybinding registry: maps key events to actions per context, with
//! overrides from the `[keybindings]` config table.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Actions and Contexts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavLeft,
    NavRight,
    NavUp,
    NavDown,
    CycleFocus,
    Select,
    Play,
    Share,
    LongPress,
    Reload,
    CycleTheme,
    ShowHelp,
    Back,
}

impl Action {
    const ALL: [Action; 14] = [
        Action::Quit,
        Action::NavLeft,
        Action::NavRight,
        Action::NavUp,
        Action::NavDown,
        Action::CycleFocus,
        Action::Select,
        Action::Play,
        Action::Share,
        Action::LongPress,
        Action::Reload,
        Action::CycleTheme,
        Action::ShowHelp,
        Action::Back,
    ];

    /// Config name, as used in `[keybindings]`.
    pub fn config_name(self) -> &'static str {
        match self {
            Self::Quit => "quit",
            Self::NavLeft => "nav_left",
            Self::NavRight => "nav_right",
            Self::NavUp => "nav_up",
            Self::NavDown => "nav_down",
            Self::CycleFocus => "cycle_focus",
            Self::Select => "select",
            Self::Play => "play",
            Self::Share => "share",
            Self::LongPress => "long_press",
            Self::Reload => "reload",
            Self::CycleTheme => "cycle_theme",
            Self::ShowHelp => "show_help",
            Self::Back => "back",
        }
    }

    /// Help screen text.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit",
            Self::NavLeft => "Previous show",
            Self::NavRight => "Next show",
            Self::NavUp => "Previous episode",
            Self::NavDown => "Next episode",
            Self::CycleFocus => "Switch between shows and episodes",
            Self::Select => "Open show / play episode / run action",
            Self::Play => "Play latest episode",
            Self::Share => "Share",
            Self::LongPress => "Mark show for play/share",
            Self::Reload => "Reload library",
            Self::CycleTheme => "Cycle theme",
            Self::ShowHelp => "Show help",
            Self::Back => "Close overlay",
        }
    }

    fn from_config_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|a| a.config_name() == name)
    }
}

/// Which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    ShowStrip,
    Episodes,
    Help,
}

// ============================================================================
// Key Specification
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn char(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Terminals report `T` as `Char('T')` with SHIFT; bindings store the
    /// bare character.
    fn normalized(self) -> Self {
        match self.code {
            KeyCode::Char(_) | KeyCode::BackTab => {
                Self::new(self.code, self.modifiers.difference(KeyModifiers::SHIFT))
            }
            _ => self,
        }
    }
}

/// Parse a config key string: `"q"`, `"Enter"`, `"Ctrl+d"`, `"F5"`.
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+").or_else(|| s.strip_prefix("ctrl+")) {
        let mut chars = rest.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeySpec::ctrl(c.to_ascii_lowercase())),
            _ => None,
        };
    }

    let named = match s.to_ascii_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "backtab" => Some(KeyCode::BackTab),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "space" => Some(KeyCode::Char(' ')),
        _ => None,
    };
    if let Some(code) = named {
        return Some(KeySpec::plain(code));
    }

    if let Some(n) = s
        .strip_prefix(['F', 'f'])
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (1..=12).contains(n))
    {
        return Some(KeySpec::plain(KeyCode::F(n)));
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::char(c)),
        _ => None,
    }
}

fn format_key(key: &KeySpec) -> String {
    let name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "BackTab".to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        _ => "?".to_string(),
    };
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        format!("Ctrl+{name}")
    } else {
        name
    }
}

// ============================================================================
// Registry
// ============================================================================

const DEFAULT_BINDINGS: &[(Context, KeySpec, Action)] = &[
    (Context::Global, KeySpec::char('q'), Action::Quit),
    (Context::Global, KeySpec::ctrl('c'), Action::Quit),
    (Context::Global, KeySpec::plain(KeyCode::Tab), Action::CycleFocus),
    (Context::Global, KeySpec::plain(KeyCode::BackTab), Action::CycleFocus),
    (Context::Global, KeySpec::plain(KeyCode::Enter), Action::Select),
    (Context::Global, KeySpec::char('j'), Action::NavDown),
    (Context::Global, KeySpec::plain(KeyCode::Down), Action::NavDown),
    (Context::Global, KeySpec::char('k'), Action::NavUp),
    (Context::Global, KeySpec::plain(KeyCode::Up), Action::NavUp),
    (Context::Global, KeySpec::char('p'), Action::Play),
    (Context::Global, KeySpec::char('s'), Action::Share),
    (Context::Global, KeySpec::char('r'), Action::Reload),
    (Context::Global, KeySpec::char('T'), Action::CycleTheme),
    (Context::Global, KeySpec::char('?'), Action::ShowHelp),
    (Context::Global, KeySpec::plain(KeyCode::Esc), Action::Back),
    (Context::ShowStrip, KeySpec::char('h'), Action::NavLeft),
    (Context::ShowStrip, KeySpec::plain(KeyCode::Left), Action::NavLeft),
    (Context::ShowStrip, KeySpec::char('l'), Action::NavRight),
    (Context::ShowStrip, KeySpec::plain(KeyCode::Right), Action::NavRight),
    (Context::ShowStrip, KeySpec::char('m'), Action::LongPress),
    (Context::Help, KeySpec::plain(KeyCode::Esc), Action::Back),
    (Context::Help, KeySpec::char('?'), Action::Back),
    (Context::Help, KeySpec::char('q'), Action::Back),
];

/// Context-aware key → action lookup.
#[derive(Debug, Clone)]
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    /// Declaration order, for the help screen.
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        for &(context, key, action) in DEFAULT_BINDINGS {
            registry.bind(context, key, action);
        }
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    /// Apply `[keybindings]` overrides. Each override replaces every default
    /// key of that action, in the same contexts. Returns warnings for
    /// entries that could not be applied.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        // Sorted for deterministic results when two overrides share a key.
        let mut entries: Vec<_> = overrides.iter().collect();
        entries.sort();

        for (name, key_str) in entries {
            let Some(action) = Action::from_config_name(name) else {
                warnings.push(format!("Unknown action '{name}', ignoring"));
                continue;
            };
            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!("Cannot parse key '{key_str}' for '{name}', ignoring"));
                continue;
            };

            let mut contexts: Vec<Context> = Vec::new();
            for (context, _, _) in self.bindings.iter().filter(|(_, _, a)| *a == action) {
                if !contexts.contains(context) {
                    contexts.push(*context);
                }
            }

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);
            for context in contexts {
                self.bind(context, key, action);
            }

            tracing::info!(action = %name, key = %key_str, "Applied keybinding override");
        }

        warnings
    }

    /// Action for a key in `context`, falling back to Global. The Help
    /// context does not fall back: only its own keys work there.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers).normalized();
        if let Some(&action) = self.lookup.get(&(context, key)) {
            return Some(action);
        }
        match context {
            Context::Global | Context::Help => None,
            _ => self.lookup.get(&(Context::Global, key)).copied(),
        }
    }

    /// `(context, key label, description)` rows for the help screen.
    pub fn all_bindings(&self) -> Vec<(Context, String, &'static str)> {
        self.bindings
            .iter()
            .map(|(context, key, action)| (*context, format_key(key), action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
