//! Panel pages and buttons.
//!
//! The page is an explicit sum type; the presentation layer renders from
//! it rather than encoding navigation in control visibility. Cancel is a
//! terminal action surfaced as an exit event, never handled inline.

// ── Pages ──────────────────────────────────────────────────

/// Which panel page is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuPage {
    /// Main menu: play, options, cancel.
    Menu,
    /// The agility game.
    Play,
    /// Options: night-mode checkbox, difficulty slider, refresh.
    Options,
}

impl MenuPage {
    /// String representation for IPC and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::Play => "play",
            Self::Options => "options",
        }
    }
}

// ── Buttons ────────────────────────────────────────────────

/// Number of distinct buttons, for hover bookkeeping.
pub const BUTTON_COUNT: usize = 4;

/// Interactive buttons across all pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuButton {
    Play,
    Options,
    Cancel,
    /// Back-to-menu button shown on the options page and after game
    /// completion; also records the best time and resets the clock.
    Refresh,
}

impl MenuButton {
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// String representation for IPC and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Options => "options",
            Self::Cancel => "cancel",
            Self::Refresh => "refresh",
        }
    }

    /// Page this button navigates to. `None` marks the exit action.
    pub fn target_page(&self) -> Option<MenuPage> {
        match self {
            Self::Play => Some(MenuPage::Play),
            Self::Options => Some(MenuPage::Options),
            Self::Refresh => Some(MenuPage::Menu),
            Self::Cancel => None,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────
