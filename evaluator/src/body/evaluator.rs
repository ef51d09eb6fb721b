//! Frame-driven panel evaluator.
//!
//! One evaluator holds the immutable configuration; every piece of
//! mutable session state lives in [`GestureState`], passed in and
//! returned by each step. A step consumes one body snapshot, first
//! applying placement coaching and then the active page's controls,
//! and reports every observable transition as a [`PanelEvent`].
//!
//! Page dispatch is decided once per frame, so a button press that
//! changes the page never runs the new page's controls until the next
//! frame. Within the menu page all three buttons are still evaluated
//! after a press, matching the panel's original feel.

use crate::config::Config;

use super::agility::{self, GameEvent, GameState};
use super::coaching::{self, CoachingMessage, Margins};
use super::latch::GripLatch;
use super::menu::{MenuButton, MenuPage, BUTTON_COUNT};
use super::skeleton::{BodySnapshot, Hand, HandState};
use super::slider::{self, SliderEvent, SliderState};
use super::zones::zone_hit;

// ── Clock ──────────────────────────────────────────────────

/// Session clock: whole seconds, advanced by the driver's tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockState {
    pub seconds: u64,
    pub running: bool,
}

/// Render seconds as the panel's mm:ss display. Minutes wrap at an
/// hour, like the original timestamp formatting.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", (seconds / 60) % 60, seconds % 60)
}

// ── Gesture state ──────────────────────────────────────────

/// All mutable per-session state.
#[derive(Debug, Clone)]
pub struct GestureState {
    pub page: MenuPage,
    /// Last coaching message, `None` until the first frame.
    pub coaching: Option<CoachingMessage>,
    /// Placement margins, adjustable at runtime.
    pub margins: Margins,
    pub slider: SliderState,
    pub game: GameState,
    pub clock: ClockState,
    /// Fastest completed game, in seconds.
    pub best_seconds: Option<u64>,
    pub night_mode: bool,
    /// Skeleton overlay visibility.
    pub overlay: bool,
    /// Per-hand latches for the night-mode checkbox.
    pub night_grips: [GripLatch; 2],
    pub button_hover: [bool; BUTTON_COUNT],
    pub checkbox_hover: bool,
    /// Set once the cancel button fires; the driver decides what to do.
    pub exit_requested: bool,
}

impl GestureState {
    /// Whether the last coaching pass found the user well placed.
    pub fn positioned(&self) -> bool {
        matches!(self.coaching, Some(m) if m.is_positioned())
    }
}

// ── Events ─────────────────────────────────────────────────

/// Observable transitions produced by a step.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    Coaching { message: CoachingMessage },
    ButtonEntered { button: MenuButton },
    ButtonExited { button: MenuButton },
    PageChanged { from: MenuPage, to: MenuPage },
    /// The cancel button fired.
    ExitRequested,
    BestTime { seconds: u64 },
    NightMode { enabled: bool },
    CheckboxEntered,
    CheckboxExited,
    Overlay { enabled: bool },
    ClockStarted,
    ClockTick { seconds: u64 },
    ClockReset,
    Slider(SliderEvent),
    Game(GameEvent),
}

impl PanelEvent {
    /// Convert the event to an IPC s-expression.
    pub fn to_sexp(&self) -> String {
        match self {
            Self::Coaching { message } => {
                format!(
                    "(:type :event :event :coaching :message :{} :text \"{}\")",
                    message.as_str(),
                    message.display_text(),
                )
            }
            Self::ButtonEntered { button } => {
                format!(
                    "(:type :event :event :button-entered :button :{})",
                    button.as_str()
                )
            }
            Self::ButtonExited { button } => {
                format!(
                    "(:type :event :event :button-exited :button :{})",
                    button.as_str()
                )
            }
            Self::PageChanged { from, to } => {
                format!(
                    "(:type :event :event :page-changed :from :{} :to :{})",
                    from.as_str(),
                    to.as_str()
                )
            }
            Self::ExitRequested => "(:type :event :event :exit-requested)".to_string(),
            Self::BestTime { seconds } => {
                format!("(:type :event :event :best-time :seconds {})", seconds)
            }
            Self::NightMode { enabled } => {
                format!(
                    "(:type :event :event :night-mode :enabled {})",
                    if *enabled { "t" } else { "nil" }
                )
            }
            Self::CheckboxEntered => "(:type :event :event :checkbox-entered)".to_string(),
            Self::CheckboxExited => "(:type :event :event :checkbox-exited)".to_string(),
            Self::Overlay { enabled } => {
                format!(
                    "(:type :event :event :overlay :enabled {})",
                    if *enabled { "t" } else { "nil" }
                )
            }
            Self::ClockStarted => "(:type :event :event :clock-started)".to_string(),
            Self::ClockTick { seconds } => {
                format!(
                    "(:type :event :event :clock-tick :seconds {} :display \"{}\")",
                    seconds,
                    format_clock(*seconds)
                )
            }
            Self::ClockReset => "(:type :event :event :clock-reset)".to_string(),
            Self::Slider(event) => event.to_sexp(),
            Self::Game(event) => event.to_sexp(),
        }
    }
}

// ── Evaluator ──────────────────────────────────────────────

/// Pure state-transition engine over [`GestureState`].
pub struct Evaluator {
    config: Config,
}

impl Evaluator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Fresh session state: menu page, stopped clock, no progress.
    pub fn initial_state(&self) -> GestureState {
        GestureState {
            page: MenuPage::Menu,
            coaching: None,
            margins: self.config.margins,
            slider: SliderState::default(),
            game: GameState::new(self.config.game.targets.len()),
            clock: ClockState::default(),
            best_seconds: None,
            night_mode: false,
            overlay: false,
            night_grips: [GripLatch::default(); 2],
            button_hover: [false; BUTTON_COUNT],
            checkbox_hover: false,
            exit_requested: false,
        }
    }

    /// Advance one body frame. Untracked bodies change nothing.
    pub fn step(&self, state: &GestureState, body: &BodySnapshot) -> (GestureState, Vec<PanelEvent>) {
        let mut next = state.clone();
        let mut events = Vec::new();
        if !body.tracked {
            return (next, events);
        }
        self.step_coaching(&mut next, body, &mut events);
        match next.page {
            MenuPage::Menu => self.step_menu(&mut next, body, &mut events),
            MenuPage::Play => self.step_play(&mut next, body, &mut events),
            MenuPage::Options => self.step_options(&mut next, body, &mut events),
        }
        (next, events)
    }

    /// Advance the session clock by one second while it runs.
    pub fn tick_clock(&self, state: &GestureState) -> (GestureState, Vec<PanelEvent>) {
        let mut next = state.clone();
        let mut events = Vec::new();
        if next.clock.running {
            next.clock.seconds += 1;
            events.push(PanelEvent::ClockTick {
                seconds: next.clock.seconds,
            });
        }
        (next, events)
    }

    /// Current session state as an IPC s-expression.
    pub fn status_sexp(&self, state: &GestureState) -> String {
        let coaching = state
            .coaching
            .map(|m| format!(":{}", m.as_str()))
            .unwrap_or_else(|| "nil".to_string());
        let best = state
            .best_seconds
            .map(|s| s.to_string())
            .unwrap_or_else(|| "nil".to_string());
        let active = state
            .game
            .active_target()
            .map(|i| i.to_string())
            .unwrap_or_else(|| "nil".to_string());
        format!(
            "(:page :{} :coaching {} :positioned {} :slider-value {} :night-mode {} :overlay {} \
             :seconds {} :clock \"{}\" :clock-running {} :best-seconds {} :active-target {} \
             :targets-touched {} :targets-total {} \
             :hovered (:play {} :options {} :cancel {} :refresh {} :checkbox {} :slider {}) \
             :margins (:top {:.2} :bottom {:.2} :sides {:.2}))",
            state.page.as_str(),
            coaching,
            if state.positioned() { "t" } else { "nil" },
            state.slider.value,
            if state.night_mode { "t" } else { "nil" },
            if state.overlay { "t" } else { "nil" },
            state.clock.seconds,
            format_clock(state.clock.seconds),
            if state.clock.running { "t" } else { "nil" },
            best,
            active,
            state.game.touched_count(),
            state.game.touched.len(),
            if state.button_hover[MenuButton::Play.index()] { "t" } else { "nil" },
            if state.button_hover[MenuButton::Options.index()] { "t" } else { "nil" },
            if state.button_hover[MenuButton::Cancel.index()] { "t" } else { "nil" },
            if state.button_hover[MenuButton::Refresh.index()] { "t" } else { "nil" },
            if state.checkbox_hover { "t" } else { "nil" },
            if state.slider.hovered { "t" } else { "nil" },
            state.margins.top,
            state.margins.bottom,
            state.margins.sides,
        )
    }

    /// Active configuration summary as an IPC s-expression.
    pub fn config_sexp(&self) -> String {
        format!(
            "(:surface (:width {:.0} :height {:.0}) :tolerance (:menu {:.3} :difficulty ({:.3} {:.3} {:.3})) \
             :center-offset {:.0} :targets {} :slider (:x {:.0} :y {:.0} :half-width {:.0}) :tick-ms {})",
            self.config.surface.width,
            self.config.surface.height,
            self.config.tolerance.menu,
            self.config.tolerance.difficulty[0],
            self.config.tolerance.difficulty[1],
            self.config.tolerance.difficulty[2],
            self.config.zones.center_offset,
            self.config.game.targets.len(),
            self.config.slider.x,
            self.config.slider.y,
            self.config.slider.half_width,
            self.config.clock.tick_ms,
        )
    }

    // ── Frame phases ───────────────────────────────────────

    fn step_coaching(&self, next: &mut GestureState, body: &BodySnapshot, events: &mut Vec<PanelEvent>) {
        let message = coaching::evaluate_placement(
            body,
            self.config.surface.width,
            self.config.surface.height,
            &next.margins,
        );
        if next.coaching != Some(message) {
            next.coaching = Some(message);
            events.push(PanelEvent::Coaching { message });
        }
    }

    fn step_menu(&self, next: &mut GestureState, body: &BodySnapshot, events: &mut Vec<PanelEvent>) {
        // Game progress does not survive a visit to the menu.
        next.game.reset(self.config.game.targets.len());
        let tolerance = self.config.tolerance.menu;
        for button in [MenuButton::Play, MenuButton::Cancel, MenuButton::Options] {
            self.step_button(button, tolerance, next, body, events);
        }
    }

    fn step_play(&self, next: &mut GestureState, body: &BodySnapshot, events: &mut Vec<PanelEvent>) {
        let tolerance = self.config.tolerance.for_difficulty(next.slider.value);
        if !next.positioned() {
            return;
        }
        let offset = self.config.zones.center_offset;
        if let Some(index) =
            agility::touch_step(&self.config.game, offset, tolerance, &mut next.game, body)
        {
            let remaining = next.game.touched.len() - next.game.touched_count();
            events.push(PanelEvent::Game(GameEvent::TargetTouched { index, remaining }));
            if next.game.all_touched() {
                next.clock.running = false;
                events.push(PanelEvent::Game(GameEvent::Completed {
                    seconds: next.clock.seconds,
                }));
            }
        }
        if next.game.all_touched() {
            // The back-to-menu button appears once the run is complete,
            // starting on the completion frame itself.
            self.step_button(MenuButton::Refresh, tolerance, next, body, events);
        }
    }

    fn step_options(&self, next: &mut GestureState, body: &BodySnapshot, events: &mut Vec<PanelEvent>) {
        let tolerance = self.config.tolerance.menu;
        self.step_checkbox(tolerance, next, body, events);
        // The skeleton overlay tracks night mode while this page is open.
        let night = next.night_mode;
        self.set_overlay(next, night, events);
        self.step_button(MenuButton::Refresh, tolerance, next, body, events);
        let offset = self.config.zones.center_offset;
        for event in slider::step(&self.config.slider, offset, tolerance, &mut next.slider, body) {
            events.push(PanelEvent::Slider(event));
        }
    }

    // ── Controls ───────────────────────────────────────────

    fn step_button(
        &self,
        button: MenuButton,
        tolerance: f64,
        next: &mut GestureState,
        body: &BodySnapshot,
        events: &mut Vec<PanelEvent>,
    ) {
        let zone = self
            .config
            .zones
            .for_button(button)
            .centered(self.config.zones.center_offset);
        let in_zone = zone_hit(&zone, tolerance, body.hand(Hand::Left), body.hand(Hand::Right));
        if in_zone != next.button_hover[button.index()] {
            next.button_hover[button.index()] = in_zone;
            events.push(if in_zone {
                PanelEvent::ButtonEntered { button }
            } else {
                PanelEvent::ButtonExited { button }
            });
        }
        if !in_zone {
            return;
        }
        if body.hand_state(Hand::Left) == HandState::Closed
            || body.hand_state(Hand::Right) == HandState::Closed
        {
            self.press_button(button, next, events);
        }
    }

    fn press_button(&self, button: MenuButton, next: &mut GestureState, events: &mut Vec<PanelEvent>) {
        if let Some(page) = button.target_page() {
            self.goto_page(next, page, events);
        }
        match button {
            MenuButton::Play => {
                if !next.clock.running {
                    next.clock.running = true;
                    events.push(PanelEvent::ClockStarted);
                }
            }
            MenuButton::Options => {}
            MenuButton::Cancel => {
                if !next.exit_requested {
                    next.exit_requested = true;
                    events.push(PanelEvent::ExitRequested);
                }
            }
            MenuButton::Refresh => {
                let seconds = next.clock.seconds;
                if seconds != 0 {
                    if next.best_seconds.map_or(true, |best| seconds < best) {
                        next.best_seconds = Some(seconds);
                        events.push(PanelEvent::BestTime { seconds });
                    }
                    // The clock is rewound but never stopped here.
                    next.clock.seconds = 0;
                    events.push(PanelEvent::ClockReset);
                }
            }
        }
    }

    fn step_checkbox(
        &self,
        tolerance: f64,
        next: &mut GestureState,
        body: &BodySnapshot,
        events: &mut Vec<PanelEvent>,
    ) {
        let zone = self
            .config
            .zones
            .checkbox
            .centered(self.config.zones.center_offset);
        let in_zone = zone_hit(&zone, tolerance, body.hand(Hand::Left), body.hand(Hand::Right));
        if in_zone != next.checkbox_hover {
            next.checkbox_hover = in_zone;
            events.push(if in_zone {
                PanelEvent::CheckboxEntered
            } else {
                PanelEvent::CheckboxExited
            });
        }
        if !in_zone {
            return;
        }
        // Each hand toggles independently; both closing in the same
        // frame toggles twice.
        for hand in [Hand::Right, Hand::Left] {
            if next.night_grips[hand.index()].observe(body.hand_state(hand)) {
                next.night_mode = !next.night_mode;
                events.push(PanelEvent::NightMode {
                    enabled: next.night_mode,
                });
            }
        }
    }

    fn goto_page(&self, next: &mut GestureState, to: MenuPage, events: &mut Vec<PanelEvent>) {
        if next.page == to {
            return;
        }
        events.push(PanelEvent::PageChanged {
            from: next.page,
            to,
        });
        next.page = to;
        self.clear_hovers(next, events);
    }

    fn set_overlay(&self, next: &mut GestureState, enabled: bool, events: &mut Vec<PanelEvent>) {
        if next.overlay != enabled {
            next.overlay = enabled;
            events.push(PanelEvent::Overlay { enabled });
        }
    }

    // Leaving a page hides its controls, so open hover affordances end.
    fn clear_hovers(&self, next: &mut GestureState, events: &mut Vec<PanelEvent>) {
        for button in [
            MenuButton::Play,
            MenuButton::Options,
            MenuButton::Cancel,
            MenuButton::Refresh,
        ] {
            if next.button_hover[button.index()] {
                next.button_hover[button.index()] = false;
                events.push(PanelEvent::ButtonExited { button });
            }
        }
        if next.checkbox_hover {
            next.checkbox_hover = false;
            events.push(PanelEvent::CheckboxExited);
        }
        if next.slider.hovered {
            next.slider.hovered = false;
            events.push(PanelEvent::Slider(SliderEvent::Exited));
        }
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::skeleton::{BodyJoint, JointPoint};

    fn evaluator() -> Evaluator {
        Evaluator::new(Config::default())
    }

    // A well-placed body with hands wherever the test needs them.
    fn body_at(left: (f64, f64), right: (f64, f64), ls: HandState, rs: HandState) -> BodySnapshot {
        let mut body = BodySnapshot::default();
        body.tracked = true;
        body.joints[BodyJoint::Head.index()] = JointPoint::new(960.0, 300.0);
        body.joints[BodyJoint::AnkleLeft.index()] = JointPoint::new(900.0, 900.0);
        body.joints[BodyJoint::AnkleRight.index()] = JointPoint::new(1020.0, 900.0);
        body.joints[BodyJoint::HandLeft.index()] = JointPoint::new(left.0, left.1);
        body.joints[BodyJoint::HandRight.index()] = JointPoint::new(right.0, right.1);
        body.hand_states[Hand::Left.index()] = ls;
        body.hand_states[Hand::Right.index()] = rs;
        body
    }

    fn hands_at(x: f64, y: f64, state: HandState) -> BodySnapshot {
        body_at((x, y), (x, y), state, state)
    }

    // Away from every control zone.
    fn rest() -> BodySnapshot {
        hands_at(960.0, 700.0, HandState::Open)
    }

    const PLAY: (f64, f64) = (962.0, 221.0);
    const CANCEL: (f64, f64) = (1301.0, 362.0);
    const OPTIONS: (f64, f64) = (625.0, 362.0);
    const REFRESH: (f64, f64) = (1221.0, 230.0);
    const CHECKBOX: (f64, f64) = (710.0, 230.0);

    #[test]
    fn test_initial_state() {
        let state = evaluator().initial_state();
        assert_eq!(state.page, MenuPage::Menu);
        assert_eq!(state.coaching, None);
        assert!(!state.positioned());
        assert_eq!(state.slider.value, 0);
        assert_eq!(state.clock, ClockState::default());
        assert_eq!(state.best_seconds, None);
        assert!(!state.night_mode);
        assert!(!state.exit_requested);
    }

    #[test]
    fn test_untracked_body_changes_nothing() {
        let ev = evaluator();
        let state = ev.initial_state();
        let mut body = rest();
        body.tracked = false;
        let (next, events) = ev.step(&state, &body);
        assert!(events.is_empty());
        assert_eq!(next.coaching, None);
    }

    #[test]
    fn test_coaching_event_only_on_change() {
        let ev = evaluator();
        let state = ev.initial_state();
        let (state, events) = ev.step(&state, &rest());
        assert!(events.contains(&PanelEvent::Coaching {
            message: CoachingMessage::Positioned
        }));
        assert!(state.positioned());
        let (_, events) = ev.step(&state, &rest());
        assert!(events.is_empty());
    }

    #[test]
    fn test_out_of_position_reports_move_back() {
        let ev = evaluator();
        let state = ev.initial_state();
        let mut body = rest();
        body.joints[BodyJoint::Head.index()].y = 50.0;
        let (state, events) = ev.step(&state, &body);
        assert!(events.contains(&PanelEvent::Coaching {
            message: CoachingMessage::MoveBack
        }));
        assert!(!state.positioned());
    }

    #[test]
    fn test_hovering_play_without_closing_stays_on_menu() {
        let ev = evaluator();
        let state = ev.initial_state();
        let (state, events) = ev.step(&state, &hands_at(PLAY.0, PLAY.1, HandState::Open));
        assert!(events.contains(&PanelEvent::ButtonEntered {
            button: MenuButton::Play
        }));
        assert_eq!(state.page, MenuPage::Menu);
        assert!(!state.clock.running);

        let (state, events) = ev.step(&state, &rest());
        assert!(events.contains(&PanelEvent::ButtonExited {
            button: MenuButton::Play
        }));
        assert_eq!(state.page, MenuPage::Menu);
    }

    #[test]
    fn test_closing_on_play_starts_the_game() {
        let ev = evaluator();
        let state = ev.initial_state();
        let (state, events) = ev.step(&state, &hands_at(PLAY.0, PLAY.1, HandState::Closed));
        assert!(events.contains(&PanelEvent::PageChanged {
            from: MenuPage::Menu,
            to: MenuPage::Play
        }));
        assert!(events.contains(&PanelEvent::ClockStarted));
        assert_eq!(state.page, MenuPage::Play);
        assert!(state.clock.running);
        // The press consumed the hover.
        assert_eq!(state.button_hover, [false; BUTTON_COUNT]);
    }

    #[test]
    fn test_cancel_requests_exit_without_leaving_menu() {
        let ev = evaluator();
        let state = ev.initial_state();
        let (state, events) = ev.step(&state, &hands_at(CANCEL.0, CANCEL.1, HandState::Closed));
        assert!(events.contains(&PanelEvent::ExitRequested));
        assert_eq!(state.page, MenuPage::Menu);
        assert!(state.exit_requested);

        // Holding the hand closed does not repeat the event.
        let (_, events) = ev.step(&state, &hands_at(CANCEL.0, CANCEL.1, HandState::Closed));
        assert!(!events.contains(&PanelEvent::ExitRequested));
    }

    #[test]
    fn test_options_and_back_via_refresh() {
        let ev = evaluator();
        let state = ev.initial_state();
        let (state, _) = ev.step(&state, &hands_at(OPTIONS.0, OPTIONS.1, HandState::Closed));
        assert_eq!(state.page, MenuPage::Options);

        let (state, events) = ev.step(&state, &hands_at(REFRESH.0, REFRESH.1, HandState::Closed));
        assert_eq!(state.page, MenuPage::Menu);
        assert!(events.contains(&PanelEvent::PageChanged {
            from: MenuPage::Options,
            to: MenuPage::Menu
        }));
        // Nothing to record with a zeroed clock.
        assert!(!events.contains(&PanelEvent::ClockReset));
        assert_eq!(state.best_seconds, None);
    }

    #[test]
    fn test_menu_page_clears_game_progress() {
        let ev = evaluator();
        let mut state = ev.initial_state();
        state.page = MenuPage::Play;
        state.coaching = Some(CoachingMessage::Positioned);
        let target = Config::default().game.targets[0].centered(50.0);
        let (mut state, events) = ev.step(&state, &hands_at(target.cx, target.cy, HandState::Open));
        assert!(events.contains(&PanelEvent::Game(GameEvent::TargetTouched {
            index: 0,
            remaining: 8
        })));
        assert_eq!(state.game.touched_count(), 1);

        state.page = MenuPage::Menu;
        let (state, _) = ev.step(&state, &rest());
        assert_eq!(state.game.touched_count(), 0);
    }

    #[test]
    fn test_game_waits_for_positioning() {
        let ev = evaluator();
        let mut state = ev.initial_state();
        state.page = MenuPage::Play;
        let target = Config::default().game.targets[0].centered(50.0);
        let mut body = hands_at(target.cx, target.cy, HandState::Open);
        body.joints[BodyJoint::Head.index()].y = 50.0;
        let (state, events) = ev.step(&state, &body);
        assert_eq!(state.game.touched_count(), 0);
        assert!(!events.iter().any(|e| matches!(e, PanelEvent::Game(_))));
    }

    #[test]
    fn test_difficulty_narrows_target_bands() {
        let ev = evaluator();
        let mut state = ev.initial_state();
        state.page = MenuPage::Play;
        state.coaching = Some(CoachingMessage::Positioned);
        // Inside the widest band of target 0, outside the narrowest.
        let body = hands_at(1350.0, 446.0, HandState::Open);

        state.slider.value = 2;
        let (after, _) = ev.step(&state, &body);
        assert_eq!(after.game.touched_count(), 0);

        state.slider.value = 0;
        let (after, _) = ev.step(&state, &body);
        assert_eq!(after.game.touched_count(), 1);
    }

    #[test]
    fn test_full_run_records_best_time() {
        let ev = evaluator();
        let config = Config::default();
        let mut state = ev.initial_state();

        let (next, _) = ev.step(&state, &hands_at(PLAY.0, PLAY.1, HandState::Closed));
        state = next;
        for _ in 0..5 {
            state = ev.tick_clock(&state).0;
        }

        for i in 0..9 {
            let zone = config.game.targets[i].centered(50.0);
            let (next, events) = ev.step(&state, &hands_at(zone.cx, zone.cy, HandState::Open));
            state = next;
            assert!(events.contains(&PanelEvent::Game(GameEvent::TargetTouched {
                index: i,
                remaining: 8 - i
            })));
            if i == 8 {
                assert!(events.contains(&PanelEvent::Game(GameEvent::Completed { seconds: 5 })));
            }
        }
        assert!(!state.clock.running);
        assert_eq!(state.clock.seconds, 5);
        assert_eq!(state.page, MenuPage::Play);

        // Ticks after completion change nothing.
        let (next, events) = ev.tick_clock(&state);
        assert!(events.is_empty());
        state = next;

        let (next, events) = ev.step(&state, &hands_at(REFRESH.0, REFRESH.1, HandState::Closed));
        state = next;
        assert!(events.contains(&PanelEvent::BestTime { seconds: 5 }));
        assert!(events.contains(&PanelEvent::ClockReset));
        assert_eq!(state.page, MenuPage::Menu);
        assert_eq!(state.best_seconds, Some(5));
        assert_eq!(state.clock.seconds, 0);
    }

    #[test]
    fn test_slower_run_keeps_best_time() {
        let ev = evaluator();
        let mut state = ev.initial_state();
        state.best_seconds = Some(5);
        state.page = MenuPage::Play;
        state.coaching = Some(CoachingMessage::Positioned);
        state.clock.seconds = 11;
        for flag in state.game.touched.iter_mut() {
            *flag = true;
        }

        let (state, events) = ev.step(&state, &hands_at(REFRESH.0, REFRESH.1, HandState::Closed));
        assert!(!events.iter().any(|e| matches!(e, PanelEvent::BestTime { .. })));
        assert!(events.contains(&PanelEvent::ClockReset));
        assert_eq!(state.best_seconds, Some(5));
        assert_eq!(state.clock.seconds, 0);
    }

    #[test]
    fn test_refresh_rewinds_but_never_stops_the_clock() {
        let ev = evaluator();
        let mut state = ev.initial_state();
        state.page = MenuPage::Options;
        state.clock.running = true;
        state.clock.seconds = 7;

        let (state, events) = ev.step(&state, &hands_at(REFRESH.0, REFRESH.1, HandState::Closed));
        assert!(events.contains(&PanelEvent::BestTime { seconds: 7 }));
        assert!(events.contains(&PanelEvent::ClockReset));
        assert_eq!(state.clock.seconds, 0);
        assert!(state.clock.running);
    }

    #[test]
    fn test_night_mode_latch_cycle() {
        let ev = evaluator();
        let mut state = ev.initial_state();
        state.page = MenuPage::Options;

        let closed = body_at((960.0, 700.0), CHECKBOX, HandState::Open, HandState::Closed);
        let open = body_at((960.0, 700.0), CHECKBOX, HandState::Open, HandState::Open);

        let (next, events) = ev.step(&state, &closed);
        state = next;
        assert!(events.contains(&PanelEvent::CheckboxEntered));
        assert!(events.contains(&PanelEvent::NightMode { enabled: true }));
        assert!(events.contains(&PanelEvent::Overlay { enabled: true }));
        assert!(state.night_mode);
        assert!(state.overlay);

        // Holding closed does not re-fire.
        let (next, events) = ev.step(&state, &closed);
        state = next;
        assert!(!events.iter().any(|e| matches!(e, PanelEvent::NightMode { .. })));

        // Open re-arms, close toggles back off.
        let (next, _) = ev.step(&state, &open);
        state = next;
        let (state, events) = ev.step(&state, &closed);
        assert!(events.contains(&PanelEvent::NightMode { enabled: false }));
        assert!(!state.night_mode);
        assert!(!state.overlay);
    }

    #[test]
    fn test_both_hands_toggle_twice_in_one_frame() {
        let ev = evaluator();
        let mut state = ev.initial_state();
        state.page = MenuPage::Options;

        let (state, events) = ev.step(&state, &hands_at(CHECKBOX.0, CHECKBOX.1, HandState::Closed));
        let toggles: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                PanelEvent::NightMode { enabled } => Some(*enabled),
                _ => None,
            })
            .collect();
        assert_eq!(toggles, vec![true, false]);
        assert!(!state.night_mode);
    }

    #[test]
    fn test_overlay_forced_back_on_options_page() {
        let ev = evaluator();
        let mut state = ev.initial_state();
        state.page = MenuPage::Options;
        state.overlay = true;

        let (state, events) = ev.step(&state, &rest());
        assert!(events.contains(&PanelEvent::Overlay { enabled: false }));
        assert!(!state.overlay);
    }

    #[test]
    fn test_slider_inactive_outside_options() {
        let ev = evaluator();
        let state = ev.initial_state();
        // Closed hand over the slider's grab segment while on the menu.
        let (state, events) = ev.step(&state, &hands_at(800.0, 574.0, HandState::Closed));
        assert!(!events.iter().any(|e| matches!(e, PanelEvent::Slider(_))));
        assert_eq!(state.slider.value, 0);
    }

    #[test]
    fn test_page_change_clears_open_hovers() {
        let ev = evaluator();
        let state = ev.initial_state();
        let (state, _) = ev.step(&state, &hands_at(PLAY.0, PLAY.1, HandState::Open));
        assert!(state.button_hover[MenuButton::Play.index()]);

        let (state, events) = ev.step(&state, &hands_at(OPTIONS.0, OPTIONS.1, HandState::Closed));
        assert!(events.contains(&PanelEvent::ButtonExited {
            button: MenuButton::Play
        }));
        assert!(events.contains(&PanelEvent::ButtonExited {
            button: MenuButton::Options
        }));
        assert_eq!(state.button_hover, [false; BUTTON_COUNT]);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(5), "00:05");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(3599), "59:59");
        // Minutes wrap at the hour.
        assert_eq!(format_clock(3600), "00:00");
        assert_eq!(format_clock(3700), "01:40");
    }

    #[test]
    fn test_status_sexp_shape() {
        let ev = evaluator();
        let mut state = ev.initial_state();
        state.clock.seconds = 65;
        state.best_seconds = Some(42);
        let sexp = ev.status_sexp(&state);
        assert!(sexp.contains(":page :menu"));
        assert!(sexp.contains(":coaching nil"));
        assert!(sexp.contains(":clock \"01:05\""));
        assert!(sexp.contains(":best-seconds 42"));
        assert!(sexp.contains(":targets-total 9"));
        assert!(sexp.contains(":hovered (:play nil"));
        assert!(sexp.contains(":margins (:top 0.10"));
    }

    #[test]
    fn test_event_sexp_forms() {
        let sexp = PanelEvent::PageChanged {
            from: MenuPage::Menu,
            to: MenuPage::Play,
        }
        .to_sexp();
        assert!(sexp.contains(":page-changed"));
        assert!(sexp.contains(":from :menu :to :play"));

        let sexp = PanelEvent::Coaching {
            message: CoachingMessage::MoveBack,
        }
        .to_sexp();
        assert!(sexp.contains(":message :move-back"));
        assert!(sexp.contains(":text \"move back\""));

        let sexp = PanelEvent::ClockTick { seconds: 65 }.to_sexp();
        assert!(sexp.contains(":seconds 65"));
        assert!(sexp.contains(":display \"01:05\""));

        assert!(PanelEvent::ExitRequested.to_sexp().contains(":exit-requested"));
        let sexp = PanelEvent::NightMode { enabled: true }.to_sexp();
        assert!(sexp.contains(":night-mode :enabled t"));
    }
}
