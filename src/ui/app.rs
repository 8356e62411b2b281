use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::config::{Config, UiColors};
use crate::contact::{Contact, ContactId};
use crate::form::{ContactForm, FormField};
use crate::roster::Roster;
use crate::search;

const IDLE_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    List,
}

/// A contact marked for removal, taken out of the roster once `due`
/// passes. Owned by the `App`, so teardown drops it with everything
/// else and nothing fires against a dead view.
#[derive(Debug, Clone, Copy)]
struct PendingRemoval {
    id: ContactId,
    due: Instant,
}

pub struct App<'a> {
    roster: &'a mut Roster,
    config: &'a Config,
    pub search_input: Input,
    pub focus: Focus,
    /// Indices into the roster for the contacts matching the query.
    pub visible: Vec<usize>,
    /// Selection index into `visible`.
    pub selected: usize,
    pub form: Option<ContactForm>,
    pub status: Option<String>,
    loading_until: Option<Instant>,
    pending_removals: Vec<PendingRemoval>,
}

impl<'a> App<'a> {
    pub fn new(roster: &'a mut Roster, config: &'a Config) -> Self {
        let mut app = Self {
            roster,
            config,
            search_input: Input::default(),
            focus: Focus::Search,
            visible: Vec::new(),
            selected: 0,
            form: None,
            status: None,
            loading_until: Some(Instant::now() + config.load_delay),
            pending_removals: Vec::new(),
        };
        app.rebuild_visible();
        app
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            self.advance_timers(Instant::now());
            super::draw::render(terminal, self)?;

            if event::poll(self.poll_timeout(Instant::now()))? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key)? {
                            break;
                        }
                    }
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Clamp the idle poll to the nearest deadline so expiries are
    /// observed promptly instead of on the next keypress.
    fn poll_timeout(&self, now: Instant) -> Duration {
        let nearest = self
            .loading_until
            .into_iter()
            .chain(self.pending_removals.iter().map(|p| p.due))
            .min();
        match nearest {
            Some(due) => due.saturating_duration_since(now).min(IDLE_POLL),
            None => IDLE_POLL,
        }
    }

    /// Expire the loading screen and any due pending removals.
    pub(crate) fn advance_timers(&mut self, now: Instant) {
        if self.loading_until.is_some_and(|until| until <= now) {
            self.loading_until = None;
        }

        let due: Vec<ContactId> = self
            .pending_removals
            .iter()
            .filter(|p| p.due <= now)
            .map(|p| p.id)
            .collect();
        if due.is_empty() {
            return;
        }
        self.pending_removals.retain(|p| p.due > now);
        for id in due {
            self.roster.remove(id);
        }
        self.rebuild_visible();
        self.set_status("Contact deleted");
    }

    pub fn is_loading(&self) -> bool {
        self.loading_until.is_some()
    }

    /// Whether a contact is marked for removal (rendered dimmed).
    pub fn is_pending_removal(&self, id: ContactId) -> bool {
        self.pending_removals.iter().any(|p| p.id == id)
    }

    pub fn roster_len(&self) -> usize {
        self.roster.len()
    }

    pub fn roster_is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn query(&self) -> &str {
        self.search_input.value()
    }

    pub fn visible_contacts(&self) -> impl Iterator<Item = &Contact> {
        self.visible.iter().map(|&idx| &self.roster.contacts()[idx])
    }

    pub fn selected_contact(&self) -> Option<&Contact> {
        let idx = *self.visible.get(self.selected)?;
        self.roster.contacts().get(idx)
    }

    pub fn ui_colors(&self) -> &UiColors {
        &self.config.ui.colors
    }

    fn rebuild_visible(&mut self) {
        self.visible = search::filter(self.roster.contacts(), self.search_input.value());
        if self.selected >= self.visible.len() {
            self.selected = self.visible.len().saturating_sub(1);
        }
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = Some(message.into());
    }

    // -------------------------------------------------------------------------
    // Key handling
    // -------------------------------------------------------------------------

    /// Returns true when the app should quit.
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Ctrl+C always quits (hardcoded for safety)
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Ok(true);
        }

        // Until the load delay passes only quit is honored.
        if self.is_loading() {
            return Ok(self.key_matches_any(&key, &self.config.keys.global.quit));
        }

        self.status = None;

        if self.form.is_some() {
            self.handle_form_key(key);
            return Ok(false);
        }

        match self.focus {
            Focus::Search => Ok(self.handle_search_key(key)),
            Focus::List => Ok(self.handle_list_key(key)),
        }
    }

    /// Search input focus: Esc clears, confirm moves to the list,
    /// everything else edits the query.
    fn handle_search_key(&mut self, key: KeyEvent) -> bool {
        if self.key_matches_any(&key, &self.config.keys.list.clear) {
            if self.search_input.value().is_empty() {
                self.focus = Focus::List;
            } else {
                self.search_input.reset();
                self.rebuild_visible();
            }
            return false;
        }

        if matches!(key.code, KeyCode::Enter | KeyCode::Tab | KeyCode::Down) {
            self.focus = Focus::List;
            return false;
        }

        if self.search_input.handle_event(&Event::Key(key)).is_some() {
            self.selected = 0;
            self.rebuild_visible();
        }
        false
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> bool {
        let global = &self.config.keys.global;
        let list = &self.config.keys.list;

        if self.key_matches_any(&key, &global.quit) {
            return true;
        }

        if self.key_matches_any(&key, &global.search) {
            self.focus = Focus::Search;
            return false;
        }

        if self.key_matches_any(&key, &global.add) {
            self.form = Some(ContactForm::new(self.config.default_country));
            return false;
        }

        if self.key_matches_any(&key, &list.next) {
            if !self.visible.is_empty() {
                self.selected = (self.selected + 1) % self.visible.len();
            }
            return false;
        }

        if self.key_matches_any(&key, &list.prev) {
            if !self.visible.is_empty() {
                self.selected = (self.selected + self.visible.len() - 1) % self.visible.len();
            }
            return false;
        }

        if self.key_matches_any(&key, &list.delete) {
            self.mark_selected_for_removal();
            return false;
        }

        if self.key_matches_any(&key, &list.clear) {
            if self.search_input.value().is_empty() {
                self.focus = Focus::Search;
            } else {
                self.search_input.reset();
                self.rebuild_visible();
            }
            return false;
        }

        false
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let form_keys = &self.config.keys.form;

        if self.key_matches_any(&key, &form_keys.cancel) {
            self.form = None;
            return;
        }

        if self.key_matches_any(&key, &form_keys.submit) {
            self.submit_form();
            return;
        }

        if self.key_matches_any(&key, &form_keys.next_field) {
            if let Some(form) = self.form.as_mut() {
                form.focus_next();
            }
            return;
        }

        if self.key_matches_any(&key, &form_keys.prev_field) {
            if let Some(form) = self.form.as_mut() {
                form.focus_prev();
            }
            return;
        }

        let Some(form) = self.form.as_mut() else {
            return;
        };

        // The country selector cycles instead of taking text.
        if form.focus == FormField::Country {
            match key.code {
                KeyCode::Right | KeyCode::Char(' ') | KeyCode::Char('l') => {
                    form.country = form.country.next();
                }
                KeyCode::Left | KeyCode::Char('h') => {
                    form.country = form.country.prev();
                }
                _ => {}
            }
            return;
        }

        form.handle_key_event(key);
    }

    /// Submit attempt: field errors keep the form open for correction;
    /// a valid draft goes into the roster and the form closes reset.
    fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let Some(draft) = form.submit() else {
            return;
        };

        let name = draft.name.clone();
        self.roster.add(draft.name, draft.phone, draft.email);
        // Dropping the form is the reset: the next open starts pristine
        // with the default country code restored.
        self.form = None;
        self.rebuild_visible();
        self.set_status(format!("Added {}", name));
    }

    /// Mark the selected contact pending removal; the roster entry goes
    /// away once the remove delay passes.
    fn mark_selected_for_removal(&mut self) {
        let Some(contact) = self.selected_contact() else {
            self.set_status("No contact selected");
            return;
        };
        let id = contact.id;
        if self.is_pending_removal(id) {
            return;
        }
        self.pending_removals.push(PendingRemoval {
            id,
            due: Instant::now() + self.config.remove_delay,
        });
        self.set_status("Removing...");
    }

    // -------------------------------------------------------------------------
    // Key binding matching
    // -------------------------------------------------------------------------

    fn key_matches_any(&self, event: &KeyEvent, bindings: &[String]) -> bool {
        bindings.iter().any(|b| key_matches_single(event, b))
    }
}

/// Check if the key event matches a single binding string.
fn key_matches_single(event: &KeyEvent, binding: &str) -> bool {
    let trimmed = binding.trim();
    if trimmed.is_empty() {
        return false;
    }

    // Ctrl/Alt/Super combinations are not configurable
    let disallowed = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER;
    if event.modifiers.intersects(disallowed) {
        return false;
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "enter" => matches!(event.code, KeyCode::Enter),
        "tab" => matches!(event.code, KeyCode::Tab),
        "backtab" | "shift+tab" => matches!(event.code, KeyCode::BackTab),
        "backspace" => matches!(event.code, KeyCode::Backspace),
        "esc" | "escape" => matches!(event.code, KeyCode::Esc),
        "space" => matches!(event.code, KeyCode::Char(' ')),
        "delete" => matches!(event.code, KeyCode::Delete),
        "up" => matches!(event.code, KeyCode::Up),
        "down" => matches!(event.code, KeyCode::Down),
        "left" => matches!(event.code, KeyCode::Left),
        "right" => matches!(event.code, KeyCode::Right),
        _ => {
            let mut chars = trimmed.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => event.code == KeyCode::Char(c),
                _ => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_config() -> Config {
        Config {
            load_delay: Duration::ZERO,
            remove_delay: Duration::from_millis(50),
            seed_roster: false,
            ..Config::default()
        }
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn code(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App<'_>, text: &str) {
        for c in text.chars() {
            app.handle_key(key(c)).unwrap();
        }
    }

    #[test]
    fn test_loading_expires_and_discards_input() {
        let mut roster = Roster::new();
        let config = Config {
            load_delay: Duration::from_secs(60),
            ..test_config()
        };
        let mut app = App::new(&mut roster, &config);
        assert!(app.is_loading());

        // Input other than quit is discarded while loading.
        assert!(!app.handle_key(key('/')).unwrap());
        assert_eq!(app.focus, Focus::Search);

        app.advance_timers(Instant::now() + Duration::from_secs(61));
        assert!(!app.is_loading());
    }

    #[test]
    fn test_typing_filters_visible_list() {
        let mut roster = Roster::new();
        roster.add("Alice".into(), "+1 5550001".into(), None);
        roster.add("Bob".into(), "+1 5550002".into(), None);
        let config = test_config();
        let mut app = App::new(&mut roster, &config);
        app.advance_timers(Instant::now());

        type_text(&mut app, "ali");
        assert_eq!(app.visible_contacts().count(), 1);
        assert_eq!(app.visible_contacts().next().unwrap().name, "Alice");

        // Esc clears the query and restores the full list.
        app.handle_key(code(KeyCode::Esc)).unwrap();
        assert_eq!(app.query(), "");
        assert_eq!(app.visible_contacts().count(), 2);
    }

    #[test]
    fn test_add_contact_through_form() {
        let mut roster = Roster::new();
        let config = test_config();
        let mut app = App::new(&mut roster, &config);
        app.advance_timers(Instant::now());

        // Focus the list, open the form.
        app.handle_key(code(KeyCode::Esc)).unwrap();
        app.handle_key(key('a')).unwrap();
        assert!(app.form.is_some());

        type_text(&mut app, "Bob Smith");
        // Skip the country selector, keep +1.
        app.handle_key(code(KeyCode::Tab)).unwrap();
        app.handle_key(code(KeyCode::Tab)).unwrap();
        type_text(&mut app, "555-234-5678");
        app.handle_key(code(KeyCode::Tab)).unwrap();
        type_text(&mut app, "bob@example.com");
        app.handle_key(code(KeyCode::Enter)).unwrap();

        assert!(app.form.is_none());
        assert_eq!(app.roster_len(), 1);
        let added = app.visible_contacts().next().unwrap();
        assert_eq!(added.name, "Bob Smith");
        assert_eq!(added.phone, "+1 555-234-5678");
        assert_eq!(added.avatar, "BS");
        assert_eq!(added.email.as_deref(), Some("bob@example.com"));
    }

    #[test]
    fn test_invalid_submit_keeps_form_open_with_errors() {
        let mut roster = Roster::new();
        let config = test_config();
        let mut app = App::new(&mut roster, &config);
        app.advance_timers(Instant::now());

        app.handle_key(code(KeyCode::Esc)).unwrap();
        app.handle_key(key('a')).unwrap();
        app.handle_key(code(KeyCode::Enter)).unwrap();

        let form = app.form.as_ref().expect("form stays open");
        assert_eq!(form.errors.name, Some(crate::form::ERR_NAME_REQUIRED));
        assert_eq!(form.errors.phone, Some(crate::form::ERR_PHONE_REQUIRED));
        assert_eq!(app.roster_len(), 0);
    }

    #[test]
    fn test_digit_first_after_form_add() {
        let mut roster = Roster::new();
        roster.add("Bob Smith".into(), "+1 555-234-5678".into(), None);
        let config = test_config();
        let mut app = App::new(&mut roster, &config);
        app.advance_timers(Instant::now());

        app.handle_key(code(KeyCode::Esc)).unwrap();
        app.handle_key(key('a')).unwrap();
        type_text(&mut app, "7 Up");
        app.handle_key(code(KeyCode::Tab)).unwrap();
        app.handle_key(code(KeyCode::Tab)).unwrap();
        type_text(&mut app, "5550007");
        app.handle_key(code(KeyCode::Enter)).unwrap();

        let names: Vec<_> = app.visible_contacts().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["7 Up", "Bob Smith"]);
    }

    #[test]
    fn test_deferred_delete() {
        let mut roster = Roster::new();
        roster.add("Alice".into(), "+1 5550001".into(), None);
        roster.add("Bob".into(), "+1 5550002".into(), None);
        let config = test_config();
        let mut app = App::new(&mut roster, &config);
        let start = Instant::now();
        app.advance_timers(start);

        app.handle_key(code(KeyCode::Esc)).unwrap();
        app.handle_key(key('x')).unwrap();

        // Still in the roster, marked pending.
        assert_eq!(app.roster_len(), 2);
        let alice = app.visible_contacts().next().unwrap();
        assert!(app.is_pending_removal(alice.id));

        // A second delete on the same contact is a no-op.
        app.handle_key(key('x')).unwrap();

        app.advance_timers(start + Duration::from_secs(1));
        assert_eq!(app.roster_len(), 1);
        assert_eq!(app.visible_contacts().next().unwrap().name, "Bob");
    }

    #[test]
    fn test_country_cycles_in_form() {
        let mut roster = Roster::new();
        let config = test_config();
        let mut app = App::new(&mut roster, &config);
        app.advance_timers(Instant::now());

        app.handle_key(code(KeyCode::Esc)).unwrap();
        app.handle_key(key('a')).unwrap();
        app.handle_key(code(KeyCode::Tab)).unwrap(); // focus country
        app.handle_key(code(KeyCode::Right)).unwrap();

        let form = app.form.as_ref().unwrap();
        assert_eq!(form.country, crate::contact::CountryCode::Uk);
    }

    #[test]
    fn test_poll_timeout_clamps_to_deadline() {
        let mut roster = Roster::new();
        roster.add("Alice".into(), "+1 5550001".into(), None);
        let config = test_config();
        let mut app = App::new(&mut roster, &config);
        let start = Instant::now();
        app.advance_timers(start);

        app.handle_key(code(KeyCode::Esc)).unwrap();
        app.handle_key(key('x')).unwrap();
        // Measured after the mark, the wait never exceeds the delay.
        assert!(app.poll_timeout(Instant::now()) <= config.remove_delay);
    }
}
