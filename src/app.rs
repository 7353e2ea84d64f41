use std::collections::VecDeque;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::info;

use crate::action::{Action, Direction};
use crate::config::{Config, parse_key};
use crate::system::collector::Collector;
use crate::system::snapshot::Sample;
use crate::system::source::ProcFs;
use crate::system::table::ProcessRecord;
use crate::ui::theme::Theme;

const CPU_HISTORY_CAPACITY: usize = 60;
const STATUS_MESSAGE_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Filter,
    Help,
}

#[derive(Debug, Clone)]
pub struct ResolvedKeybinds {
    pub quit: KeyCode,
    pub filter: KeyCode,
    pub help: KeyCode,
    pub refresh: KeyCode,
    pub cycle_theme: KeyCode,
}

impl ResolvedKeybinds {
    pub fn from_config(kb: &crate::config::KeybindsConfig) -> Self {
        Self {
            quit: parse_key(&kb.quit).unwrap_or(KeyCode::Char('q')),
            filter: parse_key(&kb.filter).unwrap_or(KeyCode::Char('/')),
            help: parse_key(&kb.help).unwrap_or(KeyCode::Char('?')),
            refresh: parse_key(&kb.refresh).unwrap_or(KeyCode::Char('r')),
            cycle_theme: parse_key(&kb.cycle_theme).unwrap_or(KeyCode::Char('t')),
        }
    }

    /// Returns (key_label, description) pairs for all configurable keybinds.
    pub fn help_entries(&self) -> Vec<(String, &'static str)> {
        let mut entries = vec![
            (key_label(self.quit), "Quit"),
            (key_label(self.filter), "Filter processes"),
            (key_label(self.refresh), "Refresh now"),
            (key_label(self.cycle_theme), "Cycle theme"),
            (key_label(self.help), "Toggle help"),
        ];
        entries.push(("↑↓".to_string(), "Move selection"));
        entries.push(("PgUp/PgDn".to_string(), "Page"));
        entries.push(("Home/End".to_string(), "First / last row"));
        entries.push(("Ctrl+C".to_string(), "Quit (always)"));
        entries
    }
}

pub fn key_label(code: KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Backspace => "Bksp".to_string(),
        KeyCode::Delete => "Del".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        _ => "?".to_string(),
    }
}

pub struct App {
    pub running: bool,
    pub collector: Collector,
    pub sample: Sample,
    pub selected_index: usize,
    pub input_mode: InputMode,
    pub filter_text: String,
    pub theme: Theme,
    pub status_message: Option<(String, Instant)>,
    pub cpu_history: VecDeque<u64>,
    pub page_size: usize,
    pub show_kernel_threads: bool,
    pub keybinds: ResolvedKeybinds,
}

impl App {
    pub fn new(config: Config) -> Self {
        let source = ProcFs::with_roots(
            config.general.proc_root.clone(),
            config.general.etc_root.clone(),
        );
        info!(
            proc_root = %config.general.proc_root.display(),
            "starting collector"
        );
        Self::with_collector(config, Collector::new(source))
    }

    pub fn with_collector(config: Config, mut collector: Collector) -> Self {
        let sample = collector.refresh();
        let mut app = App {
            running: true,
            collector,
            sample: Sample::default(),
            selected_index: 0,
            input_mode: InputMode::Normal,
            filter_text: String::new(),
            theme: Theme::from_config(&config.colors.theme),
            status_message: None,
            cpu_history: VecDeque::with_capacity(CPU_HISTORY_CAPACITY),
            page_size: 10,
            show_kernel_threads: config.general.show_kernel_threads,
            keybinds: ResolvedKeybinds::from_config(&config.keybinds),
        };
        app.apply_sample(sample);
        app
    }

    pub fn refresh_data(&mut self) {
        let sample = self.collector.refresh();
        self.apply_sample(sample);

        // Clear expired status messages
        if let Some((_, created)) = &self.status_message
            && created.elapsed().as_secs() >= STATUS_MESSAGE_SECS
        {
            self.status_message = None;
        }
    }

    /// Install a freshly collected sample, keeping the selection on the same
    /// pid when it is still visible.
    pub fn apply_sample(&mut self, sample: Sample) {
        let selected_pid = self.selected_pid();
        self.sample = sample;

        // Sparkline stores hundredths of a percent.
        let cpu_val = (self.sample.summary.cpu_fraction * 10_000.0).round() as u64;
        if self.cpu_history.len() == CPU_HISTORY_CAPACITY {
            self.cpu_history.pop_front();
        }
        self.cpu_history.push_back(cpu_val);

        let rows = self.visible_rows();
        let followed = selected_pid.and_then(|pid| rows.iter().position(|r| r.pid == pid));
        let last = rows.len().saturating_sub(1);
        self.selected_index = followed.unwrap_or(self.selected_index.min(last));
    }

    /// Rows after filtering, in table (CPU-descending) order.
    pub fn visible_rows(&self) -> Vec<&ProcessRecord> {
        self.sample
            .table
            .filter(&self.filter_text)
            .into_iter()
            .filter(|r| self.show_kernel_threads || !r.command.is_empty())
            .collect()
    }

    pub fn selected_pid(&self) -> Option<u32> {
        self.visible_rows().get(self.selected_index).map(|r| r.pid)
    }

    pub fn map_key(&self, key: KeyEvent) -> Action {
        // Ctrl+C always quits (hardwired safety)
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }

        match self.input_mode {
            InputMode::Normal => self.map_key_normal(key),
            InputMode::Filter => self.map_key_filter(key),
            InputMode::Help => self.map_key_help(key),
        }
    }

    fn map_key_normal(&self, key: KeyEvent) -> Action {
        let code = key.code;
        let kb = &self.keybinds;

        // Navigation keys are hardwired (not configurable)
        match code {
            KeyCode::Up => return Action::Navigate(Direction::Up),
            KeyCode::Down => return Action::Navigate(Direction::Down),
            KeyCode::PageUp => return Action::Navigate(Direction::PageUp),
            KeyCode::PageDown => return Action::Navigate(Direction::PageDown),
            KeyCode::Home => return Action::Navigate(Direction::Top),
            KeyCode::End => return Action::Navigate(Direction::Bottom),
            _ => {}
        }

        if code == kb.quit {
            return Action::Quit;
        }
        if code == kb.filter {
            return Action::EnterFilterMode;
        }
        if code == kb.help {
            return Action::ToggleHelp;
        }
        if code == kb.refresh {
            return Action::Refresh;
        }
        if code == kb.cycle_theme {
            return Action::CycleTheme;
        }
        if code == KeyCode::Esc && !self.filter_text.is_empty() {
            return Action::ClearFilter;
        }

        Action::None
    }

    fn map_key_help(&self, key: KeyEvent) -> Action {
        let code = key.code;
        // In help mode, only the help key and Esc dismiss, everything else is ignored
        if code == self.keybinds.help || code == KeyCode::Esc {
            return Action::ToggleHelp;
        }
        Action::None
    }

    fn map_key_filter(&self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => Action::ClearFilter,
            KeyCode::Enter => Action::ExitFilterMode,
            KeyCode::Backspace => {
                let mut text = self.filter_text.clone();
                text.pop();
                Action::UpdateFilter(text)
            }
            KeyCode::Char(c) => {
                let mut text = self.filter_text.clone();
                text.push(c);
                Action::UpdateFilter(text)
            }
            _ => Action::None,
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::Navigate(dir) => self.navigate(dir),
            Action::EnterFilterMode => {
                self.input_mode = InputMode::Filter;
            }
            Action::ExitFilterMode => {
                self.input_mode = InputMode::Normal;
            }
            Action::ClearFilter => {
                self.filter_text.clear();
                self.input_mode = InputMode::Normal;
                self.selected_index = 0;
            }
            Action::UpdateFilter(text) => {
                self.filter_text = text;
                self.selected_index = 0;
            }
            Action::CycleTheme => {
                self.theme = self.theme.next();
                self.set_status(format!("Theme: {}", self.theme.name));
            }
            Action::ToggleHelp => {
                self.input_mode = if self.input_mode == InputMode::Help {
                    InputMode::Normal
                } else {
                    InputMode::Help
                };
            }
            Action::Refresh => {
                self.refresh_data();
                self.set_status("Refreshed".to_string());
            }
            Action::None => {}
        }
    }

    fn navigate(&mut self, direction: Direction) {
        let len = self.visible_rows().len();
        if len == 0 {
            self.selected_index = 0;
            return;
        }
        let last = len - 1;
        let page = self.page_size.max(1);
        self.selected_index = match direction {
            Direction::Up => self.selected_index.saturating_sub(1),
            Direction::Down => (self.selected_index + 1).min(last),
            Direction::PageUp => self.selected_index.saturating_sub(page),
            Direction::PageDown => (self.selected_index + page).min(last),
            Direction::Top => 0,
            Direction::Bottom => last,
        };
    }

    fn set_status(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now()));
    }

    pub fn show_help(&self) -> bool {
        self.input_mode == InputMode::Help
    }

    pub fn help_entries(&self) -> Vec<(String, &'static str)> {
        self.keybinds.help_entries()
    }
}
