/// Selection movement in the process table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
}

/// Everything a key press can ask the app to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    Navigate(Direction),
    EnterFilterMode,
    ExitFilterMode,
    ClearFilter,
    /// Replace the filter text with this value.
    UpdateFilter(String),
    CycleTheme,
    ToggleHelp,
    /// Sample immediately instead of waiting for the next tick.
    Refresh,
    None,
}
