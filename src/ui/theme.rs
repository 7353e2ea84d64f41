use ratatui::style::Color;

const THEME_NAMES: [&str; 2] = ["dark", "light"];

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    pub header_accent_bg: Color,
    pub header_accent_fg: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub overlay_border: Color,
    pub gauge_filled: Color,
    pub gauge_unfilled: Color,
    pub sparkline_color: Color,
    pub table_header_fg: Color,
    pub selected_bg: Color,
    pub selected_fg: Color,
    pub cpu_low: Color,
    pub cpu_mid: Color,
    pub cpu_high: Color,
    pub statusbar_bg: Color,
    pub surface_bg: Color,
    pub pill_key_bg: Color,
    pub pill_key_fg: Color,
    pub pill_desc_fg: Color,
    pub status_ok: Color,
    pub accent_mauve: Color,
}

impl Theme {
    pub fn from_config(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "light" => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn next(&self) -> Self {
        let idx = THEME_NAMES
            .iter()
            .position(|n| *n == self.name)
            .unwrap_or(0);
        Self::from_config(THEME_NAMES[(idx + 1) % THEME_NAMES.len()])
    }

    /// Color for a CPU utilization fraction in the process table.
    pub fn cpu_color(&self, fraction: f64) -> Color {
        if fraction >= 0.75 {
            self.cpu_high
        } else if fraction >= 0.25 {
            self.cpu_mid
        } else {
            self.cpu_low
        }
    }

    fn dark() -> Self {
        Theme {
            name: "dark",
            header_accent_bg: Color::Rgb(137, 180, 250),
            header_accent_fg: Color::Rgb(17, 17, 27),
            text_primary: Color::Rgb(205, 214, 244),
            text_secondary: Color::Rgb(147, 153, 178),
            overlay_border: Color::Rgb(88, 91, 112),
            gauge_filled: Color::Rgb(166, 227, 161),
            gauge_unfilled: Color::Rgb(49, 50, 68),
            sparkline_color: Color::Rgb(137, 220, 235),
            table_header_fg: Color::Rgb(249, 226, 175),
            selected_bg: Color::Rgb(69, 71, 90),
            selected_fg: Color::Rgb(245, 224, 220),
            cpu_low: Color::Rgb(166, 227, 161),
            cpu_mid: Color::Rgb(249, 226, 175),
            cpu_high: Color::Rgb(243, 139, 168),
            statusbar_bg: Color::Rgb(24, 24, 37),
            surface_bg: Color::Rgb(30, 30, 46),
            pill_key_bg: Color::Rgb(203, 166, 247),
            pill_key_fg: Color::Rgb(17, 17, 27),
            pill_desc_fg: Color::Rgb(186, 194, 222),
            status_ok: Color::Rgb(166, 227, 161),
            accent_mauve: Color::Rgb(203, 166, 247),
        }
    }

    fn light() -> Self {
        Theme {
            name: "light",
            header_accent_bg: Color::Rgb(30, 102, 245),
            header_accent_fg: Color::Rgb(239, 241, 245),
            text_primary: Color::Rgb(76, 79, 105),
            text_secondary: Color::Rgb(108, 111, 133),
            overlay_border: Color::Rgb(172, 176, 190),
            gauge_filled: Color::Rgb(64, 160, 43),
            gauge_unfilled: Color::Rgb(204, 208, 218),
            sparkline_color: Color::Rgb(4, 165, 229),
            table_header_fg: Color::Rgb(223, 142, 29),
            selected_bg: Color::Rgb(188, 192, 204),
            selected_fg: Color::Rgb(76, 79, 105),
            cpu_low: Color::Rgb(64, 160, 43),
            cpu_mid: Color::Rgb(223, 142, 29),
            cpu_high: Color::Rgb(210, 15, 57),
            statusbar_bg: Color::Rgb(230, 233, 239),
            surface_bg: Color::Rgb(239, 241, 245),
            pill_key_bg: Color::Rgb(136, 57, 239),
            pill_key_fg: Color::Rgb(239, 241, 245),
            pill_desc_fg: Color::Rgb(92, 95, 119),
            status_ok: Color::Rgb(64, 160, 43),
            accent_mauve: Color::Rgb(136, 57, 239),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_theme_falls_back_to_dark() {
        assert_eq!(Theme::from_config("solarized").name, "dark");
        assert_eq!(Theme::from_config("LIGHT").name, "light");
    }

    #[test]
    fn next_cycles() {
        let theme = Theme::from_config("dark");
        assert_eq!(theme.next().name, "light");
        assert_eq!(theme.next().next().name, "dark");
    }

    #[test]
    fn cpu_color_bands() {
        let theme = Theme::from_config("dark");
        assert_eq!(theme.cpu_color(0.0), theme.cpu_low);
        assert_eq!(theme.cpu_color(0.5), theme.cpu_mid);
        assert_eq!(theme.cpu_color(1.4), theme.cpu_high);
    }
}
