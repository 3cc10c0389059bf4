use crate::shared::{LedState, STEPS_PER_PATTERN};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

// one row of 16 step LEDs, grouped by beat
pub fn draw_step_row(frame: &mut Frame, area: Rect, leds: &[LedState; STEPS_PER_PATTERN]) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, STEPS_PER_PATTERN as u32); STEPS_PER_PATTERN])
        .split(area);

    for (step, cell_area) in cols.iter().enumerate() {
        let style = match leds[step] {
            LedState::OnHigh => Style::default().fg(Color::LightMagenta).bg(Color::Magenta),
            LedState::OnMedium => Style::default().fg(Color::Magenta).bg(Color::Rgb(60, 0, 60)),
            LedState::Off => Style::default().fg(Color::DarkGray),
        };
        // brighter border on the first step of each beat
        let border = if step % 4 == 0 { style.fg(Color::White) } else { style };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .style(style);
        frame.render_widget(block, *cell_area);
    }
}
