use crate::shared::DisplayState;
use crate::viz::PixelSurface;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use ratatui::Frame;

fn sections(area: Rect) -> [Rect; 4] {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // lcd screen
            Constraint::Length(3), // knobs row
            Constraint::Length(3), // step leds
            Constraint::Min(4),    // visualizer
        ])
        .split(area);
    [rows[0], rows[1], rows[2], rows[3]]
}

// Where the visualizer lands, in cells. The surface is twice as tall in
// pixels since each cell shows two.
pub fn viz_area(area: Rect) -> Rect {
    sections(area)[3]
}

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, surface: &PixelSurface) {
    let [screen, knobs, steps, viz] = sections(area);
    draw_screen(frame, screen, state);
    draw_knob_row(frame, knobs, state);
    super::grid::draw_step_row(frame, steps, &state.leds);
    frame.render_widget(HalfBlocks(surface), viz);
}

fn draw_screen(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let mode = if state.playing { "▶ PLAY" } else { "■ STOP" };
    let auto = if state.composer_on { "AUTO" } else { "    " };
    let top = Line::from(vec![
        Span::styled(format!(" {:<12}", state.pattern_name.to_uppercase()), Style::default().bold()),
        Span::raw(format!("{:>5.0} BPM  ", state.bpm)),
        Span::styled(mode, Style::default().fg(if state.playing { Color::Green } else { Color::Gray })),
        Span::raw("  "),
        Span::styled(auto, Style::default().fg(Color::Yellow)),
    ]);
    let bottom = Line::from(vec![
        Span::raw(format!(" SYN {:<6} VIZ {:<7} COL {:<6}  ", state.synth_label, state.viz_label, state.color_label)),
        Span::styled(state.display_text.clone(), Style::default().fg(Color::LightRed)),
    ]);
    let lcd = Paragraph::new(vec![top, bottom])
        .block(Block::default().borders(Borders::ALL).title(" beatscope "));
    frame.render_widget(lcd, area);
}

fn draw_knob_row(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let line = Line::from(vec![
        Span::styled(format!(" [{}] ", state.param_page.label()), Style::default().fg(Color::Cyan)),
        Span::raw(format!("←→ {} {:<8} ", state.knob_a_label, state.knob_a_value)),
        Span::raw(format!("↓↑ {} {:<8}", state.knob_b_label, state.knob_b_value)),
    ]);
    let row = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(" Tab: page "));
    frame.render_widget(row, area);
}

// Draws a PixelSurface with '▀': foreground is the upper pixel, background
// the lower one.
struct HalfBlocks<'a>(&'a PixelSurface);

impl Widget for HalfBlocks<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                let (x, y) = (col as u32, row as u32 * 2);
                let (Some(top), Some(bottom)) = (self.0.pixel(x, y), self.0.pixel(x, y + 1)) else {
                    continue;
                };
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_char('▀')
                        .set_fg(Color::Rgb(top[0], top[1], top[2]))
                        .set_bg(Color::Rgb(bottom[0], bottom[1], bottom[2]));
                }
            }
        }
    }
}
