use anyhow::Result;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use crate::config::RgbColor;
use crate::contact::Contact;
use crate::form::{ContactForm, FormField};

use super::app::{App, Focus};

const SEARCH_HELP: &str = "Type to filter  Esc: clear  Enter: list";
const LIST_HELP: &str = "j/k: nav  a: add  x: delete  /: search  q: quit";
const FORM_HELP: &str = "Tab: next field  Enter: add  Esc: cancel";

pub fn render<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn color(c: RgbColor) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

fn draw_frame(frame: &mut Frame<'_>, app: &mut App) {
    let size = frame.area();

    if app.is_loading() {
        draw_loading(frame, size, app);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    draw_search_bar(frame, layout[1], app);
    draw_contact_list(frame, layout[2], app);
    draw_footer(frame, layout[3], app);
    draw_form_overlay(frame, size, app);
}

fn draw_loading(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let style = Style::default().fg(color(app.ui_colors().status_fg));
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Loading contacts...", style)),
    ];
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(area);
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        vertical[1],
    );
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let colors = app.ui_colors();
    let title = Span::styled(
        " ROLO ",
        Style::default()
            .fg(color(colors.selection_fg))
            .bg(color(colors.selection_bg))
            .add_modifier(Modifier::BOLD),
    );
    let count = app.roster_len();
    let summary = Span::styled(
        format!(
            "  {} {}",
            count,
            if count == 1 { "contact" } else { "contacts" }
        ),
        Style::default().fg(color(colors.status_fg)),
    );
    frame.render_widget(Paragraph::new(Line::from(vec![title, summary])), area);
}

fn draw_search_bar(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let colors = app.ui_colors();
    let focused = app.focus == Focus::Search && app.form.is_none();
    let border_style = if focused {
        Style::default().fg(color(colors.selection_bg))
    } else {
        Style::default().fg(color(colors.border))
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title("SEARCH");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let value = app.query();
    let text = if value.is_empty() && !focused {
        Span::styled(
            "Search by name, phone, or email...",
            Style::default().add_modifier(Modifier::DIM),
        )
    } else {
        Span::raw(value)
    };
    frame.render_widget(Paragraph::new(Line::from(text)), inner);

    if focused {
        // Clamp before adding so a long query cannot overflow the x coordinate.
        let offset = app
            .search_input
            .visual_cursor()
            .min(inner.width.saturating_sub(1) as usize) as u16;
        frame.set_cursor_position((inner.x + offset, inner.y));
    }
}

fn draw_contact_list(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let colors = app.ui_colors();
    let focused = app.focus == Focus::List && app.form.is_none();
    let border_style = if focused {
        Style::default().fg(color(colors.selection_bg))
    } else {
        Style::default().fg(color(colors.border))
    };

    let shown = app.visible_contacts().count();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!("CONTACTS ({})", shown));

    if shown == 0 {
        let inner = block.inner(area);
        frame.render_widget(block, area);
        draw_empty_state(frame, inner, app);
        return;
    }

    let items: Vec<ListItem> = app
        .visible_contacts()
        .map(|contact| contact_item(contact, app))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(color(colors.selection_fg))
                .bg(color(colors.selection_bg))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn contact_item<'a>(contact: &'a Contact, app: &App) -> ListItem<'a> {
    let pending = app.is_pending_removal(contact.id);
    let mut spans = vec![
        Span::styled(
            format!("[{:<2}] ", contact.avatar),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("{:<24} ", contact.name)),
        Span::raw(format!("{:<18} ", contact.phone)),
    ];
    if let Some(email) = &contact.email {
        spans.push(Span::styled(
            email.clone(),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }
    if pending {
        spans.push(Span::styled(
            "  (removing)",
            Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
        ));
    }

    let line = Line::from(spans);
    if pending {
        ListItem::new(line).style(Style::default().add_modifier(Modifier::DIM))
    } else {
        ListItem::new(line)
    }
}

fn draw_empty_state(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let (title, hint) = if app.roster_is_empty() {
        ("No contacts yet", "Press 'a' to add your first contact")
    } else {
        ("No results found", "Try a different name or number")
    };
    let style = Style::default().add_modifier(Modifier::DIM);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(title, style.add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(hint, style)),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let colors = app.ui_colors();
    let style = Style::default()
        .fg(color(colors.status_fg))
        .bg(color(colors.status_bg));

    let text = match &app.status {
        Some(status) => status.clone(),
        None if app.form.is_some() => FORM_HELP.to_string(),
        None if app.focus == Focus::Search => SEARCH_HELP.to_string(),
        None => LIST_HELP.to_string(),
    };
    frame.render_widget(Paragraph::new(text).style(style), area);
}

// =============================================================================
// Add-contact form overlay
// =============================================================================

fn draw_form_overlay(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let Some(form) = &app.form else {
        return;
    };

    let width = area.width.min(52);
    // Label + input + optional error per field, plus borders and footer.
    let height = area.height.min(16);
    let popup = centered_rect(area, width, height);

    frame.render_widget(Clear, popup);

    let colors = app.ui_colors();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color(colors.selection_bg)))
        .title("ADD CONTACT");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // name
            Constraint::Length(2), // country
            Constraint::Length(3), // phone
            Constraint::Length(3), // email
            Constraint::Min(0),
        ])
        .split(inner);

    draw_text_field(frame, rows[0], app, form, FormField::Name, form.name.value());
    draw_country_field(frame, rows[1], app, form);
    draw_text_field(frame, rows[2], app, form, FormField::Phone, form.phone.value());
    draw_text_field(frame, rows[3], app, form, FormField::Email, form.email.value());
}

fn draw_text_field(
    frame: &mut Frame<'_>,
    area: Rect,
    app: &App,
    form: &ContactForm,
    field: FormField,
    value: &str,
) {
    if area.height < 2 {
        return;
    }
    let colors = app.ui_colors();
    let focused = form.focus == field;

    let label_style = if focused {
        Style::default()
            .fg(color(colors.selection_bg))
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let marker = if focused { "> " } else { "  " };
    let label = Line::from(vec![
        Span::raw(marker),
        Span::styled(field.label(), label_style),
    ]);
    frame.render_widget(
        Paragraph::new(label),
        Rect { height: 1, ..area },
    );

    let value_area = Rect {
        y: area.y + 1,
        height: 1,
        x: area.x + 4,
        width: area.width.saturating_sub(4),
    };
    frame.render_widget(Paragraph::new(value), value_area);

    if focused {
        let input = match field {
            FormField::Name => &form.name,
            FormField::Phone => &form.phone,
            FormField::Email => &form.email,
            FormField::Country => return,
        };
        let offset = input
            .visual_cursor()
            .min(value_area.width.saturating_sub(1) as usize) as u16;
        frame.set_cursor_position((value_area.x + offset, value_area.y));
    }

    if area.height >= 3 {
        if let Some(message) = form.error_for(field) {
            let error_area = Rect {
                y: area.y + 2,
                height: 1,
                x: area.x + 4,
                width: area.width.saturating_sub(4),
            };
            frame.render_widget(
                Paragraph::new(Span::styled(
                    message,
                    Style::default().fg(color(colors.error_fg)),
                )),
                error_area,
            );
        }
    }
}

fn draw_country_field(frame: &mut Frame<'_>, area: Rect, app: &App, form: &ContactForm) {
    if area.height < 2 {
        return;
    }
    let colors = app.ui_colors();
    let focused = form.focus == FormField::Country;

    let label_style = if focused {
        Style::default()
            .fg(color(colors.selection_bg))
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let marker = if focused { "> " } else { "  " };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw(marker),
            Span::styled(FormField::Country.label(), label_style),
        ])),
        Rect { height: 1, ..area },
    );

    let value = format!(
        "{} {} {} {}",
        if focused { "<" } else { " " },
        form.country.dial(),
        form.country.label(),
        if focused { ">" } else { " " },
    );
    let value_area = Rect {
        y: area.y + 1,
        height: 1,
        x: area.x + 4,
        width: area.width.saturating_sub(4),
    };
    frame.render_widget(Paragraph::new(value), value_area);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use ratatui::backend::TestBackend;
    use tui_input::Input;

    use crate::config::Config;
    use crate::contact::CountryCode;
    use crate::form::ContactForm;
    use crate::roster::Roster;

    use super::*;

    #[test]
    fn test_cursor_stays_inside_narrow_terminal() {
        let mut roster = Roster::new();
        roster.add("Alice".into(), "+1 5550001".into(), None);
        let config = Config::default();
        let mut app = App::new(&mut roster, &config);
        app.advance_timers(Instant::now() + Duration::from_secs(60));

        // Query far wider than the terminal.
        app.search_input = Input::new("a".repeat(500));

        let backend = TestBackend::new(24, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        render(&mut terminal, &mut app).unwrap();

        // Same with an oversized value in a focused form field.
        let mut form = ContactForm::new(CountryCode::UsCa);
        form.name = Input::new("b".repeat(500));
        app.form = Some(form);
        render(&mut terminal, &mut app).unwrap();
    }
}
