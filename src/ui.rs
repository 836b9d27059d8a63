use chrono::Utc;
use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Flex, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, BorderType, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Focus, Modal, SetupForm};
use crate::backend::Backend;
use crate::format::{format_count, format_duration, format_ratio, format_relative_date, format_subscribers};
use crate::gate::{PrimaryAction, status_text};
use crate::model::FilterType;
use crate::theme::Theme;
use crate::workflow::{Control, NoticeLevel};

// --- Helpers ---

/// Truncate to `max_width` display columns, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.width() <= max_width {
    return s.to_string();
  }
  let mut out = String::new();
  let mut used = 0;
  for c in s.chars() {
    let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
    if used + w + 1 > max_width {
      break;
    }
    out.push(c);
    used += w;
  }
  out.push('…');
  out
}

fn rounded(theme: &Theme) -> Block<'static> {
  Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border))
}

fn control_span(key: &str, control: Control, theme: &Theme) -> Vec<Span<'static>> {
  let style = if control.enabled { Style::default().fg(theme.fg) } else { Style::default().fg(theme.muted) };
  vec![
    Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
    Span::styled(format!(" {} ", control.label), style),
  ]
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let [area] = Layout::horizontal([Constraint::Length(width.min(area.width))]).flex(Flex::Center).areas(area);
  let [area] = Layout::vertical([Constraint::Length(height.min(area.height))]).flex(Flex::Center).areas(area);
  area
}

// --- UI Rendering ---

pub fn ui<B: Backend>(frame: &mut Frame, app: &mut App<B>) {
  let theme = app.theme();
  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, footer_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(5), Constraint::Length(1), Constraint::Length(1)])
      .areas(frame.area());

  render_header(frame, app, header_area);
  if app.phase().is_signed_in() {
    render_search_pane(frame, app, main_area);
  } else {
    render_login_pane(frame, app, main_area);
  }
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);

  if let Some(Modal::Setup(form)) = &app.modal {
    render_setup_modal(frame, theme, form, app.workflow.save_control(), main_area);
  } else if matches!(app.modal, Some(Modal::Subscriptions(_))) {
    render_subscriptions_modal(frame, app, main_area);
  }
  if let Some(confirm) = &app.confirm {
    render_dialog(frame, theme, " Confirm ", &confirm.prompt(), "y: yes   n: no", theme.accent, frame.area());
  }
  if let Some(notice) = app.workflow.notice() {
    let (title, color) = match notice.level {
      NoticeLevel::Info => (" Info ", theme.accent),
      NoticeLevel::Error => (" Error ", theme.error),
    };
    render_dialog(frame, theme, title, &notice.message, "Enter: OK", color, frame.area());
  }
}

fn render_header<B: Backend>(frame: &mut Frame, app: &App<B>, area: Rect) {
  let theme = app.theme();
  let left = Line::from(vec![
    Span::styled(" ▶ yo ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    Span::styled("subscription outliers", Style::default().fg(theme.muted)),
  ]);
  frame.render_widget(left, area);

  let right_text = format!("{}  v{} ", app.phase().label(), env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&right_text, Style::default().fg(theme.muted)));
  let w = right_text.width() as u16;
  let right_area = Rect { x: area.x + area.width.saturating_sub(w), width: w.min(area.width), ..area };
  frame.render_widget(right, right_area);
}

// --- Login pane ---

fn render_login_pane<B: Backend>(frame: &mut Frame, app: &App<B>, area: Rect) {
  let theme = app.theme();
  let session = app.workflow.session();
  let mut lines = vec![
    Line::from(""),
    Line::from(Span::styled("Find outlier videos in your subscriptions", Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled(status_text(session, app.workflow.status_failed()), Style::default().fg(theme.muted))),
    Line::from(""),
  ];
  if let Some(action) = app.workflow.primary_action() {
    let control = match action {
      PrimaryAction::Configure => app.workflow.setup_control(),
      PrimaryAction::Login => app.workflow.login_control(),
      PrimaryAction::Retry => app.workflow.retry_control(),
    };
    lines.push(Line::from(control_span("Enter", control, theme)));
  }
  if session.is_some_and(|s| s.is_configured) {
    lines.push(Line::from(""));
    lines.push(Line::from(control_span("s", app.workflow.setup_control(), theme)));
  }
  let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(rounded(theme));
  frame.render_widget(paragraph, area);
}

// --- Search pane ---

fn render_search_pane<B: Backend>(frame: &mut Frame, app: &mut App<B>, area: Rect) {
  let progress_h = if app.workflow.progress().visible().is_some() { 3 } else { 0 };
  let [controls_area, filter_area, progress_area, results_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(4),
    Constraint::Length(progress_h),
    Constraint::Min(3),
  ])
  .areas(area);

  render_controls(frame, app, controls_area);
  render_filters(frame, app, filter_area);
  if progress_h > 0 {
    render_progress(frame, app, progress_area);
  }
  render_results(frame, app, results_area);
}

fn render_controls<B: Backend>(frame: &mut Frame, app: &App<B>, area: Rect) {
  let theme = app.theme();
  let wf = &app.workflow;
  let loaded = wf.subscriptions().is_loaded();
  let mut spans = control_span("l", wf.load_control(), theme);
  if loaded {
    spans.extend(control_span("r", Control { label: "Refresh", ..wf.load_control() }, theme));
    spans.extend(control_span("v", Control { label: "Channels", enabled: true }, theme));
  }
  spans.extend(control_span("x", wf.logout_control(), theme));
  let summary = wf.subscriptions().summary_label();
  if !summary.is_empty() {
    let color = if summary == "error" { theme.error } else { theme.accent };
    spans.push(Span::styled(format!("  {}", summary), Style::default().fg(color)));
  }
  frame.render_widget(Line::from(spans), area);
}

fn render_filters<B: Backend>(frame: &mut Frame, app: &App<B>, area: Rect) {
  let theme = app.theme();
  let focused = app.focus == Focus::Filters;
  let border = if focused { theme.accent } else { theme.border };
  let block = rounded(theme)
    .title(" Filter ")
    .title_style(Style::default().fg(border))
    .border_style(Style::default().fg(border))
    .padding(Padding::horizontal(1));

  let mode_span = |t: FilterType| {
    let on = app.filters.filter_type == t;
    let mark = if on { "(•)" } else { "( )" };
    let style = if on { Style::default().fg(theme.accent).add_modifier(Modifier::BOLD) } else { Style::default().fg(theme.muted) };
    Span::styled(format!("{} {}  ", mark, t.label()), style)
  };
  let mut mode_line = vec![mode_span(FilterType::Normal), mode_span(FilterType::Mutation)];
  mode_line.extend(control_span("Enter", app.workflow.search_control(), theme));

  let active = app.filters.active_field();
  let mut field_line = Vec::new();
  for &field in app.filters.visible_fields() {
    let is_active = focused && field == active;
    let value_style = if is_active {
      Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg)
    } else {
      Style::default().fg(theme.fg)
    };
    field_line.push(Span::styled(format!("{} ", field.label()), Style::default().fg(theme.muted)));
    field_line.push(Span::styled(format!(" {} ", app.filters.value(field)), value_style));
    field_line.push(Span::raw("   "));
  }

  let paragraph = Paragraph::new(vec![Line::from(mode_line), Line::from(field_line)]).block(block);
  frame.render_widget(paragraph, area);
}

fn render_progress<B: Backend>(frame: &mut Frame, app: &App<B>, area: Rect) {
  let theme = app.theme();
  let Some(view) = app.workflow.progress().visible() else { return };
  let gauge = Gauge::default()
    .block(rounded(theme).title(format!(" {} ", view.text)))
    .gauge_style(Style::default().fg(theme.accent).bg(theme.stripe_bg))
    .ratio(view.ratio())
    .label(format!("{:.0}%", view.percent));
  frame.render_widget(gauge, area);
}

fn render_results<B: Backend>(frame: &mut Frame, app: &mut App<B>, area: Rect) {
  let theme = app.theme();
  let focused = app.focus == Focus::Results;
  let border = if focused { theme.accent } else { theme.border };

  let Some(results) = app.workflow.results() else {
    let hint = if app.workflow.search_control().enabled { "Press Enter to search." } else { "" };
    let paragraph = Paragraph::new(Span::styled(hint, Style::default().fg(theme.muted)))
      .alignment(Alignment::Center)
      .block(rounded(theme).title(" Results "));
    frame.render_widget(paragraph, area);
    return;
  };

  let title = Line::from(vec![
    Span::styled(format!(" Results {} ", results.count_label()), Style::default().fg(border).add_modifier(Modifier::BOLD)),
    Span::styled(format!("{} ", results.stats_label()), Style::default().fg(theme.muted)),
  ]);
  let block = rounded(theme).title(title).border_style(Style::default().fg(border));

  if results.is_empty() {
    let paragraph = Paragraph::new(Span::styled("No videos matched the filter.", Style::default().fg(theme.muted)))
      .alignment(Alignment::Center)
      .block(block);
    frame.render_widget(paragraph, area);
    return;
  }

  let now = Utc::now();
  let inner_w = area.width.saturating_sub(4) as usize;
  let selected = app.results_state.selected();
  let items: Vec<ListItem> = app
    .ordered_results()
    .into_iter()
    .enumerate()
    .map(|(i, video)| {
      let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };
      let copied = app.is_copied(&video.video_id);
      let meta = format!(
        "{} · {} views · {} subs · {}x · {}",
        format_duration(video.duration),
        format_count(video.view_count),
        format_subscribers(video.subscriber_count),
        format_ratio(video.ratio),
        format_relative_date(&video.published_at, now),
      );
      let badge = if copied { "Copied!" } else if Some(i) == selected && focused { "y: copy" } else { "" };
      let title_w = inner_w.saturating_sub(badge.width() + 1);
      let title_line = Line::from(vec![
        Span::styled(truncate_str(&video.title, title_w), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::styled(badge, Style::default().fg(if copied { theme.status } else { theme.muted })),
      ]);
      let meta_line = Line::from(vec![
        Span::styled(truncate_str(&video.channel_title, inner_w / 3), Style::default().fg(theme.accent)),
        Span::styled(format!("  {}", meta), Style::default().fg(theme.muted)),
      ]);
      ListItem::new(vec![title_line, meta_line]).style(Style::default().bg(bg))
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg));
  frame.render_stateful_widget(list, area, &mut app.results_state);
}

// --- Status & footer ---

fn render_status<B: Backend>(frame: &mut Frame, app: &App<B>, area: Rect) {
  let theme = app.theme();
  let wf = &app.workflow;
  let (text, style) = if wf.is_checking_status() {
    (" ⏳ Checking status…".to_string(), Style::default().fg(theme.status))
  } else if let Some(view) = wf.progress().visible() {
    (format!(" ⏳ {} ({:.0}%)", view.text, view.percent), Style::default().fg(theme.status))
  } else if wf.is_loading() {
    (" ⏳ Loading channels…".to_string(), Style::default().fg(theme.status))
  } else {
    (format!(" {}", app.phase().label()), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer<B: Backend>(frame: &mut Frame, app: &App<B>, area: Rect) {
  let theme = app.theme();
  let keys: Vec<(&str, &str)> = if app.workflow.notice().is_some() {
    vec![("Enter", "Dismiss")]
  } else if app.confirm.is_some() {
    vec![("y", "Yes"), ("n", "No")]
  } else {
    match &app.modal {
      Some(Modal::Setup(_)) => vec![("Tab", "Next field"), ("Enter", "Save"), ("Esc", "Close")],
      Some(Modal::Subscriptions(_)) => vec![("j/k", "Navigate"), ("u", "Unsubscribe"), ("Esc", "Close")],
      None if !app.phase().is_signed_in() => vec![("Enter", "Continue"), ("s", "Settings"), ("^t", "Theme"), ("q", "Quit")],
      None => match app.focus {
        Focus::Filters => vec![
          ("Enter", "Search"),
          ("←/→", "Mode"),
          ("↑/↓", "Field"),
          ("Tab", "Results"),
          ("^t", "Theme"),
          ("q", "Quit"),
        ],
        Focus::Results => {
          vec![("Enter", "Open"), ("y", "Copy title"), ("m", "Mode"), ("j/k", "Navigate"), ("Esc", "Back")]
        }
      },
    }
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();
  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

// --- Overlays ---

fn render_setup_modal(frame: &mut Frame, theme: &Theme, form: &SetupForm, save: Control, area: Rect) {
  let rect = centered(area, 60, 11);
  frame.render_widget(Clear, rect);
  let inner_w = rect.width.saturating_sub(6) as usize;
  let mut lines = Vec::new();
  for (i, (label, value)) in SetupForm::LABELS.iter().zip(form.values()).enumerate() {
    let active = i == form.field;
    // Secrets are never echoed.
    let shown = if i == 0 { value.to_string() } else { "•".repeat(value.chars().count()) };
    let style = if active {
      Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg)
    } else {
      Style::default().fg(theme.fg).bg(theme.stripe_bg)
    };
    lines.push(Line::from(Span::styled(*label, Style::default().fg(theme.muted))));
    lines.push(Line::from(Span::styled(format!("{:<width$}", truncate_str(&shown, inner_w), width = inner_w), style)));
  }
  lines.push(Line::from(""));
  lines.push(Line::from(control_span("Enter", save, theme)));
  let block = rounded(theme)
    .title(" API settings ")
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .style(Style::default().bg(theme.bg))
    .padding(Padding::horizontal(2));
  frame.render_widget(Paragraph::new(lines).block(block), rect);
}

fn render_subscriptions_modal<B: Backend>(frame: &mut Frame, app: &mut App<B>, area: Rect) {
  let theme = app.theme();
  let rect = centered(area, area.width.saturating_sub(8).max(40), area.height.saturating_sub(2));
  frame.render_widget(Clear, rect);

  let rows = app.subscription_rows();
  let inner_w = rect.width.saturating_sub(4) as usize;
  let title = Line::from(vec![
    Span::styled(" Subscribed channels ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    Span::styled(format!("{} ", app.workflow.subscriptions().header_label()), Style::default().fg(theme.muted)),
  ]);
  let block = rounded(theme).title(title).style(Style::default().bg(theme.bg));

  if rows.is_empty() {
    let p = Paragraph::new("No subscribed channels.").alignment(Alignment::Center).block(block);
    frame.render_widget(p, rect);
    return;
  }

  let items: Vec<ListItem> = rows
    .iter()
    .map(|entry| {
      let fading = app.fading.contains(&entry.id);
      let control = app.workflow.unsubscribe_control(&entry.id);
      let right = if fading {
        String::new()
      } else {
        format!("{}  [{}]", format_subscribers(entry.subscriber_count), control.label)
      };
      let title_w = inner_w.saturating_sub(right.width() + 4);
      let title = truncate_str(&entry.title, title_w);
      let gap = inner_w.saturating_sub(title.width() + right.width() + 2);
      let fg = if fading { theme.faded } else { theme.fg };
      ListItem::new(Line::from(vec![
        Span::styled(title, Style::default().fg(fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, Style::default().fg(if control.enabled { theme.muted } else { theme.status })),
      ]))
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg));
  if let Some(Modal::Subscriptions(state)) = &mut app.modal {
    frame.render_stateful_widget(list, rect, state);
  }
}

fn render_dialog(
  frame: &mut Frame,
  theme: &Theme,
  title: &str,
  message: &str,
  hint: &str,
  color: Color,
  area: Rect,
) {
  let width = (message.width() as u16 + 6).clamp(30, area.width.saturating_sub(4).max(30));
  let rect = centered(area, width, 7);
  frame.render_widget(Clear, rect);
  let lines = vec![
    Line::from(""),
    Line::from(Span::styled(message.to_string(), Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(Span::styled(hint.to_string(), Style::default().fg(theme.muted))),
  ];
  let block = rounded(theme)
    .title(title.to_string())
    .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
    .border_style(Style::default().fg(color))
    .style(Style::default().bg(theme.bg));
  let p = Paragraph::new(lines).alignment(Alignment::Center).wrap(Wrap { trim: true }).block(block);
  frame.render_widget(p, rect);
}
