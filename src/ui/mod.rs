use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

pub mod layout;
pub mod tabs;
pub mod widgets;

use crate::app::{App, ContractState, InputMode, StatusLevel};
use crate::config;
use crate::core::Module;
use widgets::Blockie;

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    tabs::draw_tab_bar(f, areas.tabs, app);
    draw_contract_card(f, areas.card, app);
    draw_activity(f, areas.activity, app);
    draw_status_line(f, areas.status_line, app);
    draw_command_line(f, areas.command_line, app);

    if app.help_open {
        draw_help_popup(f, areas.size);
    }
    if app.settings_open {
        draw_settings_popup(f, areas.size, app);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let network = app
        .network()
        .map(|network| format!("{} ({})", network.name, network.chain_id))
        .unwrap_or_else(|| "--".to_string());
    let title = Line::from(vec![
        Span::styled(
            "valdash",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("Net", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(" {network} ")),
        Span::styled("RPC", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(
            " {} ",
            app.endpoint.as_deref().unwrap_or("disconnected")
        )),
    ]);
    let left = Paragraph::new(title)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    let mut right_spans = vec![Span::styled("Signer ", Style::default().fg(Color::DarkGray))];
    match app.session.as_ref() {
        Some(session) => {
            right_spans.push(Span::raw(format!("{} ", session.signer)));
            if let Some(account) = app.ctx.account.as_deref() {
                right_spans.push(Span::raw(format!("{} ", short_addr(account))));
            }
            if let Some(balance) = app.balance_label() {
                right_spans.push(Span::styled(
                    format!("{balance} "),
                    Style::default().fg(Color::Green),
                ));
            }
        }
        None => right_spans.push(Span::raw("-- ")),
    }
    right_spans.push(Span::styled(" Block ", Style::default().fg(Color::DarkGray)));
    right_spans.push(Span::raw(app.block().to_string()));
    if let Some(head) = app.ctx.head {
        right_spans.push(Span::styled(
            format!(" (head {head})"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let right = Paragraph::new(Line::from(right_spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    f.render_widget(left, chunks[0]);
    f.render_widget(right, chunks[1]);
}

fn draw_contract_card(f: &mut Frame, area: Rect, app: &App) {
    let title = app
        .contract
        .as_ref()
        .map(|contract| format!(" {} ", contract.name))
        .unwrap_or_else(|| format!(" {} ", app.config.contract));
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    match app.contract_state {
        ContractState::Pending => {
            let text = if app.session.is_some() {
                format!("{} looking up deployment…", app.ctx.spinner())
            } else {
                "Not connected. :connect or pick a network with :network <name>".to_string()
            };
            f.render_widget(
                Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
                inner,
            );
        }
        ContractState::NotDeployed => draw_not_deployed(f, inner, app),
        ContractState::Deployed => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(5), Constraint::Min(0)])
                .split(inner);
            draw_contract_address(f, chunks[0], app);
            draw_panels(f, chunks[1], app);
        }
    }
}

fn draw_contract_address(f: &mut Frame, area: Rect, app: &App) {
    let Some(contract) = app.contract.as_ref() else {
        return;
    };
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(10), Constraint::Min(0)])
        .split(area);

    let blockie = Blockie::new(&contract.address);
    f.render_widget(&blockie, Rect { x: chunks[0].x + 1, ..chunks[0] });

    let explorer = app
        .network()
        .and_then(|network| network.explorer.as_deref())
        .map(|explorer| format!("{}/address/{}", explorer.trim_end_matches('/'), contract.address));
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Address ", Style::default().fg(Color::DarkGray)),
            Span::raw(contract.address.clone()),
        ]),
        Line::from(vec![
            Span::styled("Chain   ", Style::default().fg(Color::DarkGray)),
            Span::raw(contract.chain_id.to_string()),
            Span::styled("  Functions ", Style::default().fg(Color::DarkGray)),
            Span::raw(contract.len().to_string()),
        ]),
        Line::from(vec![
            Span::styled("Source  ", Style::default().fg(Color::DarkGray)),
            Span::raw(contract.source.path().display().to_string()),
        ]),
    ];
    if let Some(explorer) = explorer {
        lines.push(Line::from(Span::styled(
            explorer,
            Style::default().fg(Color::DarkGray),
        )));
    }
    f.render_widget(Paragraph::new(lines), chunks[1]);
}

fn draw_not_deployed(f: &mut Frame, area: Rect, app: &App) {
    let chain = app
        .session
        .as_ref()
        .map(|session| session.chain_id.to_string())
        .unwrap_or_else(|| "--".to_string());
    let lines = vec![
        Line::from(Span::styled(
            format!("{} is not deployed on chain {chain}", app.config.contract),
            Style::default().fg(Color::LightYellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("  1. Start a chain (e.g. a local node on localhost:8545)"),
        Line::from("  2. Deploy the contracts"),
        Line::from(format!(
            "  3. Point `deployments` at the artifacts (now: {})",
            app.config.deployments.join(", ")
        )),
        Line::from("     or declare the contract under [[contracts]] in the config"),
        Line::from(""),
        Line::from(Span::styled(
            "Then :reload",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_panels(f: &mut Frame, area: Rect, app: &App) {
    if app.panels.is_empty() {
        let page = app.page_name().unwrap_or("--");
        f.render_widget(
            Paragraph::new(format!("Nothing to show on page '{page}'"))
                .style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    }

    let heights: Vec<u16> = app.panels.iter().map(|slot| slot.panel.height()).collect();
    let range = layout::visible_panels(&heights, app.selected, area.height);
    let mut y = area.y;
    for index in range {
        let height = heights[index].min(area.bottom().saturating_sub(y));
        if height == 0 {
            break;
        }
        let panel_area = Rect {
            y,
            height,
            ..area
        };
        app.panels[index]
            .panel
            .render(f, panel_area, &app.ctx, index == app.selected);
        y += height;
    }
}

fn draw_activity(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" ACTIVITY ")
        .border_style(Style::default().fg(Color::DarkGray));

    let items: Vec<ListItem> = app
        .activity
        .iter()
        .map(|entry| {
            let color = match entry.level {
                StatusLevel::Info => Color::White,
                StatusLevel::Warn => Color::LightYellow,
                StatusLevel::Error => Color::LightRed,
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    entry.at.format("%H:%M:%S ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(entry.text.clone(), Style::default().fg(color)),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let page = app.page_name().unwrap_or("--");
    let gas = app
        .gas_price
        .map(|wei| format!("{:.2} gwei", wei as f64 / 1e9))
        .unwrap_or_else(|| "node".to_string());
    let line = Line::from(vec![
        Span::styled("Page ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{page}  ")),
        Span::styled("Panels ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", app.panels.len())),
        Span::styled("Gas ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{gas}  ")),
        Span::styled("Epoch ", Style::default().fg(Color::DarkGray)),
        Span::raw(app.epoch.to_string()),
    ]);

    let paragraph = Paragraph::new(line)
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

/// Get command hint for autocompletion
fn command_hint(input: &str) -> Option<&'static str> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    let commands = [
        ("network", "Switch network: network <name>"),
        ("block", "Read at block: block <n|latest>"),
        ("gas", "Gas price in gwei: gas <n|auto>"),
        ("account", "Sign with node account: account <n>"),
        ("connect", "Reconnect: connect [url]"),
        ("disconnect", "Drop the session"),
        ("reload", "Reload config and rescan deployments"),
        ("help", "Show help"),
        ("quit", "Quit"),
    ];

    let word = input.split_whitespace().next().unwrap_or("");
    commands
        .iter()
        .find(|(cmd, _)| cmd.starts_with(word))
        .map(|(_, desc)| *desc)
}

fn draw_command_line(f: &mut Frame, area: Rect, app: &App) {
    let content = match app.input_mode {
        InputMode::Command => {
            let hint = command_hint(&app.command.input).unwrap_or("network | block | gas | account | connect");
            Line::from(vec![
                Span::styled(": ", Style::default().fg(Color::Yellow)),
                Span::raw(&app.command.input),
                Span::styled(format!("  {}", hint), Style::default().fg(Color::DarkGray)),
            ])
        }
        InputMode::Normal => {
            if let Some((text, level)) = app.status_text() {
                let color = match level {
                    StatusLevel::Info => Color::LightGreen,
                    StatusLevel::Warn => Color::LightYellow,
                    StatusLevel::Error => Color::LightRed,
                };
                Line::from(vec![
                    Span::styled("msg: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(text, Style::default().fg(color)),
                ])
            } else {
                action_hints(app)
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

fn action_hints(app: &App) -> Line<'static> {
    let hints: &[(&str, &str)] = if app.is_editing() {
        &[
            ("Tab", "next field"),
            ("^t", "convert"),
            ("Enter", "submit"),
            ("Esc", "done"),
        ]
    } else {
        &[
            ("j/k", "select"),
            ("Enter", "edit/run"),
            ("r", "refresh"),
            ("y", "copy"),
            ("1-9", "page"),
            ("s", "settings"),
            (":", "command"),
            ("?", "help"),
        ]
    };
    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(
            format!("{key} "),
            Style::default().fg(Color::Cyan),
        ));
        spans.push(Span::styled(
            format!("{label}  "),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(64, 70, area);
    f.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from("Navigation"),
        Line::from("  j / k      Select panel"),
        Line::from("  1-9        Jump to page"),
        Line::from("  [ / ]      Prev/Next page"),
        Line::from(""),
        Line::from("Panels"),
        Line::from("  Enter      Edit form / refresh value"),
        Line::from("  Tab / ↑↓   Move between fields"),
        Line::from("  Ctrl-t     Convert field (bytes32, hex, ether)"),
        Line::from("  Enter      Submit (while editing)"),
        Line::from("  Esc        Stop editing"),
        Line::from("  r          Refresh all values"),
        Line::from("  y          Copy result / contract address"),
        Line::from(""),
        Line::from("Session"),
        Line::from("  s          Settings (networks)"),
        Line::from("  :          Command line"),
        Line::from("  ?          Toggle help"),
        Line::from("  q          Quit"),
        Line::from(""),
        Line::from("Commands"),
        Line::from("  :network <name>   :block <n|latest>   :gas <gwei|auto>"),
        Line::from("  :account <n>      :connect [url]      :disconnect"),
        Line::from("  :reload           :quit"),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

fn draw_settings_popup(f: &mut Frame, area: Rect, app: &App) {
    let popup_area = centered_rect(70, 60, area);
    f.render_widget(Clear, popup_area);

    let config_path = config::config_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(unknown)".to_string());
    let log_path = config::log_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(unknown)".to_string());

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Config  ", Style::default().fg(Color::DarkGray)),
            Span::raw(config_path),
        ]),
        Line::from(vec![
            Span::styled("Log     ", Style::default().fg(Color::DarkGray)),
            Span::raw(log_path),
        ]),
        Line::from(vec![
            Span::styled("Contract ", Style::default().fg(Color::DarkGray)),
            Span::raw(app.config.contract.clone()),
        ]),
        Line::from(vec![
            Span::styled("Deployments ", Style::default().fg(Color::DarkGray)),
            Span::raw(app.config.deployments.join(", ")),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Networks ([ / ] to switch)",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    for (index, network) in app.config.networks.iter().enumerate() {
        let active = index == app.network_index;
        let marker = if active { "▶ " } else { "  " };
        let endpoint = network
            .ws
            .as_deref()
            .or(network.rpc.as_deref())
            .or(network.ipc.as_deref())
            .unwrap_or("--");
        let style = if active {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{marker}{} ({})  {endpoint}", network.name, network.chain_id),
            style,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "r reload config   Esc close",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Settings").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, popup_area);
}

fn short_addr(value: &str) -> String {
    if value.len() <= 10 {
        return value.to_string();
    }
    let start: String = value.chars().take(6).collect();
    let end: String = value
        .chars()
        .rev()
        .take(4)
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    format!("{}..{}", start, end)
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
