use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use valdash::app::{App, AppOptions, InputMode, StatusLevel};
use valdash::config;
use valdash::core::Action;
use valdash::domain::BlockTag;
use valdash::infrastructure::ethereum::{ProviderConfig, SignerConfig};
use valdash::infrastructure::runtime::{RuntimeBridge, RuntimeCommand};
use valdash::logging::init_logging;
use valdash::ui;

#[derive(Debug, Parser)]
#[command(
    name = "valdash",
    version,
    about = "valdash: a terminal dashboard for the KCC Validators contract"
)]
struct Args {
    /// HTTP JSON-RPC endpoint (e.g. http://localhost:8545)
    #[arg(long)]
    rpc: Option<String>,

    /// WebSocket endpoint (e.g. ws://localhost:8546)
    #[arg(long)]
    ws: Option<String>,

    /// IPC path (e.g. ~/.ethereum/geth.ipc). Unix only.
    #[arg(long)]
    ipc: Option<PathBuf>,

    /// Configured network to start on (kcc-main, kcc-test, localhost, ...)
    #[arg(long)]
    network: Option<String>,

    /// Block tag for read calls: a block number or `latest`
    #[arg(long)]
    block: Option<BlockTag>,

    /// Hex private key of the signer; without it the session is read-only
    #[arg(long, env = "VALDASH_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Extra deployment directory to scan (repeatable)
    #[arg(long = "deployments", value_name = "DIR")]
    deployments: Vec<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(log_path) = config::log_path() {
        if let Err(err) = init_logging(&args.log_level, &log_path) {
            eprintln!("logging disabled: {err:#}");
        }
    }

    let config = config::load();
    let options = options_from_args(&args)?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = RuntimeBridge::new().and_then(|runtime| {
        let app = App::new(config, options);
        run_app(&mut terminal, app, runtime)
    });

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("{err:#}");
        eprintln!("{err:?}");
    }

    Ok(())
}

fn options_from_args(args: &Args) -> Result<AppOptions> {
    // CLI endpoints take precedence: ipc, then ws, then rpc
    let endpoint = if let Some(ipc) = args.ipc.clone() {
        #[cfg(unix)]
        {
            Some(ProviderConfig::Ipc(ipc))
        }
        #[cfg(not(unix))]
        {
            let _ = ipc;
            return Err(anyhow::anyhow!("IPC is not supported on this platform"));
        }
    } else if let Some(ws) = args.ws.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(ProviderConfig::WebSocket(ws.to_string()))
    } else {
        args.rpc
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ProviderConfig::parse)
    };

    let signer = args
        .private_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .map(SignerConfig::from_private_key)
        .transpose()
        .context("--private-key")?;

    Ok(AppOptions {
        network: args.network.clone(),
        endpoint,
        signer,
        block: args.block,
        deployments: args.deployments.clone(),
    })
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runtime: RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_background(&mut app, &runtime);
        app.sync_context();
        terminal.draw(|f| ui::draw(f, &app))?;
        if app.should_quit {
            let _ = runtime.send(RuntimeCommand::Shutdown);
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut app, key);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

/// Deliver queued commands to the worker and apply its events
fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for command in app.take_commands() {
        if let Err(err) = runtime.send(command) {
            tracing::error!("{err:#}");
            app.set_status(format!("{err:#}"), StatusLevel::Error);
        }
    }
    for event in runtime.poll_events() {
        app.apply_event(event);
    }
    // Applying events can queue follow-up reads
    for command in app.take_commands() {
        let _ = runtime.send(command);
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if app.help_open {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.help_open = false;
        }
        return;
    }

    if app.settings_open {
        match key.code {
            KeyCode::Esc | KeyCode::Char('s') => app.settings_open = false,
            KeyCode::Char('r') => app.reload_config(),
            KeyCode::Char('[') => app.cycle_network(false),
            KeyCode::Char(']') => app.cycle_network(true),
            _ => {}
        }
        return;
    }

    match app.input_mode {
        InputMode::Command => handle_command_mode(app, key),
        InputMode::Normal if app.is_editing() => app.handle_panel_key(key),
        InputMode::Normal => handle_normal_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.should_quit = true
        }
        (KeyCode::Char('?'), _) => app.help_open = true,
        (KeyCode::Char('s'), _) => app.settings_open = true,
        (KeyCode::Char(':'), _) => app.enter_command(),
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => app.move_selection(true),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => app.move_selection(false),
        (KeyCode::Char('['), _) | (KeyCode::BackTab, _) => app.cycle_page(false),
        (KeyCode::Char(']'), _) | (KeyCode::Tab, _) => app.cycle_page(true),
        (KeyCode::Char(c @ '1'..='9'), _) => {
            if let Some(index) = c.to_digit(10) {
                app.select_page(index as usize - 1);
            }
        }
        (KeyCode::Enter, _) => app.activate_selected(),
        (KeyCode::Char('r'), _) => {
            app.refresh_displays();
            app.set_status("Refreshing", StatusLevel::Info);
        }
        (KeyCode::Char('y'), _) => match app.copy_target() {
            Some(text) => app.apply_action(Action::Copy(text)),
            None => app.set_status("Nothing to copy", StatusLevel::Warn),
        },
        _ => {}
    }
}

fn handle_command_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_command(),
        KeyCode::Enter => app.apply_command(),
        KeyCode::Backspace => {
            app.command.input.pop();
        }
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.command.input.push(ch);
        }
        _ => {}
    }
}
