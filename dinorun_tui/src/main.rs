//! Interactive terminal frontend for the dino backend.
//!
//! Renders the controller's view as a fixed little scene in the top-left of
//! an alternate screen and forwards keyboard input to the controller event
//! loop. Keys: `s` start, `r` restart, space jump, down-arrow duck,
//! `q`/Esc quit.
//!
//! Where the terminal reports key releases (kitty keyboard protocol), the
//! down arrow ducks while held; elsewhere each press toggles the posture.

use std::io::{self, stdout, Stdout, Write};
use std::thread;

use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::{cursor, execute, queue, terminal};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use dinorun::{GameController, GameView, HttpApi, InputEvent};

const OBSTACLE_COL: u16 = 24;

struct Config {
    server: Option<String>,
    name: String,
}

impl Config {
    fn from_args() -> Self {
        let mut server = None;
        let mut name = String::new();
        let mut args = std::env::args().skip(1);
        while let Some(a) = args.next() {
            match a.as_str() {
                "--server" => {
                    if let Some(v) = args.next() {
                        server = Some(v);
                    }
                }
                "--name" => {
                    if let Some(v) = args.next() {
                        name = v;
                    }
                }
                "--help" | "-h" => {
                    eprintln!("Usage: dinorun-tui [--server url] [--name player]");
                    std::process::exit(0);
                }
                _ => {}
            }
        }
        Self { server, name }
    }
}

/// Terminal implementation of the controller's view. Every mutation redraws
/// the whole scene.
struct TermView {
    out: Stdout,
    score: u64,
    status: String,
    ducking: bool,
    jumping: bool,
    obstacle: bool,
    started_once: bool,
    alert: Option<String>,
}

impl TermView {
    fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = stdout();
        execute!(out, terminal::EnterAlternateScreen, cursor::Hide)?;
        let mut view = Self {
            out,
            score: 0,
            status: "Press [s] to start".to_string(),
            ducking: false,
            jumping: false,
            obstacle: false,
            started_once: false,
            alert: None,
        };
        view.draw()?;
        Ok(view)
    }

    fn draw(&mut self) -> io::Result<()> {
        let controls = if self.started_once {
            "[r] restart  [space] jump  [down] duck  [q] quit"
        } else {
            "[s] start  [space] jump  [down] duck  [q] quit"
        };
        let dino = if self.ducking { "d_" } else { "D" };
        let air = if self.jumping { dino } else { "" };
        let ground_dino = if self.jumping { "" } else { dino };
        let obstacle_pad =
            " ".repeat((OBSTACLE_COL as usize).saturating_sub(ground_dino.len() + 2));
        let obstacle = if self.obstacle { "#" } else { " " };

        queue!(
            self.out,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0),
            Print(format!("DINO RUN{:>24}", format!("score: {}", self.score))),
            cursor::MoveTo(0, 1),
            Print(&self.status),
            cursor::MoveTo(0, 2),
            Print(controls),
            cursor::MoveTo(2, 4),
            Print(air),
            cursor::MoveTo(2, 5),
            Print(format!("{ground_dino}{obstacle_pad}{obstacle}")),
            cursor::MoveTo(0, 6),
            Print("─".repeat(40)),
        )?;
        if let Some(alert) = &self.alert {
            queue!(
                self.out,
                cursor::MoveTo(0, 8),
                SetForegroundColor(Color::Red),
                Print(format!("! {alert}")),
                ResetColor,
            )?;
        }
        self.out.flush()
    }

    fn redraw(&mut self) {
        if let Err(e) = self.draw() {
            tracing::error!("draw failed: {e}");
        }
    }
}

impl GameView for TermView {
    fn set_score(&mut self, score: u64) {
        self.score = score;
        self.redraw();
    }

    fn set_status(&mut self, text: &str) {
        self.status = text.to_string();
        self.alert = None;
        self.redraw();
    }

    fn set_ducking(&mut self, ducking: bool) {
        self.ducking = ducking;
        self.redraw();
    }

    fn set_jumping(&mut self, lifted: bool) {
        self.jumping = lifted;
        self.redraw();
    }

    fn set_obstacle_visible(&mut self, visible: bool) {
        self.obstacle = visible;
        self.redraw();
    }

    fn show_restart_control(&mut self) {
        self.started_once = true;
        self.redraw();
    }

    fn alert(&mut self, message: &str) {
        self.alert = Some(message.to_string());
        self.redraw();
    }
}

impl Drop for TermView {
    fn drop(&mut self) {
        let _ = execute!(self.out, terminal::LeaveAlternateScreen, cursor::Show);
        let _ = terminal::disable_raw_mode();
    }
}

/// Blocking keyboard reader; crossterm events become [`InputEvent`]s on the
/// controller's channel. Runs on its own thread so the async side never
/// blocks on the terminal.
fn spawn_input_thread(
    tx: mpsc::Sender<InputEvent>,
    name: String,
    release_events: bool,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        // Fallback for terminals without release events: alternate the
        // posture on each press.
        let mut duck_toggle = false;
        loop {
            let ev = match event::read() {
                Ok(ev) => ev,
                Err(_) => return,
            };
            let Event::Key(key) = ev else { continue };
            if key.kind == KeyEventKind::Repeat {
                continue;
            }
            let input = match (key.code, key.kind) {
                (KeyCode::Char('q') | KeyCode::Esc, KeyEventKind::Press) => Some(InputEvent::Quit),
                (KeyCode::Char('s'), KeyEventKind::Press) => Some(InputEvent::Start {
                    name: name.clone(),
                }),
                (KeyCode::Char('r'), KeyEventKind::Press) => Some(InputEvent::Restart),
                (KeyCode::Char(' '), KeyEventKind::Press) => Some(InputEvent::Jump),
                (KeyCode::Down, KeyEventKind::Press) => {
                    if release_events {
                        Some(InputEvent::DuckPressed)
                    } else {
                        duck_toggle = !duck_toggle;
                        Some(if duck_toggle {
                            InputEvent::DuckPressed
                        } else {
                            InputEvent::DuckReleased
                        })
                    }
                }
                (KeyCode::Down, KeyEventKind::Release) => Some(InputEvent::DuckReleased),
                _ => None,
            };
            let Some(input) = input else { continue };
            let quit = input == InputEvent::Quit;
            if tx.blocking_send(input).is_err() || quit {
                return;
            }
        }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Silent unless RUST_LOG asks; log lines would tear the raw-mode screen.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_args();
    let api = match config.server {
        Some(url) => HttpApi::new(url),
        None => HttpApi::from_env(),
    };
    let view = TermView::new()?;

    let release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
    if release_events {
        execute!(
            stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }

    let (tx, mut rx) = mpsc::channel(32);
    let input = spawn_input_thread(tx, config.name, release_events);

    let mut controller = GameController::new(api, view);
    controller.run(&mut rx).await;

    if release_events {
        execute!(stdout(), PopKeyboardEnhancementFlags)?;
    }
    drop(controller); // restores the terminal via TermView::drop
    let _ = input.join();
    Ok(())
}
