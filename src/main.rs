use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use log::{debug, LevelFilter};
use muezzin::{config::Config, display::Display, state::UserState};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

fn main() -> anyhow::Result<()> {
    // Quiet by default: stderr shares the terminal with the widget. Set
    // RUST_LOG and redirect stderr to a file to get logs out.
    env_logger::builder()
        .filter_level(LevelFilter::Off)
        .parse_default_env()
        .init();

    let config = Config::load();
    let mut state = UserState::default();
    let mut display = Display::new(&config)?;

    // SIGINT/SIGTERM trip the flag so the loop falls out and the display's
    // Drop puts the terminal back
    let quit = Arc::new(AtomicBool::new(false));
    let quit_handle = Arc::clone(&quit);
    ctrlc::set_handler(move || quit_handle.store(true, Ordering::Relaxed))
        .context("Error setting termination handler")?;

    while !quit.load(Ordering::Relaxed) {
        // The input poll doubles as the tick timer
        if event::poll(Display::INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match key.code {
                        KeyCode::Left | KeyCode::Char('h') => {
                            state.select_prev();
                            debug!("Selected city {}", state.city.id);
                        }
                        KeyCode::Right | KeyCode::Char('l') => {
                            state.select_next();
                            debug!("Selected city {}", state.city.id);
                        }
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        // Raw mode swallows the signal, so the key shows up
                        // here instead
                        KeyCode::Char('c')
                            if key.modifiers
                                .contains(KeyModifiers::CONTROL) =>
                        {
                            break
                        }
                        _ => {}
                    }
                }
                Event::Resize(..) => display.invalidate(),
                _ => {}
            }
        }
        display.tick(&state)?;
    }

    Ok(())
}
