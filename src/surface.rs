//! Terminal rendering surface for the widget.
//!
//! A stand-in for the embedded web dialog: renders the popup as a card in
//! the terminal and translates keystrokes into widget commands. Rating
//! step: digit keys pick a rating (0 means 10), Enter advances. Review
//! step: type freely, Enter submits. Esc quits.

use colored::*;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal;
use eyre::Result;
use futures::StreamExt;

use surveyr::presentation::{MAX_RATING, MIN_RATING, PopupView, Step};
use surveyr::scheduler::{WidgetEvent, WidgetHandle};

/// Restores the terminal on every exit path.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            log::warn!("Failed to restore terminal: {}", e);
        }
    }
}

/// Drive a widget session from the terminal until it ends or the user
/// quits.
pub async fn run(mut handle: WidgetHandle) -> Result<()> {
    let _raw = RawModeGuard::enable()?;
    let mut keys = EventStream::new();
    let mut current: Option<PopupView> = None;

    print_line(
        &"Widget running; the popup appears when scheduled. Press Esc to quit."
            .cyan()
            .to_string(),
    );

    loop {
        tokio::select! {
            maybe_event = handle.next_event() => {
                match maybe_event {
                    Some(WidgetEvent::Presented(view)) | Some(WidgetEvent::Updated(view)) => {
                        draw(&view);
                        current = Some(view);
                    }
                    Some(WidgetEvent::Dismissed) => {
                        current = None;
                        print_line(&"Popup dismissed.".yellow().to_string());
                    }
                    Some(WidgetEvent::Submitted) => {
                        current = None;
                        print_line(&"Thanks for your feedback!".green().to_string());
                    }
                    None => break,
                }
            }
            maybe_key = keys.next() => {
                match maybe_key {
                    Some(Ok(Event::Key(key))) => {
                        if key.kind == KeyEventKind::Press
                            && handle_key(key, &handle, current.as_ref())
                        {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        log::warn!("Terminal input error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    handle.shutdown();
    Ok(())
}

/// Translate one keystroke; returns true when the user asked to quit.
fn handle_key(key: KeyEvent, handle: &WidgetHandle, current: Option<&PopupView>) -> bool {
    if key.code == KeyCode::Esc {
        return true;
    }
    let Some(view) = current else {
        // Nothing on screen; only quitting is meaningful.
        return key.code == KeyCode::Char('q');
    };

    match view.step {
        Step::Rating => match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let rating = match c.to_digit(10) {
                    Some(0) => MAX_RATING,
                    Some(n) => n as u8,
                    None => MIN_RATING,
                };
                handle.set_rating(rating);
            }
            KeyCode::Enter => handle.advance(),
            _ => {}
        },
        Step::Review => match key.code {
            KeyCode::Enter => handle.advance(),
            KeyCode::Backspace => {
                let mut review = view.review.clone();
                review.pop();
                handle.set_review(review);
            }
            KeyCode::Char(c) => {
                let mut review = view.review.clone();
                review.push(c);
                handle.set_review(review);
            }
            _ => {}
        },
    }
    false
}

/// Print a line under raw mode.
fn print_line(line: &str) {
    print!("{}\r\n", line);
}

fn draw(view: &PopupView) {
    print_line("");
    print_line(&format!("  {}", view.title.as_str().bold()));
    match view.step {
        Step::Rating => {
            let mut scale = String::from("  ");
            for value in MIN_RATING..=MAX_RATING {
                let cell = format!("[{}]", value);
                if value == view.rating {
                    scale.push_str(&cell.as_str().on_blue().white().to_string());
                } else {
                    scale.push_str(&cell);
                }
                scale.push(' ');
            }
            print_line(&scale);
            print_line(&format!(
                "  {}{}{}",
                "Not likely".dimmed(),
                " ".repeat(24),
                "Very likely".dimmed()
            ));
            print_line(&format!("  {}", "Pick 1-9, 0 for 10, Enter for next".dimmed()));
        }
        Step::Review => {
            if view.review.is_empty() {
                print_line(&format!("  {}", view.placeholder.as_str().dimmed().italic()));
            } else {
                print_line(&format!("  {}", view.review));
            }
            print_line(&format!("  {}", "Type your review, Enter to send".dimmed()));
        }
    }
}
