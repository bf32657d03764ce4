//! Colored terminal narration helpers.
//!
//! Progress lines are plain stdout; success and warning lines get the
//! same green/yellow treatment the errors printed by [`crate::run_main`]
//! get in red. Colors degrade gracefully on non-tty outputs via anstream.

use std::io::Write as _;

use owo_colors::OwoColorize;

/// Print a plain progress line to stdout.
pub fn output(msg: impl AsRef<str>) {
    let mut stdout = anstream::stdout();
    // Don't panic if writing fails.
    let _ = writeln!(stdout, "{}", msg.as_ref());
}

/// Print a success line (green) to stdout.
pub fn success(msg: impl AsRef<str>) {
    let mut stdout = anstream::stdout();
    let _ = writeln!(stdout, "{}", msg.as_ref().green());
}

/// Print a warning line (yellow) to stdout.
pub fn warning(msg: impl AsRef<str>) {
    let mut stdout = anstream::stdout();
    let _ = writeln!(stdout, "{}", msg.as_ref().yellow());
}
