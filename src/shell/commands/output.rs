//! Output helpers for shell commands.
//!
//! Output piped into a command like `head` may lose its reader early. A
//! BrokenPipe then ends the command quietly with `Ok(())` instead of an error.

/// Print with newline, handling BrokenPipe gracefully.
///
/// Returns `Ok(())` from the enclosing function on BrokenPipe.
/// Propagates other IO errors.
#[macro_export]
macro_rules! print_line {
    ($($arg:tt)*) => {{
        use std::io::Write;
        match writeln!(std::io::stdout(), $($arg)*) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }};
}

pub use print_line;
