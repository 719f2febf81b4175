/*!
 Console output in the `[*]` status / `[-]` error style.

 Write failures are ignored: when stdout is a closed pipe there is nobody left to report them to.
*/

use std::io::{stdout, Write};

use crate::app::error::RuntimeError;

/// Print a status line
pub fn print_status(msg: &str) {
    write_status(&mut stdout().lock(), msg);
}

/// Print an error line
pub fn print_error(msg: &str) {
    write_error(&mut stdout().lock(), msg);
}

/// Print an error followed by its backtrace, one frame line per row
pub fn print_exception(error: &RuntimeError) {
    write_exception(&mut stdout().lock(), error);
}

pub fn print_line() {
    let _ = writeln!(stdout().lock());
}

fn write_status(out: &mut impl Write, msg: &str) {
    let _ = writeln!(out, "[*] {msg}");
}

fn write_error(out: &mut impl Write, msg: &str) {
    let _ = writeln!(out, "[-] {msg}");
}

fn write_exception(out: &mut impl Write, error: &RuntimeError) {
    write_error(out, &error.to_string());
    if let Some(backtrace) = error.backtrace() {
        for line in backtrace.to_string().lines() {
            if writeln!(out, "\t{line}").is_err() {
                return;
            }
        }
    }
}
