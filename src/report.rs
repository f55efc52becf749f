use std::fmt::Arguments;
use std::io::{self, Stderr, Write};

use crate::game::Board;

/// Line-oriented diagnostic stream.
///
/// Every line is prefixed with the program name. Write errors are dropped:
/// nothing in training depends on the diagnostics reaching their destination.
pub struct Reporter<W: Write = Stderr> {
    out: W,
    prefix: String,
    verbose: bool,
    quiet: bool,
}

impl Reporter<Stderr> {
    pub fn stderr(prefix: impl Into<String>, verbose: bool, quiet: bool) -> Self {
        Self::new(io::stderr(), prefix, verbose, quiet)
    }
}

impl Reporter<io::Sink> {
    /// A reporter that discards everything.
    pub fn silent() -> Self {
        Self::new(io::sink(), "", false, true)
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, prefix: impl Into<String>, verbose: bool, quiet: bool) -> Self {
        Self {
            out,
            prefix: prefix.into(),
            verbose,
            quiet,
        }
    }

    /// Whether boards are rendered after every ply.
    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    pub fn msg(&mut self, args: Arguments<'_>) {
        if self.quiet {
            return;
        }
        let _ = writeln!(self.out, "{}: {}", self.prefix, args);
    }

    /// Renders `board` when verbose. Empty boards are skipped.
    pub fn board(&mut self, board: &Board) {
        if !self.is_verbose() || board.is_empty() {
            return;
        }
        for line in board.to_string().lines() {
            self.msg(format_args!("{}", line));
        }
        self.msg(format_args!(""));
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
