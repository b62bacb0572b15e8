//! Terminal conflict resolver and moderator.
//!
//! Both read one answer per line. End of input (or a broken terminal) picks
//! the choice that changes nothing: `drop` for merges, `skip` for updates.

use std::io::{self, BufRead, Write};

use colored::Colorize;

use changes_diff::render_change;
use changes_register::{
    Change, Changeset, Conflict, ConflictResolver, ModerationDecision, Moderator, Resolution,
};

pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl Prompt<io::StdinLock<'static>, io::Stderr> {
    pub fn terminal() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask until the first character of an answer matches one of `keys`.
    fn ask(&mut self, question: &str, keys: &[char]) -> io::Result<Option<char>> {
        loop {
            write!(self.output, "{question} ")?;
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let answer = line.trim().chars().next().map(|c| c.to_ascii_lowercase());
            if let Some(key) = answer.filter(|c| keys.contains(c)) {
                return Ok(Some(key));
            }
        }
    }

    fn show(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }
}

/// Settles merge conflicts by asking on the terminal.
pub struct TerminalResolver<R, W>(pub Prompt<R, W>);

impl<R: BufRead, W: Write> TerminalResolver<R, W> {
    fn prompt(&mut self, conflict: &Conflict) -> io::Result<Resolution> {
        self.0.show(&conflict.to_string().yellow().to_string())?;
        let answer = self
            .0
            .ask("keep [c]losing, keep co[n]tinuing, or [d]rop?", &['c', 'n', 'd'])?;
        Ok(match answer {
            Some('c') => Resolution::Closing,
            Some('n') => Resolution::Continuing,
            _ => Resolution::Drop,
        })
    }
}

impl<R: BufRead, W: Write> ConflictResolver for TerminalResolver<R, W> {
    fn resolve(&mut self, conflict: &Conflict) -> Resolution {
        self.prompt(conflict).unwrap_or(Resolution::Drop)
    }
}

/// Vets each change of a moderated update on the terminal.
pub struct TerminalModerator<R, W>(pub Prompt<R, W>);

impl<R: BufRead, W: Write> TerminalModerator<R, W> {
    fn prompt(
        &mut self,
        changeset: &Changeset,
        change: &Change,
        conflict: Option<&Conflict>,
    ) -> io::Result<ModerationDecision> {
        self.0.show(&changeset.summary().yellow().to_string())?;
        self.0.show(render_change(change).trim_end())?;
        if let Some(conflict) = conflict {
            self.0.show(&format!("{}\n{conflict}", "live state differs:".red().bold()))?;
        }
        let answer = self.0.ask("[a]pply, [s]kip or [m]ask?", &['a', 's', 'm'])?;
        Ok(match answer {
            Some('a') => ModerationDecision::Apply,
            Some('m') => ModerationDecision::Mask,
            _ => ModerationDecision::Skip,
        })
    }
}

impl<R: BufRead, W: Write> Moderator for TerminalModerator<R, W> {
    fn moderate(
        &mut self,
        changeset: &Changeset,
        change: &Change,
        conflict: Option<&Conflict>,
    ) -> ModerationDecision {
        self.prompt(changeset, change, conflict)
            .unwrap_or(ModerationDecision::Skip)
    }
}
