// Interactive prompts on stdin, written to stderr so stdout stays clean.

use std::io::{self, BufRead, IsTerminal, Write};

use crate::exit_code::UsageError;

/// Ask a yes/no question. Destructive commands call this unless `--yes`
/// was passed; without a terminal there is nobody to ask.
pub fn confirm(question: &str, assume_yes: bool) -> anyhow::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(UsageError::new(format!("{question} Re-run with --yes to confirm.")).into());
    }
    let answer = ask(&format!("{question} [y/N] "))?;
    Ok(is_yes(&answer))
}

/// Read one line after printing `label`. The trailing newline is removed.
pub fn ask(label: &str) -> io::Result<String> {
    let mut err = io::stderr().lock();
    write!(err, "{label}")?;
    err.flush()?;
    drop(err);

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Use `given` when present, otherwise prompt for it.
pub fn value_or_ask(given: Option<String>, label: &str) -> io::Result<String> {
    match given {
        Some(value) => Ok(value),
        None => ask(label),
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }

    #[test]
    fn assume_yes_skips_the_prompt() {
        assert!(confirm("Delete this workspace?", true).unwrap());
    }

    #[test]
    fn given_value_is_used_without_prompting() {
        assert_eq!(value_or_ask(Some("a@b.c".into()), "Email: ").unwrap(), "a@b.c");
    }
}
