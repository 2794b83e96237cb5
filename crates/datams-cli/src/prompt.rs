use console::Term;
use std::io;

/// Ask a yes/no question. Only `y` or `yes` (any case) counts as agreement.
pub fn prompt_confirm(prompt: &str) -> io::Result<bool> {
    let term = Term::stdout();
    term.write_str(&format!("{} Y or [N]: ", prompt))?;
    let answer = term.read_line()?;
    Ok(is_affirmative(&answer))
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

pub fn prompt_line(prompt: &str) -> io::Result<String> {
    let term = Term::stdout();
    term.write_str(&format!("{}: ", prompt))?;
    Ok(term.read_line()?.trim().to_string())
}

/// Read a password twice without echo. `None` when the entries differ.
pub fn prompt_new_password() -> io::Result<Option<String>> {
    let term = Term::stdout();
    term.write_str("Password: ")?;
    let first = term.read_secure_line()?;
    term.write_str("Confirm password: ")?;
    let second = term.read_secure_line()?;
    Ok((first == second).then_some(first))
}
