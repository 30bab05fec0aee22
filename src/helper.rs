use std::io::{stdin, stdout, BufRead, Write};

use crate::{NotesError, Result};

// Helper method for parsing tags
pub fn parse_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// First non-empty line of `content`, cut to `max_chars` characters.
pub fn content_preview(content: &str, max_chars: usize) -> String {
    let first_line = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    if first_line.chars().count() <= max_chars {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Drops the HTML comment lines written into editor templates.
pub fn strip_comment_lines(content: &str) -> String {
    let mut in_comment = false;
    let mut kept = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if in_comment {
            if trimmed.ends_with("-->") {
                in_comment = false;
            }
            continue;
        }
        if trimmed.starts_with("<!--") {
            in_comment = !trimmed.ends_with("-->");
            continue;
        }
        kept.push(line);
    }
    kept.join("\n").trim().to_string()
}

/// Prints `prompt` with a `[y/N]` suffix and reads an answer from `input`.
pub fn confirm_with<R: BufRead>(prompt: &str, input: &mut R) -> Result<bool> {
    print!("{} [y/N]: ", prompt);
    stdout().flush().map_err(NotesError::Io)?;

    let mut answer = String::new();
    input.read_line(&mut answer).map_err(NotesError::Io)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Asks on stdin.
pub fn confirm(prompt: &str) -> Result<bool> {
    confirm_with(prompt, &mut stdin().lock())
}
