//! CLI output formatting utilities.

use crate::store::Document;
use crate::tmdb::{MovieDetail, MovieSummary};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// One line per document in a listing.
    pub fn document_row(doc: &Document) {
        println!(
            "  {} {} {} ({})",
            style("*").cyan(),
            style(format!("#{}", doc.id)).dim(),
            style(&doc.title).bold(),
            style(doc.updated_at.format("%Y-%m-%d %H:%M")).dim()
        );
        if let Some(content) = doc.content.as_deref().filter(|c| !c.trim().is_empty()) {
            println!("     {}", content_preview(content, 100));
        }
    }

    /// Full view of a single document.
    pub fn document(doc: &Document) {
        Output::header(&doc.title);
        Output::kv("ID", &doc.id.to_string());
        Output::kv("Created", &doc.created_at.to_rfc3339());
        Output::kv("Updated", &doc.updated_at.to_rfc3339());
        println!();
        match doc.content.as_deref() {
            Some(content) if !content.is_empty() => println!("{}", content),
            _ => println!("{}", style("(no content)").dim()),
        }
    }

    /// One line per movie search result.
    pub fn movie_row(movie: &MovieSummary) {
        let year = movie
            .release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .unwrap_or("----");
        println!(
            "  {} {} ({}) {}",
            style("*").cyan(),
            style(&movie.title).bold(),
            year,
            style(format!("id {}", movie.id)).dim()
        );
        if let Some(overview) = movie.overview.as_deref().filter(|o| !o.is_empty()) {
            println!("     {}", content_preview(overview, 160));
        }
    }

    /// Full view of a single movie.
    pub fn movie(detail: &MovieDetail) {
        Output::header(&detail.title);
        if let Some(tagline) = detail.tagline.as_deref().filter(|t| !t.is_empty()) {
            println!("  {}", style(tagline).italic());
        }
        Output::kv("ID", &detail.id.to_string());
        if let Some(date) = &detail.release_date {
            Output::kv("Released", date);
        }
        if let Some(runtime) = detail.runtime {
            Output::kv("Runtime", &format!("{} min", runtime));
        }
        if !detail.genres.is_empty() {
            let genres: Vec<&str> = detail.genres.iter().map(|g| g.name.as_str()).collect();
            Output::kv("Genres", &genres.join(", "));
        }
        if let Some(score) = detail.vote_average {
            Output::kv("Rating", &format!("{:.1}/10", score));
        }
        if let Some(overview) = &detail.overview {
            println!("\n{}", overview);
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Flatten newlines and truncate with ellipsis.
pub fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("short\ntext", 20), "short text");
        assert_eq!(content_preview("abcdef", 3), "abc...");
        // multi-byte characters are never split
        assert_eq!(content_preview("ééééé", 2), "éé...");
    }
}
