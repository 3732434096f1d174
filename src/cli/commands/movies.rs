//! Movies command - TMDB lookups without an agent.

use crate::cli::preflight::{self, Operation};
use crate::cli::{MoviesAction, Output};
use crate::config::Settings;
use crate::store::clamp_limit;
use crate::tmdb::{MovieCatalog, TmdbClient};
use anyhow::Result;

/// Run a movies subcommand.
pub async fn run_movies(action: &MoviesAction, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Movies, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let client = TmdbClient::new(&settings.tmdb)?;

    match action {
        MoviesAction::Search { query, limit } => {
            let spinner = Output::spinner("Searching TMDB...");
            let page = client.search_movies(query, 1).await;
            spinner.finish_and_clear();

            let mut page = page?;
            if page.is_empty_result() || page.results.is_empty() {
                Output::info(&format!("No movies match '{}'.", query));
                return Ok(());
            }

            page.results.truncate(clamp_limit(*limit));
            match page.total_results {
                Some(total) => Output::header(&format!(
                    "Movies matching '{}' ({} of {})",
                    query,
                    page.results.len(),
                    total
                )),
                None => Output::header(&format!("Movies matching '{}'", query)),
            }
            println!();
            for movie in &page.results {
                Output::movie_row(movie);
            }
        }

        MoviesAction::Show { id } => match client.movie_detail(*id).await? {
            Some(detail) => Output::movie(&detail),
            None => {
                Output::error(&format!("Movie {} not found.", id));
                anyhow::bail!("Movie not found");
            }
        },
    }

    Ok(())
}
