//! `search`.

use meetagenda_core::Resource;
use meetagenda_providers::ResourceSearch;

use crate::cli::SearchArgs;
use crate::context::AppContext;
use crate::error::ClientResult;

/// Renders results as a numbered list.
pub fn render(results: &[Resource]) -> String {
    if results.is_empty() {
        return "No results.\n".to_string();
    }
    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, result.title));
        if !result.snippet.trim().is_empty() {
            out.push_str(&format!("   {}\n", result.snippet.trim()));
        }
        out.push_str(&format!("   {}\n", result.url));
    }
    out
}

/// Runs one search. Unlike the resources section of an email, a missing
/// `SERPER_API_KEY` is an error here.
pub async fn run(ctx: &AppContext, args: SearchArgs) -> ClientResult<()> {
    let num = args.num.unwrap_or(ctx.config().search.num_results);
    let results = ctx.serper()?.search(&args.query, num).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", render(&results));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_numbers_results() {
        let out = render(&[
            Resource::new("Tokio", "An async runtime", "https://tokio.rs"),
            Resource::new("Serde", "  ", "https://serde.rs"),
        ]);
        assert_eq!(
            out,
            "1. Tokio\n   An async runtime\n   https://tokio.rs\n2. Serde\n   https://serde.rs\n"
        );
        assert_eq!(render(&[]), "No results.\n");
    }
}
