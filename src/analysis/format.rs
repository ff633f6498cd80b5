use super::report::{AnalysisResult, RepositoryMetadata};
use crate::github::types::LanguageBreakdown;
use crate::markdown::{escape_md_link, escape_table_cell};

/// Characters of README shown in the report before it is cut.
const README_EXCERPT_CHARS: usize = 1000;

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Render an analysis as a Markdown report for terminal output.
pub fn format_report(result: &AnalysisResult) -> String {
    let repo = &result.repository;
    let mut out = format!(
        "# [{}]({})\n\n",
        escape_md_link(&repo.full_name),
        escape_md_link(&repo.url)
    );

    if let Some(ref desc) = repo.description {
        out.push_str(&format!("{desc}\n\n"));
    }

    format_metadata_table(repo, &mut out);
    format_languages_section(&result.languages, &mut out);
    format_summary_section(result.ai_summary.as_deref(), &mut out);
    format_readme_section(result.readme.text(), &mut out);

    out.push_str(&format!(
        "_Analyzed at {}_\n",
        result.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out
}

fn format_metadata_table(repo: &RepositoryMetadata, out: &mut String) {
    out.push_str("| Attribute | Value |\n|-----------|-------|\n");
    out.push_str(&format!("| Stars | {} |\n", repo.stars));
    out.push_str(&format!("| Forks | {} |\n", repo.forks));
    out.push_str(&format!("| Watchers | {} |\n", repo.watchers));
    out.push_str(&format!("| Open Issues | {} |\n", repo.issues));
    out.push_str(&format!("| License | {} |\n", escape_table_cell(&repo.license)));
    out.push_str(&format!("| Default Branch | {} |\n", repo.default_branch));
    // GitHub reports size in kilobytes.
    out.push_str(&format!(
        "| Size | {} |\n",
        format_size(repo.size.saturating_mul(1024))
    ));
    out.push_str(&format!(
        "| Created | {} |\n",
        repo.created_at.format("%Y-%m-%d")
    ));
    out.push_str(&format!(
        "| Updated | {} |\n\n",
        repo.updated_at.format("%Y-%m-%d")
    ));
}

fn format_languages_section(languages: &LanguageBreakdown, out: &mut String) {
    let shares = languages.percentages();
    if shares.is_empty() {
        return;
    }
    out.push_str("## Languages\n\n");
    for share in &shares {
        out.push_str(&format!(
            "- {} {:.1}% ({})\n",
            share.language,
            share.percent,
            format_size(share.bytes)
        ));
    }
    out.push('\n');
}

fn format_summary_section(summary: Option<&str>, out: &mut String) {
    let Some(summary) = summary else { return };
    out.push_str("## AI Summary\n\n");
    out.push_str(summary);
    out.push_str("\n\n");
}

fn format_readme_section(readme: Option<&str>, out: &mut String) {
    let Some(content) = readme.filter(|r| !r.trim().is_empty()) else {
        return;
    };
    out.push_str("## README\n\n");
    match content.char_indices().nth(README_EXCERPT_CHARS) {
        Some((cut, _)) => {
            out.push_str(&content[..cut]);
            out.push_str("...");
        }
        None => out.push_str(content),
    }
    out.push_str("\n\n");
}
