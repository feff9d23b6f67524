use crate::{
    llm::LLMClient,
    research::{ResearchEngine, ResearchParams, SiteSink},
    tools::search::WebSearchProvider,
    types::{Result, Site},
};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Characters of page content kept per source (roughly 1000 tokens).
const MAX_SOURCE_CHARS: usize = 4000;

const QUERY_WRITER_PROMPT: &str = r#"Your goal is to generate a targeted web search query.

<TOPIC>
{topic}
</TOPIC>

Format your response as a JSON object with these exact keys:
   - "query": The actual search query string
   - "rationale": Brief explanation of why this query is relevant

Provide your response in JSON format only."#;

const SUMMARIZER_INSTRUCTIONS: &str = r#"Generate a high-quality summary of the provided context.

When creating a NEW summary:
1. Highlight the most relevant information related to the user topic from the search results
2. Ensure a coherent flow of information

When EXTENDING an existing summary:
1. Read the existing summary and new search results carefully
2. Compare the new information with the existing summary
3. Add new, relevant information without repeating what is already covered
4. Skip information that is not relevant to the user topic

Start directly with the updated summary, without preamble or titles. Do not use XML tags in the output."#;

const REFLECTION_INSTRUCTIONS: &str = r#"You are an expert research assistant analyzing a summary about {topic}.

1. Identify knowledge gaps or areas that need deeper exploration
2. Generate a follow-up question that would help expand the understanding
3. Focus on technical details, implementation specifics, or emerging trends that weren't fully covered

Format your response as a JSON object with these exact keys:
- "knowledge_gap": Describe what information is missing or needs clarification
- "follow_up_query": Write a specific question to address this gap

Provide your analysis in JSON format only."#;

#[derive(Debug, Deserialize)]
struct GeneratedQuery {
    query: String,
}

#[derive(Debug, Deserialize)]
struct Reflection {
    #[serde(default)]
    knowledge_gap: String,
    follow_up_query: String,
}

/// Deep research over an LLM and a web search provider.
pub struct ResearchCoordinator {
    llm: Arc<dyn LLMClient>,
    search: Arc<dyn WebSearchProvider>,
}

impl ResearchCoordinator {
    pub fn new(llm: Arc<dyn LLMClient>, search: Arc<dyn WebSearchProvider>) -> Self {
        Self { llm, search }
    }

    async fn generate_query(&self, topic: &str, params: &ResearchParams) -> Result<String> {
        let prompt = QUERY_WRITER_PROMPT.replace("{topic}", topic);
        let response = self
            .llm
            .generate_with_system(&prompt, "Generate a query for web search:")
            .await?;
        let response = clean_output(&response, params);

        Ok(parse_json::<GeneratedQuery>(&response)
            .map(|q| q.query)
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| fallback_query(topic)))
    }

    /// Search one round and return formatted source text for the summarizer.
    async fn web_research(
        &self,
        query: &str,
        params: &ResearchParams,
        sites: &dyn SiteSink,
        sources: &mut Vec<Site>,
    ) -> Result<String> {
        let hits = self.search.search(query, params.results_per_round).await?;

        let mut blocks = Vec::with_capacity(hits.len());
        for hit in hits {
            let site = hit.site();
            sites.report(site.clone());
            if !sources.iter().any(|s| s.url == site.url) {
                sources.push(site.clone());
            }

            let content = if params.fetch_full_page {
                match self.search.fetch_page(&site.url).await {
                    Ok(page) => page,
                    Err(e) => {
                        tracing::warn!(url = %site.url, "Falling back to snippet: {}", e);
                        hit.snippet.clone()
                    }
                }
            } else {
                hit.snippet.clone()
            };

            blocks.push(format!(
                "Source: {}\n===\nURL: {}\n===\nMost relevant content from source: {}\n===",
                site.title,
                site.url,
                truncate_chars(&content, MAX_SOURCE_CHARS)
            ));
        }

        Ok(blocks.join("\n\n"))
    }

    async fn summarize(
        &self,
        topic: &str,
        running_summary: &str,
        sources: &str,
        params: &ResearchParams,
    ) -> Result<String> {
        let prompt = if running_summary.is_empty() {
            format!(
                "<User Input>\n{}\n</User Input>\n\n<Search Results>\n{}\n</Search Results>",
                topic, sources
            )
        } else {
            format!(
                "<User Input>\n{}\n</User Input>\n\n<Existing Summary>\n{}\n</Existing Summary>\n\n<New Search Results>\n{}\n</New Search Results>",
                topic, running_summary, sources
            )
        };

        let response = self
            .llm
            .generate_with_system(SUMMARIZER_INSTRUCTIONS, &prompt)
            .await?;
        Ok(clean_output(&response, params))
    }

    async fn reflect(
        &self,
        topic: &str,
        running_summary: &str,
        params: &ResearchParams,
    ) -> Result<String> {
        let system = REFLECTION_INSTRUCTIONS.replace("{topic}", topic);
        let prompt = format!(
            "Reflect on our existing knowledge:\n===\n{}\n===\nAnd now identify a knowledge gap and generate a follow-up web search query:",
            running_summary
        );

        let response = self.llm.generate_with_system(&system, &prompt).await?;
        let response = clean_output(&response, params);

        match parse_json::<Reflection>(&response) {
            Some(r) if !r.follow_up_query.trim().is_empty() => {
                tracing::debug!(gap = %r.knowledge_gap, "Reflection found knowledge gap");
                Ok(r.follow_up_query)
            }
            _ => Ok(fallback_query(topic)),
        }
    }
}

#[async_trait]
impl ResearchEngine for ResearchCoordinator {
    async fn run(
        &self,
        topic: &str,
        params: &ResearchParams,
        sites: &dyn SiteSink,
    ) -> Result<String> {
        let mut query = self.generate_query(topic, params).await?;
        let mut running_summary = String::new();
        let mut sources: Vec<Site> = Vec::new();

        for round in 0..params.round_budget {
            tracing::info!(
                model = self.llm.model_name(),
                "Research round {}/{}: {}",
                round + 1,
                params.round_budget,
                query
            );

            let gathered = self
                .web_research(&query, params, sites, &mut sources)
                .await?;

            if gathered.is_empty() {
                tracing::warn!("No search results for query: {}", query);
            } else {
                running_summary = self
                    .summarize(topic, &running_summary, &gathered, params)
                    .await?;
            }

            if round + 1 < params.round_budget {
                query = self.reflect(topic, &running_summary, params).await?;
            }
        }

        Ok(finalize_summary(&running_summary, &sources))
    }
}

fn fallback_query(topic: &str) -> String {
    format!("Tell me more about {}", topic)
}

fn finalize_summary(running_summary: &str, sources: &[Site]) -> String {
    let listing: Vec<String> = sources
        .iter()
        .map(|s| format!("* {} : {}", s.title, s.url))
        .collect();

    format!(
        "## Summary\n{}\n\n### Sources:\n{}",
        running_summary.trim(),
        listing.join("\n")
    )
}

fn clean_output(text: &str, params: &ResearchParams) -> String {
    if params.strip_thinking_tokens {
        strip_thinking_tokens(text)
    } else {
        text.trim().to_string()
    }
}

/// Remove every `<think>...</think>` block. An unterminated block is dropped
/// to the end of the text.
fn strip_thinking_tokens(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("<think>") {
        out.push_str(&rest[..start]);
        match rest[start..].find("</think>") {
            Some(end) => rest = &rest[start + end + "</think>".len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);

    out.trim().to_string()
}

/// Parse the first JSON object embedded in model output.
fn parse_json<T: serde::de::DeserializeOwned>(text: &str) -> Option<T> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
