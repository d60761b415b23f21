//! `SearchDefault` dispatch (§4.8): search the fixed default engine,
//! enrich the top results in throwaway tabs, and fall back through the
//! Fallback Chooser's strategy list when the primary attempt is blocked
//! or comes back empty.

use std::time::Duration;

use cdp_surface::{BrowserSurface, PageHandle};
use reasoning_oracle::ReasoningOracle;
use serde_json::Value;
use taskbrowser_core_types::{FallbackStrategy, Query, ResultEntry, TaskResult, TaskResultData};

use crate::session::AgentSession;
use crate::{captcha, convert, util};
use captcha_controller::WaitOutcome;

const DEFAULT_ENGINE_URL: &str = "https://duckduckgo.com/";
const SEARCH_FIELD_TIMEOUT: Duration = Duration::from_secs(10);
const SEARCH_FIELD_RETRIES: u32 = 5;
const SETTLE_TIMEOUT: Duration = Duration::from_secs(15);
const DETAIL_TIMEOUT: Duration = Duration::from_secs(20);
const ENRICH_COUNT: usize = 3;

enum AttemptOutcome {
    Success(TaskResult),
    Captcha(String),
    Failed(TaskResult),
}

pub async fn dispatch(session: &mut AgentSession, query: &Query) {
    let query_text = query.as_str().to_string();
    let surface = session.surface.clone();

    let primary = attempt_search(surface.as_ref(), &session.active_page, &query_text, session.oracle.as_deref()).await;

    let mut captcha_urls = Vec::new();
    match primary {
        AttemptOutcome::Success(result) => {
            session.record_step("search_default", result);
            return;
        }
        AttemptOutcome::Captcha(url) => {
            captcha_urls.push(url);
            captcha::enter_paused(session, "search_default").await;
            if matches!(captcha::wait_for_clearance(session).await, WaitOutcome::Resolved) {
                let surface = session.surface.clone();
                let retry = attempt_search(surface.as_ref(), &session.active_page, &query_text, session.oracle.as_deref()).await;
                match retry {
                    AttemptOutcome::Success(result) => {
                        session.record_step("search_default_retry", result);
                        return;
                    }
                    AttemptOutcome::Captcha(url) => {
                        captcha_urls.push(url.clone());
                        session.record_step(
                            "search_default_retry",
                            TaskResult::captcha_detected("retry after captcha clearance hit another challenge", url),
                        );
                    }
                    AttemptOutcome::Failed(result) => {
                        session.record_step("search_default_retry", result);
                    }
                }
            }
        }
        AttemptOutcome::Failed(result) => {
            session.record_step("search_default", result);
        }
    }

    let resolved = run_fallback_pipeline(session, &query_text, &mut captcha_urls).await;
    if !resolved {
        session.record_step("fallback_exhausted", TaskResult::all_fallbacks_blocked(captcha_urls));
    }
}

/// Runs each fallback strategy in a fresh tab until one succeeds.
/// Returns `true` iff a strategy produced a successful step.
async fn run_fallback_pipeline(session: &mut AgentSession, query_text: &str, captcha_urls: &mut Vec<String>) -> bool {
    let strategies = fallback_chooser::choose(query_text, session.oracle.as_deref()).await;

    for strategy in strategies {
        let scoped_query = match &strategy {
            FallbackStrategy::SiteScoped { site, query } => format!("site:{site}.com {query}"),
            FallbackStrategy::AltSearchEngine { .. } => query_text.to_string(),
            FallbackStrategy::CacheLookup { .. } => {
                // No real implementation exists in either source variant;
                // treated as a documented no-op rather than a navigation.
                session.record_step(
                    "fallback_cache_lookup",
                    TaskResult::success("cache lookup has no implementation, skipped", TaskResultData::empty()),
                );
                continue;
            }
        };
        let step_label = match &strategy {
            FallbackStrategy::AltSearchEngine { .. } => "fallback_alt_engine",
            FallbackStrategy::SiteScoped { .. } => "fallback_site_search",
            FallbackStrategy::CacheLookup { .. } => unreachable!("cache lookup handled above"),
        };

        let page = match session.surface.new_tab(DEFAULT_ENGINE_URL).await {
            Ok(page) => page,
            Err(err) => {
                session.record_step(
                    step_label,
                    TaskResult::failure("failed to open fallback tab", TaskResultData::empty(), err.to_string()),
                );
                continue;
            }
        };

        let outcome = attempt_search(session.surface.as_ref(), &page, &scoped_query, session.oracle.as_deref()).await;
        let _ = session.surface.close_tab(&page).await;

        match outcome {
            AttemptOutcome::Success(result) => {
                session.record_step(step_label, result);
                return true;
            }
            AttemptOutcome::Captcha(url) => {
                captcha_urls.push(url.clone());
                session.record_step(step_label, TaskResult::captcha_detected("fallback attempt hit a challenge", url));
            }
            AttemptOutcome::Failed(result) => {
                session.record_step(step_label, result);
            }
        }
    }

    false
}

async fn attempt_search(
    surface: &dyn BrowserSurface,
    page: &PageHandle,
    query_text: &str,
    oracle: Option<&dyn ReasoningOracle>,
) -> AttemptOutcome {
    if let Err(err) = surface.goto(page, DEFAULT_ENGINE_URL, Duration::from_secs(30)).await {
        return AttemptOutcome::Failed(TaskResult::failure(
            "failed to reach the default search engine",
            TaskResultData::empty(),
            err.to_string(),
        ));
    }

    let field = match util::find_first(
        surface,
        page,
        util::DEFAULT_ENGINE_SEARCH_FIELD_SELECTORS,
        SEARCH_FIELD_TIMEOUT,
        SEARCH_FIELD_RETRIES,
    )
    .await
    {
        Ok(field) => field,
        Err(err) => {
            return AttemptOutcome::Failed(TaskResult::failure(
                "search field never became ready",
                TaskResultData::empty(),
                err.to_string(),
            ))
        }
    };

    if let Err(err) = surface.fill(&field, query_text).await {
        return AttemptOutcome::Failed(TaskResult::failure("failed to fill search field", TaskResultData::empty(), err.to_string()));
    }
    if let Err(err) = surface.press(&field, "Enter").await {
        return AttemptOutcome::Failed(TaskResult::failure(
            "failed to submit search field",
            TaskResultData::empty(),
            err.to_string(),
        ));
    }

    util::wait_for_settle(surface, page, SETTLE_TIMEOUT).await;

    if challenge_detector::has_challenge(surface, page).await {
        let url = surface.current_url(page).await.unwrap_or_default();
        return AttemptOutcome::Captcha(url);
    }

    let entries = match result_reader::read(surface, page, Some(5)).await {
        Ok(entries) => entries,
        Err(err) => {
            return AttemptOutcome::Failed(TaskResult::failure(
                "failed to read search results",
                TaskResultData::empty(),
                err.to_string(),
            ))
        }
    };

    if entries.is_empty() {
        return AttemptOutcome::Failed(TaskResult::failure(
            "search returned no results",
            TaskResultData::empty(),
            "NoResults",
        ));
    }

    let enriched = enrich_top_results(surface, &entries, oracle).await;

    let mut data = TaskResultData::new("", page_url(surface, page).await)
        .with_extra("results", convert::result_entries_to_extra(&entries))
        .with_extra("enriched", Value::Array(enriched.iter().map(|(_, v)| v.clone()).collect()));

    if let Some(oracle) = oracle {
        let summary_input: Vec<String> = enriched.iter().map(|(snippet, _)| snippet.clone()).collect();
        if !summary_input.is_empty() {
            let prompt = format!(
                "Synthesise a brief comprehensive summary across these search results:\n{}",
                summary_input.join("\n---\n")
            );
            if let Ok(summary) = oracle.generate_text(&prompt).await {
                data = data.with_extra("comprehensive_summary", summary);
            }
        }
    }

    AttemptOutcome::Success(TaskResult::success(format!("found {} results", entries.len()), data))
}

async fn page_url(surface: &dyn BrowserSurface, page: &PageHandle) -> String {
    surface.current_url(page).await.unwrap_or_default()
}

/// Visits each of the top `ENRICH_COUNT` results in a new tab, extracts
/// it, and closes the tab — the results page itself is never navigated
/// away from.
async fn enrich_top_results(
    surface: &dyn BrowserSurface,
    entries: &[ResultEntry],
    oracle: Option<&dyn ReasoningOracle>,
) -> Vec<(String, Value)> {
    let mut enriched = Vec::new();
    for entry in entries.iter().take(ENRICH_COUNT) {
        let page = match surface.new_tab(&entry.url).await {
            Ok(page) => page,
            Err(err) => {
                tracing::debug!(%err, url = %entry.url, "failed to open enrichment tab");
                continue;
            }
        };

        let extracted = tokio::time::timeout(DETAIL_TIMEOUT, content_extractor::extract(surface, &page, oracle)).await;
        let _ = surface.close_tab(&page).await;

        match extracted {
            Ok(Ok(report)) => {
                let snippet = report.summary.clone().unwrap_or_else(|| report.content_preview.clone());
                enriched.push((snippet, serde_json::to_value(&report).unwrap_or_default()));
            }
            Ok(Err(err)) => tracing::debug!(%err, url = %entry.url, "enrichment extraction failed"),
            Err(_) => tracing::debug!(url = %entry.url, "enrichment extraction timed out"),
        }
    }
    enriched
}
