//! `OpenUrl` dispatch (§4.8): navigate, handle a challenge if one shows
//! up, then either extract the landing page or — when the query carries
//! both a known site mention and search intent — drive an in-site search
//! first.

use std::time::Duration;

use captcha_controller::WaitOutcome;
use serde_json::Value;
use taskbrowser_core_types::{Query, TaskResult, TaskResultData};

use crate::session::AgentSession;
use crate::{captcha, convert, residual, util};

const NAV_TIMEOUT: Duration = Duration::from_secs(30);
const IN_SITE_SEARCH_FIELD_TIMEOUT: Duration = Duration::from_secs(15);
const IN_SITE_SEARCH_FIELD_RETRIES: u32 = 3;
const SETTLE_TIMEOUT: Duration = Duration::from_secs(15);
const WIKI_DETAIL_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_WIKI_ARTICLES: usize = 3;

pub async fn dispatch(session: &mut AgentSession, target: &str, query: &Query) {
    let nav = session.surface.goto(&session.active_page, target, NAV_TIMEOUT).await;
    match nav {
        Err(err) => {
            session.record_step(
                "open_url",
                TaskResult::failure(
                    format!("navigation to {target} failed"),
                    TaskResultData::new("", target),
                    err.to_string(),
                ),
            );
        }
        Ok(()) => {
            if challenge_detector::has_challenge(session.surface.as_ref(), &session.active_page).await {
                captcha::enter_paused(session, "open_url").await;
                if matches!(captcha::wait_for_clearance(session).await, WaitOutcome::Resolved) {
                    extract_and_maybe_in_site_search(session, query).await;
                }
            } else {
                extract_and_maybe_in_site_search(session, query).await;
            }
        }
    }
}

async fn extract_and_maybe_in_site_search(session: &mut AgentSession, query: &Query) {
    let landing = extract_current_page(session).await;
    session.record_step("extract", landing);

    let lower = query.lower();
    if !(residual::mentions_known_site(&lower) && residual::has_search_intent(&lower)) {
        return;
    }

    let residual_terms = residual::residual_terms(&lower);
    if residual_terms.chars().count() <= residual::MIN_RESIDUAL_CHARS {
        tracing::debug!("residual search terms too short, keeping landing page extraction");
        return;
    }

    in_site_search(session, &residual_terms).await;
}

async fn extract_current_page(session: &mut AgentSession) -> TaskResult {
    match content_extractor::extract(session.surface.as_ref(), &session.active_page, session.oracle.as_deref()).await {
        Ok(report) => convert::page_report_to_task_result(&report),
        Err(err) => TaskResult::failure("page extraction failed", TaskResultData::empty(), err.to_string()),
    }
}

async fn in_site_search(session: &mut AgentSession, residual_terms: &str) {
    let field = util::find_first(
        session.surface.as_ref(),
        &session.active_page,
        util::IN_SITE_SEARCH_FIELD_SELECTORS,
        IN_SITE_SEARCH_FIELD_TIMEOUT,
        IN_SITE_SEARCH_FIELD_RETRIES,
    )
    .await;

    let field = match field {
        Ok(field) => field,
        Err(err) => {
            session.record_step(
                "in_site_search",
                TaskResult::failure("no search field found on site", TaskResultData::empty(), err.to_string()),
            );
            return;
        }
    };

    if let Err(err) = session.surface.fill(&field, residual_terms).await {
        session.record_step(
            "in_site_search",
            TaskResult::failure("failed to fill search field", TaskResultData::empty(), err.to_string()),
        );
        return;
    }
    if let Err(err) = session.surface.press(&field, "Enter").await {
        session.record_step(
            "in_site_search",
            TaskResult::failure("failed to submit search field", TaskResultData::empty(), err.to_string()),
        );
        return;
    }

    util::wait_for_settle(session.surface.as_ref(), &session.active_page, SETTLE_TIMEOUT).await;

    if challenge_detector::has_challenge(session.surface.as_ref(), &session.active_page).await {
        captcha::enter_paused(session, "in_site_search").await;
        if !matches!(captcha::wait_for_clearance(session).await, WaitOutcome::Resolved) {
            return;
        }
    }

    let mut result = extract_current_page(session).await;

    let current_url = session.surface.current_url(&session.active_page).await.unwrap_or_default();
    if current_url.contains("wikipedia.org") {
        let detailed = collect_wikipedia_detail(session).await;
        if !detailed.is_empty() {
            result = convert::with_extra(result, "detailed_results", Value::Array(detailed));
        }
    }

    session.record_step("in_site_search", result);
}

async fn collect_wikipedia_detail(session: &mut AgentSession) -> Vec<Value> {
    let links = match top_article_links(session).await {
        Ok(links) => links,
        Err(err) => {
            tracing::debug!(%err, "failed to collect wikipedia article links");
            return Vec::new();
        }
    };

    let mut detailed = Vec::new();
    for link in links.into_iter().take(MAX_WIKI_ARTICLES) {
        let oracle = session.oracle.clone();
        let outcome = session
            .with_fresh_tab(&link, move |surface, page| async move {
                match tokio::time::timeout(
                    WIKI_DETAIL_TIMEOUT,
                    content_extractor::extract(surface.as_ref(), &page, oracle.as_deref()),
                )
                .await
                {
                    Ok(inner) => inner,
                    Err(_) => Err(cdp_surface::SurfaceError::new(cdp_surface::SurfaceErrorKind::EvalFailed)
                        .with_hint("detail extraction timed out")),
                }
            })
            .await;

        match outcome {
            Ok(report) => detailed.push(serde_json::to_value(&report).unwrap_or_default()),
            Err(err) => tracing::debug!(%err, %link, "wikipedia article extraction failed"),
        }
    }
    detailed
}

async fn top_article_links(session: &AgentSession) -> Result<Vec<String>, cdp_surface::SurfaceError> {
    const SCRIPT: &str = r#"(() => {
        const fromSearch = Array.from(document.querySelectorAll('.mw-search-result-heading a'))
            .map((a) => a.href);
        if (fromSearch.length > 0) return fromSearch.slice(0, 3);
        return Array.from(document.querySelectorAll('#mw-content-text a[href^="/wiki/"]'))
            .map((a) => a.href)
            .filter((h) => !h.includes(':'))
            .slice(0, 3);
    })()"#;

    let value = session.surface.eval(&session.active_page, SCRIPT).await?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}
