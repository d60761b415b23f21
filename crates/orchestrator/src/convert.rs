//! Converts typed Content Extractor / Result Reader output into the
//! `TaskResult` shape the step trace carries (§9's "free-form result
//! maps" redesign: typed fields stay typed, everything else rides in
//! `extras`).

use taskbrowser_core_types::{PageReport, ResultEntry, TaskResult, TaskResultData};

pub fn page_report_to_task_result(report: &PageReport) -> TaskResult {
    let mut data = TaskResultData::new(report.title.clone(), report.url.clone());
    data = data
        .with_extra("content_preview", report.content_preview.clone())
        .with_extra("meta_description", report.meta_description.clone())
        .with_extra("content_length", report.content_length as u64)
        .with_extra("key_points", serde_json::to_value(&report.key_points).unwrap_or_default())
        .with_extra("headings", serde_json::to_value(&report.headings).unwrap_or_default())
        .with_extra("issues", serde_json::to_value(&report.issues).unwrap_or_default());

    if let Some(date) = &report.publication_date {
        data = data.with_extra("publication_date", date.clone());
    }
    if let Some(author) = &report.author {
        data = data.with_extra("author", author.clone());
    }
    if let Some(summary) = &report.summary {
        data = data.with_extra("summary", summary.clone());
    }
    if let Some(infobox) = &report.infobox {
        data = data.with_extra("infobox", serde_json::to_value(infobox).unwrap_or_default());
    }
    if let Some(toc) = &report.table_of_contents {
        data = data.with_extra("table_of_contents", serde_json::to_value(toc).unwrap_or_default());
    }
    if let Some(paragraphs) = &report.key_paragraphs {
        data = data.with_extra("key_paragraphs", serde_json::to_value(paragraphs).unwrap_or_default());
    }

    TaskResult::success("page extracted", data)
}

pub fn result_entries_to_extra(entries: &[ResultEntry]) -> serde_json::Value {
    serde_json::to_value(entries).unwrap_or_default()
}

/// Rebuilds `result` with one more key merged into `data.extras`,
/// preserving its success/error shape. Used to attach enrichment
/// (`detailed_results`, `comprehensive_summary`) onto a result that was
/// already finalised from a `PageReport`.
pub fn with_extra(result: TaskResult, key: impl Into<String>, value: serde_json::Value) -> TaskResult {
    let data = result.data.with_extra(key, value);
    match result.error {
        Some(error) => TaskResult::failure(result.message, data, error),
        None => TaskResult::success(result.message, data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskbrowser_core_types::Headings;

    #[test]
    fn clean_report_is_successful() {
        let report = PageReport {
            title: "Example".to_string(),
            url: "https://example.com".to_string(),
            content_preview: String::new(),
            meta_description: String::new(),
            headings: Headings::default(),
            publication_date: None,
            author: None,
            key_points: vec![],
            summary: None,
            infobox: None,
            table_of_contents: None,
            key_paragraphs: None,
            issues: vec![],
            content_length: 0,
        };
        let result = page_report_to_task_result(&report);
        assert!(result.success);
        assert!(result.error.is_none());
    }

    #[test]
    fn report_with_issues_still_succeeds() {
        let report = PageReport {
            title: "Example".to_string(),
            url: "https://example.com".to_string(),
            content_preview: String::new(),
            meta_description: String::new(),
            headings: Headings::default(),
            publication_date: None,
            author: None,
            key_points: vec![],
            summary: None,
            infobox: None,
            table_of_contents: None,
            key_paragraphs: None,
            issues: vec!["page text mentions '404'".to_string()],
            content_length: 0,
        };
        let result = page_report_to_task_result(&report);
        assert!(result.success);
        assert!(result.error.is_none());
        let issues = result.data.get_extra("issues").cloned().unwrap_or_default();
        assert_eq!(issues, serde_json::json!(["page text mentions '404'"]));
    }
}
