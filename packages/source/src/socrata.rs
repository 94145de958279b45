//! Socrata SODA API fetcher.
//!
//! Pages through a dataset with `$limit` and `$offset`, optionally
//! restricted by `$where`. Every request carries an `$order` so offset
//! paging is stable. Used for every SF dataset in the registry.

use std::future::Future;

use parcel_distress_source_models::RawRecord;

use crate::SourceError;

/// `$order` used when a dataset configures none. `:id` is the Socrata row
/// identifier, present on every dataset.
pub const DEFAULT_ORDER: &str = ":id";

/// Query parameters for one page request.
pub type PageQuery = Vec<(&'static str, String)>;

/// Configuration for a Socrata fetch operation.
pub struct SocrataConfig<'a> {
    /// Resource URL (e.g., `"https://data.sfgov.org/resource/nbtm-fbw5.json"`).
    pub api_url: &'a str,
    /// Label for log messages.
    pub label: &'a str,
    /// Page size for pagination.
    pub page_size: u64,
    /// Maximum total records. `None` fetches until a short page.
    pub limit: Option<u64>,
    /// `$order` clause. Defaults to [`DEFAULT_ORDER`].
    pub order: Option<&'a str>,
    /// Optional `$where` clause.
    pub where_clause: Option<&'a str>,
}

/// Fetches records from a Socrata dataset, page by page.
///
/// Rows that are not JSON objects are dropped with a warning.
///
/// # Errors
///
/// Returns [`SourceError`] if a request fails, returns a non-success
/// status, or the body is not a JSON array.
pub async fn fetch_socrata(
    client: &reqwest::Client,
    config: &SocrataConfig<'_>,
) -> Result<Vec<RawRecord>, SourceError> {
    paginate(config, |query| async move {
        let response = client
            .get(config.api_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&query)
            .send()
            .await?
            .error_for_status()?;
        let body: serde_json::Value = response.json().await?;
        into_records(body, config.label)
    })
    .await
}

/// Builds the query for the page starting at `offset`.
#[must_use]
pub fn page_query(config: &SocrataConfig<'_>, offset: u64, page_limit: u64) -> PageQuery {
    let mut query: PageQuery = vec![
        ("$limit", page_limit.to_string()),
        ("$offset", offset.to_string()),
        ("$order", config.order.unwrap_or(DEFAULT_ORDER).to_string()),
    ];
    if let Some(where_clause) = config.where_clause {
        query.push(("$where", where_clause.to_string()));
    }
    query
}

/// Drives the `$limit`/`$offset` loop, calling `fetch_page` once per page.
///
/// Stops at the configured limit, on an empty page, or on a page shorter
/// than requested.
///
/// # Errors
///
/// Returns the first error from `fetch_page`.
pub async fn paginate<F, Fut>(
    config: &SocrataConfig<'_>,
    mut fetch_page: F,
) -> Result<Vec<RawRecord>, SourceError>
where
    F: FnMut(PageQuery) -> Fut,
    Fut: Future<Output = Result<Vec<RawRecord>, SourceError>>,
{
    let mut all_records: Vec<RawRecord> = Vec::new();
    let mut offset: u64 = 0;
    let fetch_limit = config.limit.unwrap_or(u64::MAX);
    let page_size = config.page_size.max(1);

    loop {
        let remaining = fetch_limit.saturating_sub(offset);
        if remaining == 0 {
            break;
        }
        let page_limit = remaining.min(page_size);

        log::info!(
            "Fetching {} data: offset={offset}, limit={page_limit}",
            config.label
        );
        let page = fetch_page(page_query(config, offset, page_limit)).await?;
        let count = page.len() as u64;
        if count == 0 {
            break;
        }

        all_records.extend(page);
        offset += count;

        if count < page_limit {
            break;
        }
    }

    log::info!(
        "Downloaded {} {} records total",
        all_records.len(),
        config.label
    );

    Ok(all_records)
}

/// Splits a SODA response body into object rows.
fn into_records(body: serde_json::Value, label: &str) -> Result<Vec<RawRecord>, SourceError> {
    let serde_json::Value::Array(rows) = body else {
        return Err(SourceError::UnexpectedResponse {
            dataset: label.to_string(),
            message: "expected a JSON array of records".to_string(),
        });
    };

    let total = rows.len();
    let records: Vec<RawRecord> = rows
        .into_iter()
        .filter_map(|row| match row {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    if records.len() < total {
        log::warn!(
            "{label}: dropped {} non-object rows",
            total - records.len()
        );
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    fn config(limit: Option<u64>) -> SocrataConfig<'static> {
        SocrataConfig {
            api_url: "http://localhost/resource/test.json",
            label: "test",
            page_size: 2,
            limit,
            order: None,
            where_clause: None,
        }
    }

    fn page(n: usize) -> Vec<RawRecord> {
        (0..n)
            .map(|i| {
                serde_json::json!({"block": i.to_string()})
                    .as_object()
                    .cloned()
                    .unwrap()
            })
            .collect()
    }

    fn param<'a>(query: &'a PageQuery, name: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Runs [`paginate`] against canned pages, returning the rows and the
    /// queries that were sent.
    async fn run(
        config: &SocrataConfig<'_>,
        pages: Vec<Vec<RawRecord>>,
    ) -> (Vec<RawRecord>, Vec<PageQuery>) {
        let mut pages: VecDeque<Vec<RawRecord>> = pages.into();
        let mut sent: Vec<PageQuery> = Vec::new();
        let records = paginate(config, |query| {
            sent.push(query);
            let page = pages.pop_front().unwrap_or_default();
            async move { Ok(page) }
        })
        .await
        .unwrap();
        (records, sent)
    }

    #[tokio::test]
    async fn stops_on_a_short_page() {
        let (records, sent) = run(&config(None), vec![page(2), page(1), page(2)]).await;
        assert_eq!(records.len(), 3);
        assert_eq!(sent.len(), 2);
        assert_eq!(param(&sent[1], "$offset"), Some("2"));
    }

    #[tokio::test]
    async fn stops_on_an_empty_page() {
        let (records, sent) = run(&config(None), vec![page(2), page(0)]).await;
        assert_eq!(records.len(), 2);
        assert_eq!(sent.len(), 2);
    }

    #[tokio::test]
    async fn limit_caps_the_last_page() {
        let (records, sent) = run(&config(Some(3)), vec![page(2), page(1), page(2)]).await;
        assert_eq!(records.len(), 3);
        assert_eq!(sent.len(), 2);
        assert_eq!(param(&sent[0], "$limit"), Some("2"));
        assert_eq!(param(&sent[1], "$limit"), Some("1"));
        assert_eq!(param(&sent[1], "$offset"), Some("2"));
    }

    #[tokio::test]
    async fn every_page_is_ordered() {
        let (_, sent) = run(&config(None), vec![page(2), page(2), page(0)]).await;
        assert_eq!(sent.len(), 3);
        for query in &sent {
            assert_eq!(param(query, "$order"), Some(DEFAULT_ORDER));
            assert_eq!(param(query, "$where"), None);
        }
    }

    #[test]
    fn configured_order_and_where_are_passed_through() {
        let config = SocrataConfig {
            order: Some("date_filed DESC"),
            where_clause: Some("date_filed >= '2022-01-01T00:00:00'"),
            ..config(None)
        };
        let query = page_query(&config, 4, 2);
        assert_eq!(param(&query, "$order"), Some("date_filed DESC"));
        assert_eq!(
            param(&query, "$where"),
            Some("date_filed >= '2022-01-01T00:00:00'")
        );
        assert_eq!(param(&query, "$offset"), Some("4"));
    }

    #[test]
    fn keeps_object_rows_only() {
        let body = serde_json::json!([{"block": "1"}, 42, null, {"lot": "2"}]);
        let records = into_records(body, "test").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["lot"], "2");
    }

    #[test]
    fn rejects_non_array_body() {
        let body = serde_json::json!({"error": true, "message": "bad query"});
        assert!(matches!(
            into_records(body, "test"),
            Err(SourceError::UnexpectedResponse { .. })
        ));
    }
}
