//! Lazy iteration over paginated list endpoints.
//!
//! Two layers, both driven by the caller:
//!
//! - [`Pager`] fetches one page per [`Pager::next_page`] call.
//! - [`unpaginate`] / [`unpaginate_offset`] flatten a pager into a record
//!   [`Stream`]. A page is requested only after every record of the previous
//!   page has been yielded, so dropping the stream stops all further requests.
//!
//! Nothing here retries. A transport error ends the stream after being
//! yielded once.

use crate::error::{HttpError, SdkError};
use crate::transport::{QueryParams, Transport};
use async_stream::try_stream;
use futures_util::{Stream, TryStreamExt};
use serde_json::Value;

/// Wire-level page size used when the caller asks for "everything" (`limit=0`).
pub const DEFAULT_BATCH_SIZE: u32 = 100;

const RECORDS_KEY: &str = "data";
const NEXT_KEY: &str = "next";

/// Where the next page comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// Server-supplied link, requested verbatim.
    Url(String),
    /// Client-computed window for endpoints without `next` links.
    Offset { offset: u64, limit: u32 },
}

/// One decoded page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub records: Vec<Value>,
    pub next: Option<String>,
}

impl Page {
    /// Decode a list response: `{"data": [...], "next": url|null}`, or a bare
    /// array for endpoints that return everything at once.
    pub fn from_response(response: Value) -> Result<Page, HttpError> {
        match response {
            Value::Array(records) => Ok(Page {
                records,
                next: None,
            }),
            Value::Object(mut map) => {
                let records = match map.remove(RECORDS_KEY) {
                    Some(Value::Array(records)) => records,
                    _ => {
                        return Err(HttpError::UnexpectedResponse(format!(
                            "list response has no `{}` array",
                            RECORDS_KEY
                        )))
                    }
                };
                let next = match map.remove(NEXT_KEY) {
                    Some(Value::String(url)) if !url.is_empty() => Some(url),
                    _ => None,
                };
                Ok(Page { records, next })
            }
            other => Err(HttpError::UnexpectedResponse(format!(
                "expected a list response, got {}",
                other
            ))),
        }
    }
}

// ─── Pager ───────────────────────────────────────────────────────────────────

/// Manual page-by-page pagination.
///
/// ```rust,ignore
/// let mut pager = Pager::new(&transport, "projects/", vec![]);
/// while let Some(records) = pager.next_page().await? {
///     println!("got {} records", records.len());
/// }
/// ```
pub struct Pager<'a> {
    transport: &'a dyn Transport,
    url: String,
    params: QueryParams,
    cursor: Option<PageCursor>,
}

impl<'a> Pager<'a> {
    /// Follow server `next` links starting from `url`. `params` are sent with
    /// the first request only.
    pub fn new(transport: &'a dyn Transport, url: &str, params: QueryParams) -> Self {
        Self {
            transport,
            url: url.to_string(),
            params: substitute_unlimited(params),
            cursor: Some(PageCursor::Url(url.to_string())),
        }
    }

    /// Page with explicit `offset`/`limit` query parameters. `params` are sent
    /// with every request. Stops after the first short page.
    pub fn offset(
        transport: &'a dyn Transport,
        url: &str,
        params: QueryParams,
        batch_size: u32,
    ) -> Self {
        let limit = if batch_size == 0 {
            DEFAULT_BATCH_SIZE
        } else {
            batch_size
        };
        Self {
            transport,
            url: url.to_string(),
            params: params
                .into_iter()
                .filter(|(k, _)| k != "offset" && k != "limit")
                .collect(),
            cursor: Some(PageCursor::Offset { offset: 0, limit }),
        }
    }

    /// Fetch the next page.
    ///
    /// `Ok(Some(records))` while pages remain, `Ok(None)` once the server has
    /// reported the end. On error the pager is left exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>, SdkError> {
        let Some(cursor) = self.cursor.take() else {
            return Ok(None);
        };

        match cursor {
            PageCursor::Url(url) => {
                let params = std::mem::take(&mut self.params);
                tracing::debug!(url = %url, "Fetching page");
                let page = Page::from_response(self.transport.get_json(&url, &params).await?)?;
                self.cursor = page.next.map(PageCursor::Url);
                Ok(Some(page.records))
            }
            PageCursor::Offset { offset, limit } => {
                let mut params = self.params.clone();
                params.push(("offset".to_string(), offset.to_string()));
                params.push(("limit".to_string(), limit.to_string()));
                tracing::debug!(url = %self.url, offset, limit, "Fetching page");
                let page =
                    Page::from_response(self.transport.get_json(&self.url, &params).await?)?;
                let fetched = page.records.len() as u64;
                if fetched >= u64::from(limit) {
                    self.cursor = Some(PageCursor::Offset {
                        offset: offset + fetched,
                        limit,
                    });
                }
                Ok(Some(page.records))
            }
        }
    }

    /// The request the next [`Pager::next_page`] call will make.
    pub fn current_cursor(&self) -> Option<&PageCursor> {
        self.cursor.as_ref()
    }

    pub fn is_done(&self) -> bool {
        self.cursor.is_none()
    }
}

/// `limit=0` means "no limit" to the caller but is not a valid page size.
fn substitute_unlimited(params: QueryParams) -> QueryParams {
    params
        .into_iter()
        .map(|(k, v)| {
            if k == "limit" && v == "0" {
                (k, DEFAULT_BATCH_SIZE.to_string())
            } else {
                (k, v)
            }
        })
        .collect()
}

// ─── Streams ─────────────────────────────────────────────────────────────────

fn flatten(mut pager: Pager<'_>) -> impl Stream<Item = Result<Value, SdkError>> + Send + '_ {
    try_stream! {
        while let Some(records) = pager.next_page().await? {
            for record in records {
                yield record;
            }
        }
    }
}

/// Walk a `next`-linked list endpoint, yielding records in server order.
pub fn unpaginate<'a>(
    transport: &'a dyn Transport,
    initial_url: &str,
    params: QueryParams,
) -> impl Stream<Item = Result<Value, SdkError>> + Send + 'a {
    flatten(Pager::new(transport, initial_url, params))
}

/// Walk an offset/limit list endpoint, yielding records in server order.
pub fn unpaginate_offset<'a>(
    transport: &'a dyn Transport,
    url: &str,
    params: QueryParams,
    batch_size: u32,
) -> impl Stream<Item = Result<Value, SdkError>> + Send + 'a {
    flatten(Pager::offset(transport, url, params, batch_size))
}

/// Drain a record stream into a `Vec`, stopping at the first error.
pub async fn collect_all<S, T>(stream: S) -> Result<Vec<T>, SdkError>
where
    S: Stream<Item = Result<T, SdkError>>,
{
    stream.try_collect().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::StatusPoll;
    use async_trait::async_trait;
    use futures_util::{pin_mut, StreamExt};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Serves canned responses in order and records every request.
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<Value, HttpError>>>,
        requests: Mutex<Vec<(String, QueryParams)>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<Value, HttpError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<(String, QueryParams)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get_json(
            &self,
            url: &str,
            params: &[(String, String)],
        ) -> Result<Value, HttpError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), params.to_vec()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected extra request")
        }

        async fn post_json(&self, _url: &str, _body: &Value) -> Result<Value, HttpError> {
            unimplemented!()
        }

        async fn post_for_location(&self, _url: &str, _body: &Value) -> Result<String, HttpError> {
            unimplemented!()
        }

        async fn poll_status(&self, _url: &str) -> Result<StatusPoll, HttpError> {
            unimplemented!()
        }
    }

    fn three_pages() -> Vec<Result<Value, HttpError>> {
        vec![
            Ok(json!({"data": [{"id": 1}, {"id": 2}], "next": "https://api.test/items/?page=2"})),
            Ok(json!({"data": [{"id": 3}, {"id": 4}], "next": "https://api.test/items/?page=3"})),
            Ok(json!({"data": [{"id": 5}, {"id": 6}], "next": null})),
        ]
    }

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_three_pages_yield_six_records_in_order() {
        let transport = ScriptedTransport::new(three_pages());
        let records = collect_all(unpaginate(&transport, "items/", params(&[("limit", "2")])))
            .await
            .unwrap();

        let ids: Vec<_> = records.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, [1, 2, 3, 4, 5, 6]);

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0], ("items/".to_string(), params(&[("limit", "2")])));
        // Follow-up pages use the server link verbatim, without the initial params.
        assert_eq!(requests[1], ("https://api.test/items/?page=2".to_string(), vec![]));
        assert_eq!(requests[2], ("https://api.test/items/?page=3".to_string(), vec![]));
    }

    #[tokio::test]
    async fn test_limit_zero_uses_default_batch_size() {
        let transport = ScriptedTransport::new(vec![Ok(json!({"data": [], "next": null}))]);
        let records = collect_all(unpaginate(&transport, "items/", params(&[("limit", "0")])))
            .await
            .unwrap();
        assert!(records.is_empty());
        assert_eq!(transport.requests()[0].1, params(&[("limit", "100")]));
    }

    #[tokio::test]
    async fn test_no_prefetch() {
        let transport = ScriptedTransport::new(three_pages());
        let stream = unpaginate(&transport, "items/", vec![]);
        pin_mut!(stream);

        stream.next().await.unwrap().unwrap();
        stream.next().await.unwrap().unwrap();
        assert_eq!(transport.requests().len(), 1);

        stream.next().await.unwrap().unwrap();
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_propagates_after_earlier_records() {
        let transport = ScriptedTransport::new(vec![
            Ok(json!({"data": [{"id": 1}], "next": "https://api.test/items/?page=2"})),
            Err(HttpError::ServerError {
                status: 503,
                body: "unavailable".into(),
            }),
        ]);
        let stream = unpaginate(&transport, "items/", vec![]);
        pin_mut!(stream);

        assert_eq!(stream.next().await.unwrap().unwrap(), json!({"id": 1}));
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            SdkError::Http(HttpError::ServerError { status: 503, .. })
        ));
        assert!(stream.next().await.is_none());
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_data_key_is_unexpected_response() {
        let transport = ScriptedTransport::new(vec![Ok(json!({"items": []}))]);
        let err = collect_all(unpaginate(&transport, "items/", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SdkError::Http(HttpError::UnexpectedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_bare_array_response_is_single_page() {
        let transport = ScriptedTransport::new(vec![Ok(json!([{"id": 1}, {"id": 2}]))]);
        let records = collect_all(unpaginate(&transport, "items/", vec![]))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_pager_tracks_cursor() {
        let transport = ScriptedTransport::new(three_pages());
        let mut pager = Pager::new(&transport, "items/", vec![]);
        assert_eq!(
            pager.current_cursor(),
            Some(&PageCursor::Url("items/".to_string()))
        );

        let first = pager.next_page().await.unwrap().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(
            pager.current_cursor(),
            Some(&PageCursor::Url("https://api.test/items/?page=2".to_string()))
        );

        pager.next_page().await.unwrap();
        pager.next_page().await.unwrap();
        assert!(pager.is_done());
        assert_eq!(pager.next_page().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_offset_paging_stops_on_short_page() {
        let transport = ScriptedTransport::new(vec![
            Ok(json!({"data": [{"id": 1}, {"id": 2}]})),
            Ok(json!({"data": [{"id": 3}]})),
        ]);
        let records = collect_all(unpaginate_offset(
            &transport,
            "projects/p1/models/",
            params(&[("orderBy", "metric"), ("offset", "50")]),
            2,
        ))
        .await
        .unwrap();
        assert_eq!(records.len(), 3);

        let requests = transport.requests();
        assert_eq!(
            requests[0].1,
            params(&[("orderBy", "metric"), ("offset", "0"), ("limit", "2")])
        );
        assert_eq!(
            requests[1].1,
            params(&[("orderBy", "metric"), ("offset", "2"), ("limit", "2")])
        );
    }
}
