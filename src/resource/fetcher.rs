//! Resource Fetcher
//!
//! Reconciles the three ways a `get-all` can be satisfied into one result
//! sequence:
//! - ReturnAll: drain every page, in order
//! - Cursor: one page, exposing the remote's continuation token
//! - Offset/Page: one page, truncated to `limit`
//!
//! Pages are fetched strictly one after another.

use super::builder::{RequestParameters, MAX_PAGE_SIZE};
use super::dispatch::{shape_request, Dispatcher, ResultSequence};
use super::json_path::get_path;
use super::registry::{OperationDef, PaginationStyle, ResponseShape};
use super::types::ResourceType;
use crate::error::DispatchError;
use futures::stream::{self, TryStreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page size used while draining in ReturnAll mode
pub const RETURN_ALL_PAGE_SIZE: u32 = 25;

/// Upper bound on pages fetched by one ReturnAll call
pub const MAX_PAGES: u32 = 1000;

/// Tuning for ReturnAll draining
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingLimits {
    pub return_all_page_size: u32,
    pub max_pages: u32,
}

impl Default for PagingLimits {
    fn default() -> Self {
        Self {
            return_all_page_size: RETURN_ALL_PAGE_SIZE,
            max_pages: MAX_PAGES,
        }
    }
}

/// Position of one page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    Offset { page: u32, size: u32, offset: u32 },
    Token(String),
    None,
}

/// Pagination mode of one `get-all` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageMode {
    ReturnAll,
    Cursor(String),
    Offset { page: u32, offset: u32, limit: u32 },
}

impl PageMode {
    /// `returnAll` wins; a cursor endpoint or a supplied cursor selects Cursor
    pub fn select(def: &OperationDef, params: &RequestParameters) -> Self {
        if params.return_all {
            PageMode::ReturnAll
        } else if def.pagination == PaginationStyle::Cursor || !params.cursor.is_empty() {
            PageMode::Cursor(params.cursor.clone())
        } else {
            PageMode::Offset {
                page: params.page,
                offset: params.offset,
                limit: params.limit,
            }
        }
    }
}

/// One page as returned by the remote
#[derive(Debug, Clone, Default)]
struct Page {
    items: Vec<Value>,
    next_cursor: Option<String>,
    last: Option<bool>,
    number: Option<u64>,
    total_pages: Option<u64>,
}

/// Fetch the records of a `get-all` call
pub async fn fetch_resources(
    dispatcher: &Dispatcher,
    def: &OperationDef,
    params: &RequestParameters,
) -> Result<ResultSequence, DispatchError> {
    let mode = PageMode::select(def, params);
    tracing::debug!("get-all {} in mode {:?}", params.resource, mode);

    match mode {
        PageMode::ReturnAll => {
            let records = fetch_all_pages(dispatcher, def, params).await?;
            Ok(ResultSequence {
                records,
                next_cursor: None,
            })
        },
        PageMode::Cursor(token) => {
            let page = fetch_page(dispatcher, def, params, &PageCursor::Token(token)).await?;
            Ok(ResultSequence {
                records: page.items,
                next_cursor: page.next_cursor,
            })
        },
        PageMode::Offset {
            page,
            offset,
            limit,
        } => {
            let cursor = match def.pagination {
                PaginationStyle::None => PageCursor::None,
                _ => PageCursor::Offset {
                    page,
                    size: limit,
                    offset,
                },
            };
            let mut result = fetch_page(dispatcher, def, params, &cursor).await?;
            result.items.truncate(limit as usize);
            Ok(ResultSequence {
                records: result.items,
                next_cursor: None,
            })
        },
    }
}

/// Drain every page (auto-paginate)
async fn fetch_all_pages(
    dispatcher: &Dispatcher,
    def: &OperationDef,
    params: &RequestParameters,
) -> Result<Vec<Value>, DispatchError> {
    let limits = dispatcher.limits();
    let page_size = limits.return_all_page_size.clamp(1, MAX_PAGE_SIZE);
    let resource = params.resource;

    let first = match def.pagination {
        PaginationStyle::Page => PageCursor::Offset {
            page: 0,
            size: page_size,
            offset: 0,
        },
        PaginationStyle::Cursor => PageCursor::Token(String::new()),
        PaginationStyle::None => PageCursor::None,
    };

    let pages = stream::try_unfold((Some(first), 0u32), |(cursor, fetched)| async move {
        let Some(cursor) = cursor else {
            return Ok::<_, DispatchError>(None);
        };
        if fetched >= limits.max_pages {
            return Err(DispatchError::PaginationExhaustion {
                resource,
                reason: format!("no final page after {} pages", fetched),
            });
        }

        let page = fetch_page(dispatcher, def, params, &cursor).await?;
        tracing::debug!("{} page {}: {} records", resource, fetched, page.items.len());

        let next = next_cursor(resource, &cursor, &page, page_size)?;
        Ok(Some((page.items, (next, fetched + 1))))
    });

    pages.try_concat().await
}

/// Decide where the next page starts, or `None` when the listing is done
fn next_cursor(
    resource: ResourceType,
    current: &PageCursor,
    page: &Page,
    page_size: u32,
) -> Result<Option<PageCursor>, DispatchError> {
    match current {
        PageCursor::Offset {
            page: number,
            size,
            offset,
        } => {
            if let Some(reported) = page.number {
                if reported != u64::from(*number) {
                    return Err(DispatchError::PaginationExhaustion {
                        resource,
                        reason: format!("requested page {} but remote returned page {}", number, reported),
                    });
                }
            }
            let exhausted = page.items.len() < page_size as usize
                || page.last == Some(true)
                || page
                    .total_pages
                    .is_some_and(|total| u64::from(*number) + 1 >= total);
            if exhausted {
                Ok(None)
            } else {
                Ok(Some(PageCursor::Offset {
                    page: number + 1,
                    size: *size,
                    offset: *offset,
                }))
            }
        },
        PageCursor::Token(sent) => match page.next_cursor.as_deref() {
            None => Ok(None),
            Some(next) if next == sent => Err(DispatchError::PaginationExhaustion {
                resource,
                reason: format!("cursor '{}' was returned again", next),
            }),
            Some(next) => Ok(Some(PageCursor::Token(next.to_string()))),
        },
        PageCursor::None => Ok(None),
    }
}

/// Fetch one page of resources
async fn fetch_page(
    dispatcher: &Dispatcher,
    def: &OperationDef,
    params: &RequestParameters,
    cursor: &PageCursor,
) -> Result<Page, DispatchError> {
    let request = shape_request(def, params, cursor)?;
    let response = dispatcher.send(&request).await?;
    let body = response.body_json()?;

    let items_path = match &def.response {
        ResponseShape::List { items_path } => items_path.as_str(),
        _ => "",
    };

    Ok(Page {
        items: extract_items(&body, items_path),
        next_cursor: body
            .get("nextCursor")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string()),
        last: body.get("last").and_then(|v| v.as_bool()),
        number: body.get("number").and_then(|v| v.as_u64()),
        total_pages: body.get("totalPages").and_then(|v| v.as_u64()),
    })
}

/// Extract items from response using the items path
fn extract_items(response: &Value, path: &str) -> Vec<Value> {
    get_path(response, path)
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}
