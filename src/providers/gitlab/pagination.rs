use std::future::Future;

use log::debug;

use super::api::{Page, PageRequest};
use super::cancel::CancelToken;
use crate::error::Result;

/// Drains a paginated listing, starting at page 1.
///
/// Stops only when a page reports no next page; an empty page with a next
/// cursor keeps going, and a full page without one ends the loop. The first
/// fetch error is returned as-is and anything accumulated so far is dropped.
/// Cancellation is checked before every fetch.
pub async fn collect_all_pages<T, F, Fut>(cancel: &CancelToken, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut all_items = Vec::new();
    let mut request = PageRequest::first();

    loop {
        cancel.check()?;

        let page = fetch(request).await?;
        debug!(
            "Fetched page {} ({} items, next: {:?})",
            request.page,
            page.items.len(),
            page.next_page
        );
        all_items.extend(page.items);

        match page.next_page {
            Some(next) => request = PageRequest::at(next),
            None => break,
        }
    }

    Ok(all_items)
}
