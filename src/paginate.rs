//! Continuation-token pagination.

use crate::model::Page;
use std::future::Future;
use tracing::debug;

/// Calls `fetch` until a page comes back without a continuation token and
/// returns the concatenation of every page.
///
/// The first call carries no token; each later call carries the token of
/// the page before it. The loop ends only when the service stops handing
/// out tokens, so a server that repeats tokens forever keeps it running.
/// The first error aborts the listing.
pub async fn collect_pages<T, E, F, Fut>(mut fetch: F) -> Result<Vec<T>, E>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(token.take()).await?;
        pages += 1;
        token = page.next_token().map(str::to_string);
        items.extend(page.items);

        if token.is_none() {
            break;
        }
    }

    debug!(pages, items = items.len(), "pagination complete");
    Ok(items)
}
