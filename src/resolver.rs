use std::future::Future;

use tracing::{debug, warn};

use crate::locale::{FallbackChain, LanguageTag};
use crate::media::{ApiError, Usable};

/// Requests `fetch` for each tag of `chain` in order until a response passes
/// `is_usable`.
///
/// The last tag's outcome is returned as-is: an unusable response is still a
/// success, and its failure is the error handed back to the caller. Failures
/// on earlier tags only advance the chain.
pub async fn resolve<T, P, F, Fut>(
    chain: &FallbackChain,
    is_usable: P,
    mut fetch: F,
) -> Result<T, ApiError>
where
    P: Fn(&T) -> bool,
    F: FnMut(LanguageTag) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut tags = chain.iter().peekable();

    while let Some(tag) = tags.next() {
        let is_last = tags.peek().is_none();

        match fetch(tag.clone()).await {
            Ok(response) if is_last || is_usable(&response) => {
                debug!(language = %tag, "localized response accepted");
                return Ok(response);
            }
            Ok(_) => {
                debug!(language = %tag, "localized response unusable, trying next language");
            }
            Err(err) if is_last => {
                warn!(language = %tag, error = %err, "fallback chain exhausted");
                return Err(err);
            }
            Err(err) => {
                warn!(language = %tag, error = %err, "localized request failed, trying next language");
            }
        }
    }

    Err(ApiError::InvalidInput(String::from(
        "fallback chain must contain at least one tag",
    )))
}

/// [`resolve`] using the payload's own [`Usable`] predicate.
pub async fn resolve_usable<T, F, Fut>(chain: &FallbackChain, fetch: F) -> Result<T, ApiError>
where
    T: Usable,
    F: FnMut(LanguageTag) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    resolve(chain, T::is_usable, fetch).await
}
