//! Chunked fetches for large `IN`-clause ID lists.
//!
//! The backend rejects queries with roughly a thousand or more bound
//! parameters; [`CHUNK_SIZE`] stays conservatively below that ceiling.
//! Both variants abort on the first chunk error and discard rows from
//! earlier chunks — the caller's fallback policy decides what the user
//! sees. Single attempt per chunk, no retries.

use std::future::Future;

use futures::future;

/// Maximum IDs bound into a single query.
pub const CHUNK_SIZE: usize = 500;

/// Fetch rows for `ids` in consecutive chunks of at most `chunk_size`,
/// issuing one fetch per chunk sequentially, and concatenate the results.
///
/// An empty `ids` list performs zero fetches. The closure receives each
/// chunk as a slice and must copy what it needs before going async.
///
/// # Errors
///
/// Returns the first chunk error unchanged; earlier chunks are discarded.
pub async fn fetch_chunked<I, R, E, F, Fut>(
    ids: &[I],
    chunk_size: usize,
    mut fetch: F,
) -> Result<Vec<R>, E>
where
    F: FnMut(&[I]) -> Fut,
    Fut: Future<Output = Result<Vec<R>, E>>,
{
    let mut all = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(chunk_size.max(1)) {
        all.extend(fetch(chunk).await?);
    }
    Ok(all)
}

/// Like [`fetch_chunked`] but issues every chunk fetch concurrently and
/// concatenates results in chunk order.
///
/// Downstream grouping is order-independent, so cross-chunk ordering does
/// not matter — but dedupe-by-key must always run over the fully collected
/// result, never per chunk, which this function guarantees by returning
/// only after all chunks resolve.
///
/// # Errors
///
/// Returns the first chunk error; results from the other chunks are dropped.
pub async fn fetch_chunked_concurrent<I, R, E, F, Fut>(
    ids: &[I],
    chunk_size: usize,
    fetch: F,
) -> Result<Vec<R>, E>
where
    F: Fn(&[I]) -> Fut,
    Fut: Future<Output = Result<Vec<R>, E>>,
{
    let chunks: Vec<_> = ids.chunks(chunk_size.max(1)).map(&fetch).collect();
    let results = future::try_join_all(chunks).await?;
    Ok(results.into_iter().flatten().collect())
}
