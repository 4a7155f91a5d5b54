/// Read-through caching for computed recommendation payloads.
///
/// Checks the cache for `$key`; on a hit the cached value is returned, on a
/// miss `$block` computes the value, which is queued for a background write
/// under `$key` with the given TTL and returned.
///
/// # Arguments
/// * `$cache`: a [`crate::db::Cache`] instance.
/// * `$key`: the [`crate::db::CacheKey`] to read and write.
/// * `$ttl`: time-to-live of the written value, in seconds.
/// * `$block`: async expression producing the value on a cache miss.
///
/// # Example
/// ```rust,ignore
/// let payload = cached!(cache, key, 300, async move {
///     compute_recommendations(&state, user_id).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
