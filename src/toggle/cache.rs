use log::debug;

/// Control surface of the host engine's shared object cache.
///
/// With replica routing enabled the shared cache has to go: an object cached
/// from a replica read may be stale, and a cache hit would then serve that
/// stale object even to callers the router would have sent to the primary.
/// The toggle calls `disable` exactly once, at the moment it enables routing.
pub trait ObjectCacheControl: Send + Sync {
    fn disable(&self);
}

/// For host engines that run without a shared object cache
pub struct NoopObjectCache;

impl ObjectCacheControl for NoopObjectCache {
    fn disable(&self) {
        debug!("No object cache to disable");
    }
}
