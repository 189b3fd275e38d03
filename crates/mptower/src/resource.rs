use std::fmt;

/// Error returned when a resource limit is exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// Maximum number of allocations exceeded.
    Allocation { limit: usize, count: usize },
    /// Maximum estimated memory usage exceeded, in bytes.
    Memory { limit: usize, used: usize },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocation { limit, count } => {
                write!(f, "allocation limit exceeded: {count} > {limit}")
            }
            Self::Memory { limit, used } => write!(f, "memory limit exceeded: {used} bytes > {limit} bytes"),
        }
    }
}

impl std::error::Error for ResourceError {}

/// Accounts for the values a divmod call allocates.
///
/// `on_allocate` is called once per result value, before any arithmetic runs.
/// The size is passed lazily so trackers that don't limit memory never compute it.
pub trait ResourceTracker: fmt::Debug {
    /// Records one allocation of roughly `get_size()` bytes.
    fn on_allocate(&mut self, get_size: impl FnOnce() -> usize) -> Result<(), ResourceError>;
}

/// Tracker that never refuses an allocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLimitTracker;

impl ResourceTracker for NoLimitTracker {
    #[inline]
    fn on_allocate(&mut self, _get_size: impl FnOnce() -> usize) -> Result<(), ResourceError> {
        Ok(())
    }
}

/// Limits applied by `LimitedTracker`, built with chained setters.
#[derive(Debug, Clone, Default)]
pub struct ResourceLimits {
    pub max_allocations: Option<usize>,
    pub max_memory: Option<usize>,
}

impl ResourceLimits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_allocations(mut self, limit: usize) -> Self {
        self.max_allocations = Some(limit);
        self
    }

    #[must_use]
    pub fn max_memory(mut self, limit: usize) -> Self {
        self.max_memory = Some(limit);
        self
    }
}

/// Tracker enforcing `ResourceLimits` across every call it is passed to.
#[derive(Debug, Clone)]
pub struct LimitedTracker {
    limits: ResourceLimits,
    allocations: usize,
    memory: usize,
}

impl LimitedTracker {
    #[must_use]
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            allocations: 0,
            memory: 0,
        }
    }

    /// Number of allocations recorded so far.
    #[must_use]
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Estimated bytes recorded so far.
    #[must_use]
    pub fn memory(&self) -> usize {
        self.memory
    }
}

impl ResourceTracker for LimitedTracker {
    fn on_allocate(&mut self, get_size: impl FnOnce() -> usize) -> Result<(), ResourceError> {
        let count = self.allocations + 1;
        if let Some(limit) = self.limits.max_allocations {
            if count > limit {
                return Err(ResourceError::Allocation { limit, count });
            }
        }
        if let Some(limit) = self.limits.max_memory {
            let used = self.memory.saturating_add(get_size());
            if used > limit {
                return Err(ResourceError::Memory { limit, used });
            }
            self.memory = used;
        }
        self.allocations = count;
        Ok(())
    }
}
