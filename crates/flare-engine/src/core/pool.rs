//! Rental service for particle buffers and index scratch arrays.
//!
//! Emitters created under [`AllocationMode::Pooled`] check their arrays out of
//! a shared [`BufferPool`] and hand them back when the emitter is dropped, so
//! churning through short-lived emitters does not churn the allocator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::api::config::AllocationMode;
use crate::components::particle::Particle;

/// Counters for monitoring pool behaviour.
#[derive(Debug, Default)]
pub struct PoolStatistics {
    /// Checkouts served from an idle buffer.
    pub hits: AtomicU64,
    /// Checkouts that had to allocate.
    pub misses: AtomicU64,
    /// Buffers handed back and kept.
    pub returns: AtomicU64,
    /// Buffers handed back but dropped because the free list was full.
    pub discards: AtomicU64,
}

/// Plain snapshot of [`PoolStatistics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub returns: u64,
    pub discards: u64,
}

impl PoolStatistics {
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            discards: self.discards.load(Ordering::Relaxed),
        }
    }
}

/// Bounded free list of one buffer kind.
#[derive(Debug)]
struct FreeList<T> {
    buffers: Vec<Vec<T>>,
    max_len: usize,
}

impl<T> FreeList<T> {
    fn new(max_len: usize) -> Self {
        Self {
            buffers: Vec::new(),
            max_len,
        }
    }

    /// Take the smallest idle buffer that can hold `capacity` elements.
    fn take(&mut self, capacity: usize) -> Option<Vec<T>> {
        let idx = self
            .buffers
            .iter()
            .enumerate()
            .filter(|(_, b)| b.capacity() >= capacity)
            .min_by_key(|(_, b)| b.capacity())
            .map(|(i, _)| i)?;
        Some(self.buffers.swap_remove(idx))
    }

    fn give(&mut self, mut buffer: Vec<T>) -> bool {
        if self.buffers.len() >= self.max_len {
            return false;
        }
        buffer.clear();
        self.buffers.push(buffer);
        true
    }
}

/// Thread-safe pool of particle buffers and index scratch arrays.
#[derive(Debug)]
pub struct BufferPool {
    particles: Mutex<FreeList<Particle>>,
    indices: Mutex<FreeList<usize>>,
    stats: PoolStatistics,
}

impl BufferPool {
    /// Pool keeping at most `max_buffers` idle buffers of each kind.
    pub fn new(max_buffers: usize) -> Self {
        Self {
            particles: Mutex::new(FreeList::new(max_buffers)),
            indices: Mutex::new(FreeList::new(max_buffers)),
            stats: PoolStatistics::default(),
        }
    }

    pub fn stats(&self) -> &PoolStatistics {
        &self.stats
    }

    /// Number of idle particle buffers.
    pub fn idle_particle_buffers(&self) -> usize {
        self.particles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .buffers
            .len()
    }

    /// Check out a particle buffer of exactly `capacity` default particles.
    pub fn rent_particles(&self, capacity: usize) -> Vec<Particle> {
        let taken = self
            .particles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take(capacity);
        let mut buffer = self.record(taken, capacity);
        buffer.resize(capacity, Particle::default());
        buffer
    }

    /// Check out an empty index array able to hold `capacity` entries.
    pub fn rent_indices(&self, capacity: usize) -> Vec<usize> {
        let taken = self
            .indices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take(capacity);
        self.record(taken, capacity)
    }

    pub fn return_particles(&self, buffer: Vec<Particle>) {
        let kept = self
            .particles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .give(buffer);
        self.record_return(kept);
    }

    pub fn return_indices(&self, buffer: Vec<usize>) {
        let kept = self
            .indices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .give(buffer);
        self.record_return(kept);
    }

    fn record<T>(&self, taken: Option<Vec<T>>, capacity: usize) -> Vec<T> {
        match taken {
            Some(buffer) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                buffer
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                log::trace!("buffer pool miss, allocating {capacity} slots");
                Vec::with_capacity(capacity)
            }
        }
    }

    fn record_return(&self, kept: bool) {
        let counter = if kept {
            &self.stats.returns
        } else {
            &self.stats.discards
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Allocation strategy plus the pool it rents from.
#[derive(Debug, Clone)]
pub struct BufferAllocator {
    mode: AllocationMode,
    pool: Arc<BufferPool>,
}

impl BufferAllocator {
    pub fn new(mode: AllocationMode, pool: Arc<BufferPool>) -> Self {
        Self { mode, pool }
    }

    /// Allocator with its own private pool.
    pub fn dedicated() -> Self {
        Self::new(AllocationMode::Dedicated, Arc::new(BufferPool::default()))
    }

    pub fn mode(&self) -> AllocationMode {
        self.mode
    }

    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    /// Allocate the arrays for an emitter of `capacity` particles.
    pub fn allocate(&self, capacity: usize) -> ParticleBuffer {
        match self.mode {
            AllocationMode::Dedicated => ParticleBuffer {
                particles: vec![Particle::default(); capacity],
                new_indices: Vec::with_capacity(capacity),
                pool: None,
            },
            AllocationMode::Pooled => ParticleBuffer {
                particles: self.pool.rent_particles(capacity),
                new_indices: self.pool.rent_indices(capacity),
                pool: Some(Arc::clone(&self.pool)),
            },
        }
    }
}

impl Default for BufferAllocator {
    fn default() -> Self {
        Self::dedicated()
    }
}

/// An emitter's particle slots plus the scratch list of slots activated since
/// the last update. Pooled buffers go back to their pool on drop.
#[derive(Debug)]
pub struct ParticleBuffer {
    pub(crate) particles: Vec<Particle>,
    pub(crate) new_indices: Vec<usize>,
    pool: Option<Arc<BufferPool>>,
}

impl ParticleBuffer {
    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    pub fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }
}

impl Drop for ParticleBuffer {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.return_particles(std::mem::take(&mut self.particles));
            pool.return_indices(std::mem::take(&mut self.new_indices));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedicated_buffers_skip_the_pool() {
        let pool = Arc::new(BufferPool::new(4));
        let alloc = BufferAllocator::new(AllocationMode::Dedicated, Arc::clone(&pool));
        let buffer = alloc.allocate(16);
        assert_eq!(buffer.capacity(), 16);
        assert!(!buffer.is_pooled());
        drop(buffer);
        assert_eq!(pool.idle_particle_buffers(), 0);
    }

    #[test]
    fn pooled_buffers_return_on_drop() {
        let pool = Arc::new(BufferPool::new(4));
        let alloc = BufferAllocator::new(AllocationMode::Pooled, Arc::clone(&pool));
        let buffer = alloc.allocate(32);
        assert!(buffer.is_pooled());
        assert_eq!(pool.idle_particle_buffers(), 0);
        drop(buffer);
        assert_eq!(pool.idle_particle_buffers(), 1);

        let again = alloc.allocate(8);
        assert_eq!(again.capacity(), 8);
        let stats = pool.stats().snapshot();
        assert_eq!(stats.misses, 2, "first particle + index checkout");
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.returns, 2);
    }

    #[test]
    fn rented_particles_are_reset() {
        let pool = BufferPool::new(4);
        let mut buffer = pool.rent_particles(4);
        buffer[0].speed = 99.0;
        pool.return_particles(buffer);
        let buffer = pool.rent_particles(4);
        assert_eq!(buffer[0], Particle::default());
    }

    #[test]
    fn full_pool_discards() {
        let pool = BufferPool::new(1);
        pool.return_indices(Vec::with_capacity(4));
        pool.return_indices(Vec::with_capacity(4));
        let stats = pool.stats().snapshot();
        assert_eq!(stats.returns, 1);
        assert_eq!(stats.discards, 1);
    }

    #[test]
    fn smallest_fitting_buffer_is_reused() {
        let pool = BufferPool::new(4);
        pool.return_indices(Vec::with_capacity(1024));
        pool.return_indices(Vec::with_capacity(64));
        let rented = pool.rent_indices(32);
        assert!(rented.capacity() >= 32 && rented.capacity() < 1024);
    }
}
