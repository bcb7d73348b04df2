//! Particle pool storage and the block split used by parallel updates

use std::ops::Range;

use crate::particles::Particle;

/// Fixed-capacity, densely packed particle storage owned by one emitter
///
/// There is no insertion or removal: every slot is filled once when the pool
/// is created and recycled in place afterwards.
#[derive(Debug, Clone, Default)]
pub struct ParticlePool {
    particles: Vec<Particle>,
}

/// Contiguous slice of the pool handed to one worker for one update
#[derive(Debug)]
pub struct PoolBlock<'a> {
    /// Block number in `0..workers`
    pub index: usize,
    /// Pool index of the first particle in this block
    pub start: usize,
    pub particles: &'a mut [Particle],
}

/// Split `[0, len)` into `workers` contiguous blocks
///
/// Every block has `len / workers` particles except the last, which also
/// takes the remainder. When `len < workers` the leading blocks are empty.
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    if workers == 0 {
        return Vec::new();
    }

    let block_size = len / workers;
    (0..workers)
        .map(|i| {
            let start = i * block_size;
            let end = if i == workers - 1 { len } else { (i + 1) * block_size };
            start..end
        })
        .collect()
}

impl ParticlePool {
    /// Fill every slot by calling `spawn` once per index, in order
    pub fn fill_with(size: usize, mut spawn: impl FnMut(usize) -> Particle) -> Self {
        let mut particles = Vec::with_capacity(size);
        for i in 0..size {
            particles.push(spawn(i));
        }
        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    /// Borrow the pool as `workers` disjoint mutable blocks
    pub(crate) fn blocks_mut(&mut self, workers: usize) -> Vec<PoolBlock<'_>> {
        let ranges = partition(self.particles.len(), workers);
        let mut blocks = Vec::with_capacity(ranges.len());
        let mut rest: &mut [Particle] = &mut self.particles;

        for (index, range) in ranges.into_iter().enumerate() {
            let (particles, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
            blocks.push(PoolBlock {
                index,
                start: range.start,
                particles,
            });
            rest = tail;
        }

        blocks
    }
}

impl<'a> IntoIterator for &'a ParticlePool {
    type Item = &'a Particle;
    type IntoIter = std::slice::Iter<'a, Particle>;

    fn into_iter(self) -> Self::IntoIter {
        self.particles.iter()
    }
}
