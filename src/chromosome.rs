//! Chromosome storage: the per-candidate record a population keeps.
use crate::fitness::Fitness;
use crate::flags::AtomicFlags;
use crate::tags::TagBuffer;
use rayon::prelude::*;
use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use thread_local::ThreadLocal;

/// One candidate solution. Opaque to the engine; only cloning and identity
/// are required here, evaluation happens through [RawFitnessOperation].
pub trait Chromosome: Send + Sync + std::fmt::Debug {
    fn clone_box(&self) -> Box<dyn Chromosome>;
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Produces the raw fitness of a chromosome. Implemented by the consumer;
/// the engine only drives it over the population.
pub trait RawFitnessOperation: Send + Sync + std::fmt::Debug {
    fn evaluate(&mut self, chromosome: &dyn Chromosome, fitness: &mut Fitness);
}

/// Storage flag: inserted into the population in the current generation.
pub const NEW_CHROMOSOME: u32 = 0x1;
/// Storage flag: scheduled for removal at the next compaction.
pub const REMOVE_CHROMOSOME: u32 = 0x2;

/// Parent link value meaning "no parent".
pub const NO_PARENT: usize = usize::MAX;

/// Per-chromosome record: the chromosome itself, its raw and scaled fitness,
/// a flag word, a parent back-link (lookup only) and the tag buffer that
/// algorithms attach their state to.
///
/// Storage objects are pooled; [ChromosomeStorage::clear] readies one for
/// reuse without touching the tag buffer's slot layout.
#[derive(Debug)]
pub struct ChromosomeStorage {
    chromosome: Option<Box<dyn Chromosome>>,
    raw_fitness: Fitness,
    scaled_fitness: Fitness,
    flags: AtomicFlags,
    parent: AtomicUsize,
    tags: TagBuffer,
}

impl ChromosomeStorage {
    pub fn new(raw_fitness: Fitness, scaled_fitness: Fitness) -> Self {
        Self {
            chromosome: None,
            raw_fitness,
            scaled_fitness,
            flags: AtomicFlags::default(),
            parent: AtomicUsize::new(NO_PARENT),
            tags: TagBuffer::default(),
        }
    }

    pub fn set_chromosome(&mut self, chromosome: Box<dyn Chromosome>, parent: Option<usize>) {
        self.chromosome = Some(chromosome);
        self.parent
            .store(parent.unwrap_or(NO_PARENT), Ordering::Release);
    }

    pub fn chromosome(&self) -> Option<&dyn Chromosome> {
        self.chromosome.as_deref()
    }

    pub fn take_chromosome(&mut self) -> Option<Box<dyn Chromosome>> {
        self.chromosome.take()
    }

    pub fn raw_fitness(&self) -> &Fitness {
        &self.raw_fitness
    }

    pub fn raw_fitness_mut(&mut self) -> &mut Fitness {
        &mut self.raw_fitness
    }

    pub fn scaled_fitness(&self) -> &Fitness {
        &self.scaled_fitness
    }

    pub fn scaled_fitness_mut(&mut self) -> &mut Fitness {
        &mut self.scaled_fitness
    }

    /// Replaces a fitness object, e.g. when the population's scaled fitness
    /// prototype changes.
    pub fn set_scaled_fitness(&mut self, fitness: Fitness) {
        self.scaled_fitness = fitness;
    }

    pub fn flags(&self) -> &AtomicFlags {
        &self.flags
    }

    /// Index of the parent in the population, if the link is still set.
    /// Safe to read and clear from parallel regions.
    pub fn parent(&self) -> Option<usize> {
        match self.parent.load(Ordering::Acquire) {
            NO_PARENT => None,
            index => Some(index),
        }
    }

    pub fn set_parent(&self, parent: Option<usize>) {
        self.parent
            .store(parent.unwrap_or(NO_PARENT), Ordering::Release);
    }

    pub fn tags(&self) -> &TagBuffer {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagBuffer {
        &mut self.tags
    }

    /// Resets the storage for reuse: fitness zeroed, flags and parent link
    /// cleared, chromosome dropped. Tag buffer sizing is preserved.
    pub fn clear(&mut self) {
        self.chromosome = None;
        self.raw_fitness = self.raw_fitness.zeroed_like();
        self.scaled_fitness = self.scaled_fitness.zeroed_like();
        self.flags.reset();
        self.parent.store(NO_PARENT, Ordering::Release);
    }
}

/// Evaluates the raw fitness of every storage flagged [NEW_CHROMOSOME].
/// Passing a `thread_local` hands each rayon worker its own clone of the
/// operation, for operations that keep per-call scratch or caches.
pub fn evaluate_new_storages<F>(
    operation: &mut F,
    storages: &mut [ChromosomeStorage],
    thread_local: Option<&ThreadLocal<RefCell<F>>>,
) where
    F: RawFitnessOperation + Clone,
{
    if let Some(thread_local) = thread_local {
        storages
            .par_iter_mut()
            .filter(|storage| storage.flags().is_set_any(NEW_CHROMOSOME))
            .for_each_init(
                || {
                    thread_local
                        .get_or(|| RefCell::new(operation.clone()))
                        .borrow_mut()
                },
                |operation, storage| {
                    if let Some(chromosome) = storage.chromosome.as_deref() {
                        operation.evaluate(chromosome, &mut storage.raw_fitness);
                    }
                },
            );
    } else {
        storages
            .iter_mut()
            .filter(|storage| storage.flags().is_set_any(NEW_CHROMOSOME))
            .for_each(|storage| {
                if let Some(chromosome) = storage.chromosome.as_deref() {
                    operation.evaluate(chromosome, &mut storage.raw_fitness);
                }
            });
    }
}
