//! The population: chromosome storages, their tag managers, fitness
//! bookkeeping and statistic trackers.
use crate::chromosome::{ChromosomeStorage, NEW_CHROMOSOME, NO_PARENT, REMOVE_CHROMOSOME};
use crate::errors::{CoreError, Result};
use crate::fitness::comparators::ComparatorSetup;
use crate::fitness::{Fitness, FitnessParams};
use crate::flags::AtomicFlags;
use crate::statistics::{Combiner, Evaluator, SelectionMode, StatValue, Statistics};
use crate::tags::{SingleBuffer, TagBuffer, TagBufferSink, TagManager, TagPolicy, TagUpdate};
use cardinality_estimator::CardinalityEstimator;
use ordered_float::OrderedFloat;
use std::any::Any;

/// Population flag: the raw fitness operation changed, all fitness values
/// are stale.
pub const FITNESS_OPERATION_CHANGED: u32 = 0x1;
/// Population flag: every chromosome's fitness needs re-evaluation.
pub const COMPLETE_FITNESS_UPDATE: u32 = 0x2;
/// Population flag: the scaled fitness prototype changed.
pub const SCALED_FITNESS_PROTOTYPE_CHANGED: u32 = 0x4;
/// Population flag: a full scaled-fitness update has been performed this
/// generation.
pub const COMPLETE_SCALED_FITNESS_UPDATE: u32 = 0x8;

/// Statistic ids registered by the population's trackers. Consumers are
/// free to register further values under their own ids.
pub mod stat_ids {
    use crate::statistics::StatId;

    pub const POPULATION_SIZE: StatId = 1;
    pub const PROBABILITY_BASE_SUM: StatId = 2;
    pub const MEAN_PROBABILITY_BASE: StatId = 3;
    pub const BEST_PROBABILITY_BASE: StatId = 4;
    pub const WORST_PROBABILITY_BASE: StatId = 5;
    pub const VARIANCE: StatId = 6;
    pub const DEVIATION: StatId = 7;
    pub const FITNESS_CARDINALITY: StatId = 8;
    pub const SCALING_TIME: StatId = 9;
}

/// Recycles chromosome storages. Released storages are cleared (tag buffer
/// sizing kept) and handed back by [StoragePool::acquire]; beyond the size
/// cap they are dropped instead.
#[derive(Debug)]
pub struct StoragePool {
    free: Vec<ChromosomeStorage>,
    capacity: usize,
}

impl StoragePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    pub fn acquire(&mut self) -> Option<ChromosomeStorage> {
        self.free.pop()
    }

    pub fn release(&mut self, mut storage: ChromosomeStorage) {
        if self.free.len() < self.capacity {
            storage.clear();
            self.free.push(storage);
        }
    }

    fn storages_mut(&mut self) -> &mut [ChromosomeStorage] {
        &mut self.free
    }
}

/// Broadcasts tag layout changes to every live and pooled storage, so a
/// storage acquired from the pool already matches the current layout.
struct StorageSink<'a> {
    live: &'a mut [ChromosomeStorage],
    pooled: &'a mut [ChromosomeStorage],
}

impl TagBufferSink for StorageSink<'_> {
    fn for_each_buffer(&mut self, f: &mut dyn FnMut(&mut TagBuffer)) {
        for storage in self.live.iter_mut() {
            f(storage.tags_mut());
        }
        for storage in self.pooled.iter_mut() {
            f(storage.tags_mut());
        }
    }
}

/// The current generation of chromosome storages, plus everything the
/// operations acting on it share: two tag managers (per-chromosome and
/// per-population), the fitness prototypes and parameters, the installed
/// fitness comparator, cross-generation flags, the storage pool and the
/// statistics group.
#[derive(Debug)]
pub struct Population {
    storages: Vec<ChromosomeStorage>,
    new_start: usize,
    capacity: usize,
    chromosome_tags: TagManager,
    population_tags: TagManager,
    population_tag_buffer: TagBuffer,
    raw_prototype: Fitness,
    scaled_prototype: Fitness,
    fitness_params: FitnessParams,
    comparator: ComparatorSetup,
    flags: AtomicFlags,
    pool: StoragePool,
    statistics: Statistics,
}

impl Population {
    pub fn new(
        capacity: usize,
        raw_prototype: Fitness,
        fitness_params: FitnessParams,
        comparator: ComparatorSetup,
    ) -> Result<Self> {
        if raw_prototype.value_count() != fitness_params.value_count() {
            return Err(CoreError::InvalidArgument(
                "fitness prototype does not match fitness parameters",
            ));
        }
        let mut population = Self {
            storages: Vec::with_capacity(capacity * 2),
            new_start: 0,
            capacity,
            chromosome_tags: TagManager::new(),
            population_tags: TagManager::new(),
            population_tag_buffer: TagBuffer::default(),
            raw_prototype,
            scaled_prototype: Fitness::single(0.0),
            fitness_params,
            comparator,
            flags: AtomicFlags::default(),
            pool: StoragePool::new(capacity),
            statistics: Statistics::new(),
        };
        population.register_trackers()?;
        Ok(population)
    }

    fn register_trackers(&mut self) -> Result<()> {
        let stats = &mut self.statistics;
        stats.add_value(
            stat_ids::POPULATION_SIZE,
            StatValue::independent(Some(Combiner::Sum)),
        )?;
        stats.add_value(
            stat_ids::PROBABILITY_BASE_SUM,
            StatValue::independent(Some(Combiner::Sum)),
        )?;
        stats.add_value(
            stat_ids::MEAN_PROBABILITY_BASE,
            StatValue::evaluated(Evaluator::Division {
                numerator: stat_ids::PROBABILITY_BASE_SUM,
                denominator: stat_ids::POPULATION_SIZE,
            }),
        )?;
        stats.add_value(
            stat_ids::BEST_PROBABILITY_BASE,
            StatValue::independent(Some(Combiner::Selection(SelectionMode::Greater))),
        )?;
        stats.add_value(
            stat_ids::WORST_PROBABILITY_BASE,
            StatValue::independent(Some(Combiner::Selection(SelectionMode::Lower))),
        )?;
        stats.add_value(
            stat_ids::VARIANCE,
            StatValue::independent(Some(Combiner::Sum)),
        )?;
        stats.add_value(
            stat_ids::DEVIATION,
            StatValue::evaluated(Evaluator::Sqrt {
                input: stat_ids::VARIANCE,
            }),
        )?;
        stats.add_value(stat_ids::FITNESS_CARDINALITY, StatValue::independent(None))?;
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.storages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storages.is_empty()
    }

    /// Target generation size; the storage vector itself grows past it
    /// while an offspring batch is staged.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn storages(&self) -> &[ChromosomeStorage] {
        &self.storages
    }

    pub fn storage(&self, index: usize) -> &ChromosomeStorage {
        &self.storages[index]
    }

    pub fn storages_mut(&mut self) -> &mut [ChromosomeStorage] {
        &mut self.storages
    }

    /// Indices of the chromosomes inserted this generation.
    pub fn new_range(&self) -> std::ops::Range<usize> {
        self.new_start..self.storages.len()
    }

    pub fn flags(&self) -> &AtomicFlags {
        &self.flags
    }

    pub fn fitness_params(&self) -> &FitnessParams {
        &self.fitness_params
    }

    pub fn fitness_params_mut(&mut self) -> &mut FitnessParams {
        &mut self.fitness_params
    }

    pub fn raw_fitness_prototype(&self) -> &Fitness {
        &self.raw_prototype
    }

    pub fn scaled_fitness_prototype(&self) -> &Fitness {
        &self.scaled_prototype
    }

    pub fn comparator(&self) -> &ComparatorSetup {
        &self.comparator
    }

    pub fn set_comparator(&mut self, comparator: ComparatorSetup) {
        self.comparator = comparator;
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn statistics_mut(&mut self) -> &mut Statistics {
        &mut self.statistics
    }

    pub fn pool(&self) -> &StoragePool {
        &self.pool
    }

    /// Compares two fitness values with the installed comparator; `< 0`
    /// means the first is better.
    pub fn compare_fitness(&self, a: &Fitness, b: &Fitness) -> i32 {
        self.comparator.compare(a, b)
    }

    pub fn compare_fitness_values(&self, a: &[f64], b: &[f64]) -> i32 {
        self.comparator.compare_values(a, b)
    }

    pub fn compare_storages(&self, a: usize, b: usize) -> i32 {
        self.compare_fitness(
            self.storages[a].raw_fitness(),
            self.storages[b].raw_fitness(),
        )
    }

    /// A storage ready for a new chromosome, recycled from the pool when
    /// possible; its tag buffer matches the current layout either way.
    pub fn acquire_storage(&mut self) -> ChromosomeStorage {
        if let Some(storage) = self.pool.acquire() {
            return storage;
        }
        let mut storage = ChromosomeStorage::new(
            self.raw_prototype.zeroed_like(),
            self.scaled_prototype.zeroed_like(),
        );
        self.chromosome_tags.init_buffer(storage.tags_mut());
        storage
    }

    pub fn release_storage(&mut self, storage: ChromosomeStorage) {
        self.pool.release(storage);
    }

    /// Appends a batch of storages as this generation's new chromosomes.
    pub fn insert(&mut self, batch: Vec<ChromosomeStorage>) {
        for storage in batch {
            storage.flags().set(NEW_CHROMOSOME);
            self.storages.push(storage);
        }
    }

    /// Compacts away every storage flagged for removal, releasing it to the
    /// pool, and remaps surviving parent links (a removed parent becomes
    /// none). Returns the number of removed storages.
    pub fn remove(&mut self) -> usize {
        let old = std::mem::take(&mut self.storages);
        let old_new_start = self.new_start;
        let mut map = vec![NO_PARENT; old.len()];
        let mut kept = Vec::with_capacity(old.len());
        let mut removed = 0;
        for (index, storage) in old.into_iter().enumerate() {
            if storage.flags().is_set_any(REMOVE_CHROMOSOME) {
                self.pool.release(storage);
                removed += 1;
            } else {
                map[index] = kept.len();
                kept.push(storage);
            }
        }
        for storage in &kept {
            if let Some(parent) = storage.parent() {
                let mapped = map[parent];
                storage.set_parent((mapped != NO_PARENT).then_some(mapped));
            }
        }
        self.new_start = map[..old_new_start]
            .iter()
            .filter(|&&mapped| mapped != NO_PARENT)
            .count();
        self.storages = kept;
        removed
    }

    /// Ends the generation: clears the new-chromosome flags and the
    /// cross-generation population flags, and rotates statistics history.
    pub fn next_generation(&mut self) -> Result<()> {
        for storage in &self.storages {
            storage.flags().clear(NEW_CHROMOSOME);
        }
        self.new_start = self.storages.len();
        self.flags.clear(
            FITNESS_OPERATION_CHANGED
                | COMPLETE_FITNESS_UPDATE
                | SCALED_FITNESS_PROTOTYPE_CHANGED
                | COMPLETE_SCALED_FITNESS_UPDATE,
        );
        self.statistics.next()
    }

    /// Installs a new scaled-fitness prototype; every storage gets a fresh
    /// zeroed instance and the next scaling pass rescales everything.
    pub fn set_scaled_fitness_prototype(&mut self, prototype: Fitness) {
        for storage in &mut self.storages {
            storage.set_scaled_fitness(prototype.zeroed_like());
        }
        self.scaled_prototype = prototype;
        self.flags.set(SCALED_FITNESS_PROTOTYPE_CHANGED);
    }

    /// Marks all raw fitness values stale after the raw fitness operation
    /// changed.
    pub fn set_fitness_operation_changed(&self) {
        self.flags
            .set(FITNESS_OPERATION_CHANGED | COMPLETE_FITNESS_UPDATE);
    }

    /// Recomputes the probability-base trackers (size, sum, best, worst,
    /// variance, cardinality); the mean and deviation follow through their
    /// evaluators.
    pub fn update_fitness_statistics(&mut self) -> Result<()> {
        let bases: Vec<f64> = self
            .storages
            .iter()
            .map(|storage| storage.raw_fitness().probability_base(&self.fitness_params))
            .collect();
        if bases.is_empty() {
            return Err(CoreError::InvalidOperation(
                "cannot track statistics of an empty population",
            ));
        }
        let best = bases
            .iter()
            .copied()
            .max_by_key(|&value| OrderedFloat(value))
            .expect("nonempty bases");
        let worst = bases
            .iter()
            .copied()
            .min_by_key(|&value| OrderedFloat(value))
            .expect("nonempty bases");
        let sum: f64 = bases.iter().sum();
        let stddev = stats::stddev(bases.iter().copied());
        let mut estimator = CardinalityEstimator::<u64>::new();
        bases
            .iter()
            .for_each(|base| estimator.insert_hash(base.to_bits()));

        let stats = &mut self.statistics;
        stats.set_current(stat_ids::POPULATION_SIZE, bases.len() as f64)?;
        stats.set_current(stat_ids::PROBABILITY_BASE_SUM, sum)?;
        stats.set_current(stat_ids::BEST_PROBABILITY_BASE, best)?;
        stats.set_current(stat_ids::WORST_PROBABILITY_BASE, worst)?;
        stats.set_current(stat_ids::VARIANCE, stddev * stddev)?;
        stats.set_current(stat_ids::FITNESS_CARDINALITY, estimator.estimate() as f64)?;
        Ok(())
    }

    /// Split borrow for scaling sweeps: the storages to rescale, the
    /// fitness parameters and the population flag word.
    pub(crate) fn scaling_split(
        &mut self,
    ) -> (&mut [ChromosomeStorage], &FitnessParams, &AtomicFlags) {
        (&mut self.storages, &self.fitness_params, &self.flags)
    }

    // --- chromosome tags -------------------------------------------------

    pub fn chromosome_tag_slot(&self, id: i32) -> Result<usize> {
        self.chromosome_tags.slot_of(id)
    }

    pub fn chromosome_tag_manager(&self) -> &TagManager {
        &self.chromosome_tags
    }

    pub fn add_chromosome_tag(&mut self, id: i32, policy: Box<dyn TagPolicy>) -> Result<usize> {
        let mut sink = StorageSink {
            live: &mut self.storages,
            pooled: self.pool.storages_mut(),
        };
        self.chromosome_tags.add_tag(id, policy, &mut sink, false)
    }

    pub fn add_chromosome_tag_strict(
        &mut self,
        id: i32,
        policy: Box<dyn TagPolicy>,
    ) -> Result<usize> {
        let mut sink = StorageSink {
            live: &mut self.storages,
            pooled: self.pool.storages_mut(),
        };
        self.chromosome_tags.add_tag(id, policy, &mut sink, true)
    }

    pub fn remove_chromosome_tag(&mut self, id: i32) -> bool {
        let mut sink = StorageSink {
            live: &mut self.storages,
            pooled: self.pool.storages_mut(),
        };
        self.chromosome_tags.remove_tag(id, &mut sink)
    }

    pub fn replace_chromosome_tag(&mut self, id: i32, policy: Box<dyn TagPolicy>) -> Result<usize> {
        let mut sink = StorageSink {
            live: &mut self.storages,
            pooled: self.pool.storages_mut(),
        };
        self.chromosome_tags.replace_tag(id, policy, &mut sink)
    }

    pub fn update_chromosome_tag(&mut self, id: i32, update: &dyn TagUpdate) -> Result<()> {
        let mut sink = StorageSink {
            live: &mut self.storages,
            pooled: self.pool.storages_mut(),
        };
        self.chromosome_tags.update_tag(id, update, &mut sink)
    }

    // --- population tags -------------------------------------------------

    pub fn population_tag_manager(&self) -> &TagManager {
        &self.population_tags
    }

    pub fn add_population_tag(&mut self, id: i32, policy: Box<dyn TagPolicy>) -> Result<usize> {
        let mut sink = SingleBuffer(&mut self.population_tag_buffer);
        self.population_tags.add_tag(id, policy, &mut sink, false)
    }

    pub fn remove_population_tag(&mut self, id: i32) -> bool {
        let mut sink = SingleBuffer(&mut self.population_tag_buffer);
        self.population_tags.remove_tag(id, &mut sink)
    }

    /// Shared access to a population tag's value.
    pub fn population_tag<T: Any + Send + Sync>(&self, id: i32) -> Result<&T> {
        let slot = self.population_tags.slot_of(id)?;
        Ok(self
            .population_tag_buffer
            .get(slot)
            .and_then(|tag| tag.as_any().downcast_ref())
            .expect("population tag slot empty or of unexpected type"))
    }

    pub fn population_tag_mut<T: Any + Send + Sync>(&mut self, id: i32) -> Result<&mut T> {
        let slot = self.population_tags.slot_of(id)?;
        Ok(self
            .population_tag_buffer
            .get_mut(slot)
            .and_then(|tag| tag.as_any_mut().downcast_mut())
            .expect("population tag slot empty or of unexpected type"))
    }
}
