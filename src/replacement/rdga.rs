//! Rank-density guided replacement.
//!
//! Offspring are inserted into the population, every chromosome is ranked
//! by Pareto dominance (rank 1 for the first front, otherwise the sum of
//! the dominators' ranks plus one), an adaptive grid over raw fitness space
//! assigns each chromosome a hyperbox, and parent/child survival is decided
//! per offspring: the first half of the batch competes on grid density, the
//! second half on rank. The best ranked chromosome of every occupied cell
//! is collected into the population's best-per-cell matrix afterwards.
use super::{OffspringBatch, Replacement};
use crate::branch;
use crate::chromosome::{ChromosomeStorage, REMOVE_CHROMOSOME};
use crate::container::AlignedVec;
use crate::errors::{CoreError, Result};
use crate::grid::{AdaptiveGrid, BestCellMatrix, GridBounds, HyperBox, HyperGrid, PerBranchMatrices};
use crate::population::{stat_ids, Population};
use crate::statistics::OperationTimer;
use crate::tags::{
    MergePolicy, PartialIndexLists, SizableTag, SizableTagPolicy, SizableTagUpdate, TagGetter,
    TypedTagPolicy,
};
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

const CACHE_LINE: usize = 64;
const LIST_END: usize = usize::MAX;

/// Chromosome tag holding the hyperbox the chromosome's raw fitness maps
/// to. Guarded so the owning branch can write it during a shared sweep.
#[derive(Debug, Default)]
pub struct HyperBoxTag(pub Mutex<HyperBox>);

impl HyperBoxTag {
    pub fn lock(&self) -> MutexGuard<'_, HyperBox> {
        self.0.lock().expect("hyperbox tag lock")
    }
}

impl SizableTag for HyperBoxTag {
    fn len(&self) -> usize {
        self.lock().len()
    }

    fn resize(&mut self, new_len: usize, _merge: MergePolicy) {
        self.0.get_mut().expect("hyperbox tag lock").0.resize(new_len, 0);
    }
}

/// Population tag: the queue of chromosomes in the current unprocessed
/// front, a lock-free intrusive LIFO whose links live in each chromosome's
/// next-in-front tag, plus the running count of still-unranked chromosomes.
///
/// Every chromosome is queued at most once per generation (when its
/// dominator count drops to zero) and popped once, so the stack never sees
/// a node reused while a pop is in flight.
#[derive(Debug)]
pub struct UnrankedFront {
    head: AtomicUsize,
    count: AtomicI32,
    next_slot: AtomicUsize,
}

impl Default for UnrankedFront {
    fn default() -> Self {
        Self {
            head: AtomicUsize::new(LIST_END),
            count: AtomicI32::new(0),
            next_slot: AtomicUsize::new(0),
        }
    }
}

impl UnrankedFront {
    fn set_next_slot(&self, slot: usize) {
        self.next_slot.store(slot, Ordering::Release);
    }

    pub fn set_count(&self, count: i32) {
        self.count.store(count, Ordering::Release);
        self.head.store(LIST_END, Ordering::Release);
    }

    pub fn unranked_count(&self) -> i32 {
        self.count.load(Ordering::Acquire)
    }

    fn next_of<'a>(&self, storages: &'a [ChromosomeStorage], index: usize) -> &'a AtomicUsize {
        let slot = self.next_slot.load(Ordering::Acquire);
        storages[index]
            .tags()
            .get(slot)
            .and_then(|tag| tag.as_any().downcast_ref())
            .expect("next-in-front tag registered")
    }

    /// Pushes a chromosome onto the current front.
    pub fn queue(&self, storages: &[ChromosomeStorage], index: usize) {
        let next = self.next_of(storages, index);
        let mut head = self.head.load(Ordering::Acquire);
        loop {
            next.store(head, Ordering::Relaxed);
            match self
                .head
                .compare_exchange_weak(head, index, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                Err(current) => head = current,
            }
        }
    }

    fn try_pop(&self, storages: &[ChromosomeStorage]) -> Option<usize> {
        let mut head = self.head.load(Ordering::Acquire);
        loop {
            if head == LIST_END {
                return None;
            }
            let next = self.next_of(storages, head).load(Ordering::Relaxed);
            match self
                .head
                .compare_exchange_weak(head, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return Some(head),
                Err(current) => head = current,
            }
        }
    }

    /// Pops a chromosome from the current front, waiting while the front is
    /// momentarily empty but unranked chromosomes remain; `None` once every
    /// chromosome has been ranked.
    pub fn dequeue(&self, storages: &[ChromosomeStorage]) -> Option<usize> {
        loop {
            if let Some(index) = self.try_pop(storages) {
                self.count.fetch_sub(1, Ordering::AcqRel);
                return Some(index);
            }
            if self.count.load(Ordering::Acquire) <= 0 {
                return None;
            }
            std::hint::spin_loop();
        }
    }
}

/// Population tag: per-branch fitness bounding boxes (the extra last slot
/// holds the merged box) and the fixed hypergrid the adaptive grid derives
/// from them.
#[derive(Debug)]
pub struct ReplacementGrid {
    bounds: AlignedVec<Mutex<GridBounds>>,
    origin: Vec<f64>,
    hyper_grid: Option<HyperGrid>,
    adaptive: Option<AdaptiveGrid>,
}

impl Default for ReplacementGrid {
    fn default() -> Self {
        Self {
            bounds: AlignedVec::new(0, CACHE_LINE).expect("cache line is a power of two"),
            origin: Vec::new(),
            hyper_grid: None,
            adaptive: None,
        }
    }
}

impl ReplacementGrid {
    /// Adapts the storage to the adaptive grid and branch count. Switching
    /// to a different adaptive grid discards the derived fixed grid.
    pub fn configure(
        &mut self,
        adaptive: &AdaptiveGrid,
        branch_count: usize,
        dimension_count: usize,
    ) {
        if self.adaptive.as_ref() != Some(adaptive) {
            self.hyper_grid = None;
            self.adaptive = Some(adaptive.clone());
        }
        let slots = branch_count + 1;
        let stale = self.bounds.len() != slots
            || self
                .bounds
                .get(0)
                .map_or(true, |bounds| {
                    bounds.lock().expect("bounds lock").dimension_count() != dimension_count
                });
        if stale {
            self.bounds = AlignedVec::from_fn(slots, CACHE_LINE, |_| {
                Mutex::new(GridBounds::new(dimension_count))
            })
            .expect("cache line is a power of two");
        }
    }

    pub fn branch_bounds(&self, branch: usize) -> &Mutex<GridBounds> {
        &self.bounds[branch]
    }

    /// Collapses every branch's bounding box onto the seed point.
    pub fn reset_branch_bounds(&self, seed: &[f64]) {
        for bounds in self.bounds.iter() {
            bounds.lock().expect("bounds lock").reset_to(seed);
        }
    }

    /// Merges the branch boxes into the last slot and lets the adaptive
    /// grid resize or create the fixed hypergrid to cover the merged box.
    pub fn merge_and_update(&mut self) {
        let adaptive = self.adaptive.as_ref().expect("grid configured");
        let merged_slot = self.bounds.len() - 1;
        let seed = self.bounds[0].lock().expect("bounds lock").clone();
        let mut merged = self.bounds[merged_slot].lock().expect("bounds lock");
        merged.set_lower(seed.lower());
        merged.set_upper(seed.upper());
        for branch in (1..merged_slot).rev() {
            let bounds = self.bounds[branch].lock().expect("bounds lock");
            adaptive.update_bounds(bounds.lower(), &mut merged);
            adaptive.update_bounds(bounds.upper(), &mut merged);
        }
        adaptive.update_hyper_grid(&merged, &mut self.hyper_grid);
        self.origin = merged.lower().to_vec();
    }

    pub fn hyper_grid(&self) -> Option<&HyperGrid> {
        self.hyper_grid.as_ref()
    }

    /// Lowest point of the merged bounding box, the fixed grid's origin.
    pub fn origin(&self) -> &[f64] {
        &self.origin
    }
}

/// Parameters of the replacement: the offspring budget and the tag ids the
/// operation registers. Ids are owned by the caller; the per-chromosome
/// and per-population id spaces are independent.
#[derive(Debug, Clone)]
pub struct RdgaParams {
    pub replacement_size: usize,
    pub dom_list_tag: i32,
    pub dom_count_tag: i32,
    pub rank_tag: i32,
    pub hyper_box_tag: i32,
    pub cell_tag: i32,
    pub next_in_front_tag: i32,
    pub best_matrix_tag: i32,
    pub branch_matrices_tag: i32,
    pub unranked_tag: i32,
    pub grid_tag: i32,
}

impl RdgaParams {
    pub fn new(replacement_size: usize) -> Self {
        Self {
            replacement_size,
            dom_list_tag: 1,
            dom_count_tag: 2,
            rank_tag: 3,
            hyper_box_tag: 4,
            cell_tag: 5,
            next_in_front_tag: 6,
            best_matrix_tag: 1,
            branch_matrices_tag: 2,
            unranked_tag: 3,
            grid_tag: 4,
        }
    }
}

/// Configuration: the adaptive grid partitioning raw fitness space.
#[derive(Debug, Clone)]
pub struct RdgaConfig {
    pub adaptive_grid: AdaptiveGrid,
}

impl RdgaConfig {
    pub fn new(adaptive_grid: AdaptiveGrid) -> Self {
        Self { adaptive_grid }
    }
}

/// The rank-density replacement operation.
#[derive(Debug, Clone, Default)]
pub struct Rdga;

impl Replacement for Rdga {
    type Params = RdgaParams;
    type Config = RdgaConfig;

    fn prepare(
        &self,
        _input: &mut OffspringBatch,
        population: &mut Population,
        params: &Self::Params,
        config: &Self::Config,
    ) -> Result<()> {
        let branch_count = branch::branch_count();
        let value_count = population.fitness_params().value_count();
        if config.adaptive_grid.dimension_count() != value_count {
            return Err(CoreError::InvalidArgument(
                "adaptive grid dimension does not match fitness size",
            ));
        }

        population.add_chromosome_tag(
            params.dom_list_tag,
            Box::new(SizableTagPolicy::<PartialIndexLists>::new(branch_count)),
        )?;
        population.add_chromosome_tag(
            params.dom_count_tag,
            Box::new(TypedTagPolicy::<AtomicI32>::default()),
        )?;
        population.add_chromosome_tag(
            params.rank_tag,
            Box::new(TypedTagPolicy::<AtomicI32>::default()),
        )?;
        population.add_chromosome_tag(
            params.hyper_box_tag,
            Box::new(SizableTagPolicy::<HyperBoxTag>::new(value_count)),
        )?;
        population.add_chromosome_tag(
            params.cell_tag,
            Box::new(TypedTagPolicy::<AtomicUsize>::default()),
        )?;
        population.add_chromosome_tag(
            params.next_in_front_tag,
            Box::new(TypedTagPolicy::<AtomicUsize>::default()),
        )?;

        population.add_population_tag(
            params.best_matrix_tag,
            Box::new(TypedTagPolicy::<BestCellMatrix>::default()),
        )?;
        population.add_population_tag(
            params.branch_matrices_tag,
            Box::new(TypedTagPolicy::<PerBranchMatrices>::default()),
        )?;
        population.add_population_tag(
            params.unranked_tag,
            Box::new(TypedTagPolicy::<UnrankedFront>::default()),
        )?;
        population.add_population_tag(
            params.grid_tag,
            Box::new(TypedTagPolicy::<ReplacementGrid>::default()),
        )?;

        let next_slot = population.chromosome_tag_slot(params.next_in_front_tag)?;
        population
            .population_tag::<UnrankedFront>(params.unranked_tag)?
            .set_next_slot(next_slot);
        Ok(())
    }

    fn clear(
        &self,
        _input: &mut OffspringBatch,
        population: &mut Population,
        params: &Self::Params,
        _config: &Self::Config,
    ) -> Result<()> {
        population.remove_chromosome_tag(params.dom_list_tag);
        population.remove_chromosome_tag(params.dom_count_tag);
        population.remove_chromosome_tag(params.rank_tag);
        population.remove_chromosome_tag(params.hyper_box_tag);
        population.remove_chromosome_tag(params.cell_tag);
        population.remove_chromosome_tag(params.next_in_front_tag);

        population.remove_population_tag(params.best_matrix_tag);
        population.remove_population_tag(params.branch_matrices_tag);
        population.remove_population_tag(params.unranked_tag);
        population.remove_population_tag(params.grid_tag);
        Ok(())
    }

    fn update(
        &self,
        _input: &mut OffspringBatch,
        population: &mut Population,
        params: &Self::Params,
        _config: &Self::Config,
    ) -> Result<()> {
        let branch_count = branch::branch_count();
        population.update_chromosome_tag(
            params.dom_list_tag,
            &SizableTagUpdate::<PartialIndexLists>::new(branch_count, MergePolicy::Concat),
        )?;
        population
            .population_tag_mut::<PerBranchMatrices>(params.branch_matrices_tag)?
            .set_branch_count(branch_count);
        Ok(())
    }

    fn exec(
        &self,
        input: &mut OffspringBatch,
        population: &mut Population,
        params: &Self::Params,
        config: &Self::Config,
    ) -> Result<()> {
        let timer = OperationTimer::new(stat_ids::SCALING_TIME);
        let branch_count = branch::branch_count();
        let value_count = population.fitness_params().value_count();

        // discard the best-ranked cells of the previous generation
        population
            .population_tag::<BestCellMatrix>(params.best_matrix_tag)?
            .clear();

        // prepare & insert
        population.update_chromosome_tag(
            params.hyper_box_tag,
            &SizableTagUpdate::<HyperBoxTag>::new(value_count, MergePolicy::Ignore),
        )?;
        population
            .population_tag_mut::<ReplacementGrid>(params.grid_tag)?
            .configure(&config.adaptive_grid, branch_count, value_count);

        while input.storages.len() > params.replacement_size {
            let storage = input.storages.pop().expect("length checked");
            population.release_storage(storage);
        }
        let offspring_count = input.storages.len();
        population.insert(std::mem::take(&mut input.storages));
        if population.is_empty() {
            return Err(CoreError::InvalidOperation(
                "replacement on an empty population",
            ));
        }
        log::debug!(
            "rdga: {} chromosomes, {} offspring, {} branches",
            population.size(),
            offspring_count,
            branch_count
        );

        population
            .population_tag::<UnrankedFront>(params.unranked_tag)?
            .set_count(population.size() as i32);

        let dom_count = TagGetter::<AtomicI32>::new(
            params.dom_count_tag,
            population.chromosome_tag_manager(),
        )?;
        let dom_list = TagGetter::<PartialIndexLists>::new(
            params.dom_list_tag,
            population.chromosome_tag_manager(),
        )?;
        let rank =
            TagGetter::<AtomicI32>::new(params.rank_tag, population.chromosome_tag_manager())?;
        let hyper_box = TagGetter::<HyperBoxTag>::new(
            params.hyper_box_tag,
            population.chromosome_tag_manager(),
        )?;
        let cell =
            TagGetter::<AtomicUsize>::new(params.cell_tag, population.chromosome_tag_manager())?;

        // bounds pass fused with the dominance pass
        {
            let storages = population.storages();
            let grid = population.population_tag::<ReplacementGrid>(params.grid_tag)?;
            let adaptive = &config.adaptive_grid;
            grid.reset_branch_bounds(storages[0].raw_fitness().values());

            branch::parallel_for(storages, |storage, _index, branch_id| {
                let mut bounds = grid.branch_bounds(branch_id).lock().expect("bounds lock");
                adaptive.update_bounds(storage.raw_fitness().values(), &mut bounds);
                rank.get(storage.tags()).store(0, Ordering::Relaxed);
            });

            let comparator = population.comparator();
            branch::parallel_pairs(storages.len(), |first, second, branch_id| {
                let result = comparator.compare(
                    storages[first].raw_fitness(),
                    storages[second].raw_fitness(),
                );
                if result < 0 {
                    dom_count
                        .get(storages[second].tags())
                        .fetch_add(1, Ordering::Relaxed);
                    dom_list.get(storages[first].tags()).push(branch_id, second);
                } else if result > 0 {
                    dom_count
                        .get(storages[first].tags())
                        .fetch_add(1, Ordering::Relaxed);
                    dom_list.get(storages[second].tags()).push(branch_id, first);
                }
            });
        }

        // merge branch bounds and fit the fixed grid over them
        population
            .population_tag_mut::<ReplacementGrid>(params.grid_tag)?
            .merge_and_update();

        // resize the density matrices to the grid shape
        let shape = config.adaptive_grid.cell_counts().to_vec();
        population
            .population_tag_mut::<PerBranchMatrices>(params.branch_matrices_tag)?
            .update_shape(&shape);
        population
            .population_tag_mut::<BestCellMatrix>(params.best_matrix_tag)?
            .update_shape(&shape);

        {
            let storages = population.storages();
            let grid = population.population_tag::<ReplacementGrid>(params.grid_tag)?;
            let matrix = population.population_tag::<BestCellMatrix>(params.best_matrix_tag)?;
            let unranked = population.population_tag::<UnrankedFront>(params.unranked_tag)?;
            let hyper_grid = grid.hyper_grid().expect("grid merged above");
            let origin = grid.origin();

            // front zero: queue nondominated chromosomes, map everyone to a
            // cell and record density
            branch::parallel_for(storages, |storage, index, _branch_id| {
                if dom_count.get(storage.tags()).load(Ordering::Acquire) == 0 {
                    rank.get(storage.tags()).store(1, Ordering::Relaxed);
                    unranked.queue(storages, index);
                }
                let mut hyper_box_value = hyper_box.get(storage.tags()).lock();
                *hyper_box_value =
                    hyper_grid.hyper_box_from_origin(storage.raw_fitness().values(), origin);
                let cell_index = matrix
                    .insert(&hyper_box_value)
                    .expect("hyperbox inside the fitted grid");
                cell.get(storage.tags()).store(cell_index, Ordering::Release);
            });

            // rank propagation over the dominance lists
            branch::broadcast_workers(|_branch_id| {
                while let Some(front) = unranked.dequeue(storages) {
                    let front_rank = rank.get(storages[front].tags()).load(Ordering::Acquire);
                    let lists = dom_list.get(storages[front].tags());
                    for shard_index in (0..lists.shard_count()).rev() {
                        let mut shard = lists
                            .shard(shard_index)
                            .lock()
                            .expect("dominance shard lock");
                        for &dominated in shard.iter() {
                            rank.get(storages[dominated].tags())
                                .fetch_add(front_rank, Ordering::AcqRel);
                            if dom_count
                                .get(storages[dominated].tags())
                                .fetch_sub(1, Ordering::AcqRel)
                                == 1
                            {
                                rank.get(storages[dominated].tags())
                                    .fetch_add(1, Ordering::AcqRel);
                                unranked.queue(storages, dominated);
                            }
                        }
                        // ready for the next generation
                        shard.clear();
                    }
                }
            });
        }

        // removal selection over the offspring batch
        {
            let storages = population.storages();
            let grid = population.population_tag::<ReplacementGrid>(params.grid_tag)?;
            let matrix = population.population_tag::<BestCellMatrix>(params.best_matrix_tag)?;
            let comparator = population.comparator();
            let hyper_grid = grid.hyper_grid().expect("grid merged above");
            let origin = grid.origin();
            let new_range = population.new_range();
            let batch_start = new_range.start;
            let half = new_range.len() / 2;

            branch::parallel_for_range(new_range, |storage_index, _branch_id| {
                let storage = &storages[storage_index];
                let Some(parent_index) = storage.parent() else {
                    return;
                };
                let position = storage_index - batch_start;
                let parent = &storages[parent_index];

                // the parent's cell is the forbidden region: the child is
                // inside it only when it loses against both cell corners on
                // every objective
                let mut forbidden = GridBounds::new(origin.len());
                {
                    let parent_box = hyper_box.get(parent.tags()).lock();
                    hyper_grid.hyper_box_bounds(&parent_box, origin, &mut forbidden);
                }
                let raw = storage.raw_fitness().values();
                let in_forbidden = comparator.compare_values(raw, forbidden.lower()) > 0
                    && comparator.compare_values(raw, forbidden.upper()) > 0;

                let parent_rank = rank.get(parent.tags()).load(Ordering::Acquire);
                let child_rank = rank.get(storage.tags()).load(Ordering::Acquire);
                let parent_cell = cell.get(parent.tags()).load(Ordering::Acquire);
                let child_cell = cell.get(storage.tags()).load(Ordering::Acquire);

                let replace_parent = (position >= half && parent_rank > child_rank)
                    || (position < half
                        && matrix.cell(parent_cell).count() > matrix.cell(child_cell).count()
                        && !in_forbidden);
                if replace_parent {
                    parent.flags().set(REMOVE_CHROMOSOME);
                    storage.set_parent(None);
                } else {
                    storage.flags().set(REMOVE_CHROMOSOME);
                }
            });
        }

        // purge replaced parents and rejected offspring
        let removed = population.remove();
        log::debug!("rdga: removed {} chromosomes", removed);

        // two-pass best-per-cell collection
        {
            let storages = population.storages();
            let matrix = population.population_tag::<BestCellMatrix>(params.best_matrix_tag)?;
            let per_branch =
                population.population_tag::<PerBranchMatrices>(params.branch_matrices_tag)?;

            branch::parallel_for(storages, |storage, index, branch_id| {
                if storage.flags().is_set_any(REMOVE_CHROMOSOME) {
                    return;
                }
                let cell_index = cell.get(storage.tags()).load(Ordering::Acquire);
                let mut scratch = per_branch
                    .branch(branch_id)
                    .lock()
                    .expect("branch matrix lock");
                let better = scratch[cell_index].map_or(true, |incumbent| {
                    rank.get(storage.tags()).load(Ordering::Acquire)
                        > rank.get(storages[incumbent].tags()).load(Ordering::Acquire)
                });
                if better {
                    scratch[cell_index] = Some(index);
                }
            });

            matrix.collect_best(per_branch, |index| {
                rank.get(storages[index].tags()).load(Ordering::Acquire)
            });
        }

        timer.record(population.statistics_mut());
        Ok(())
    }
}
