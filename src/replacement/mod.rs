//! Replacement operations: decide which offspring enter the population and
//! which chromosomes leave it.
pub mod rdga;

pub use rdga::{Rdga, RdgaConfig, RdgaParams};

use crate::chromosome::ChromosomeStorage;
use crate::errors::Result;
use crate::population::Population;

/// The offspring produced for one generation, staged for insertion.
#[derive(Debug, Default)]
pub struct OffspringBatch {
    pub storages: Vec<ChromosomeStorage>,
}

impl OffspringBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, storage: ChromosomeStorage) {
        self.storages.push(storage);
    }

    pub fn len(&self) -> usize {
        self.storages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storages.is_empty()
    }
}

/// A replacement operation's lifecycle: `prepare` registers the tags it
/// needs on the population, `update` re-sizes them when the branch count
/// changes, `exec` runs one generation's replacement and `clear` removes
/// the registered state again.
pub trait Replacement: Send + Sync + std::fmt::Debug {
    type Params;
    type Config;

    fn prepare(
        &self,
        input: &mut OffspringBatch,
        population: &mut Population,
        params: &Self::Params,
        config: &Self::Config,
    ) -> Result<()>;

    fn clear(
        &self,
        input: &mut OffspringBatch,
        population: &mut Population,
        params: &Self::Params,
        config: &Self::Config,
    ) -> Result<()>;

    fn update(
        &self,
        input: &mut OffspringBatch,
        population: &mut Population,
        params: &Self::Params,
        config: &Self::Config,
    ) -> Result<()>;

    fn exec(
        &self,
        input: &mut OffspringBatch,
        population: &mut Population,
        params: &Self::Params,
        config: &Self::Config,
    ) -> Result<()>;
}
