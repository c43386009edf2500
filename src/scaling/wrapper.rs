pub use super::exponential::Exponential as ScalingExponential;
pub use super::linear::Linear as ScalingLinear;
pub use super::no_scaling::NoScaling as ScalingNoop;
pub use super::ranking::Ranking as ScalingRanking;
pub use super::sigma_truncation::SigmaTruncation as ScalingSigmaTruncation;
pub use super::vega::Vega as ScalingVega;
pub use super::windowing::Windowing as ScalingWindowing;
pub use super::Scaling;

use crate::population::Population;

#[derive(Debug, Clone)]
pub enum Wrapper {
    Noop(ScalingNoop),
    Vega(ScalingVega),
    Windowing(ScalingWindowing),
    Ranking(ScalingRanking),
    Exponential(ScalingExponential),
    Linear(ScalingLinear),
    SigmaTruncation(ScalingSigmaTruncation),
}

impl Scaling for Wrapper {
    fn call(&mut self, population: &mut Population) {
        match self {
            Wrapper::Noop(scaling) => scaling.call(population),
            Wrapper::Vega(scaling) => scaling.call(population),
            Wrapper::Windowing(scaling) => scaling.call(population),
            Wrapper::Ranking(scaling) => scaling.call(population),
            Wrapper::Exponential(scaling) => scaling.call(population),
            Wrapper::Linear(scaling) => scaling.call(population),
            Wrapper::SigmaTruncation(scaling) => scaling.call(population),
        }
    }
}

impl From<ScalingNoop> for Wrapper {
    fn from(scaling: ScalingNoop) -> Self {
        Wrapper::Noop(scaling)
    }
}
impl From<ScalingVega> for Wrapper {
    fn from(scaling: ScalingVega) -> Self {
        Wrapper::Vega(scaling)
    }
}
impl From<ScalingWindowing> for Wrapper {
    fn from(scaling: ScalingWindowing) -> Self {
        Wrapper::Windowing(scaling)
    }
}
impl From<ScalingRanking> for Wrapper {
    fn from(scaling: ScalingRanking) -> Self {
        Wrapper::Ranking(scaling)
    }
}
impl From<ScalingExponential> for Wrapper {
    fn from(scaling: ScalingExponential) -> Self {
        Wrapper::Exponential(scaling)
    }
}
impl From<ScalingLinear> for Wrapper {
    fn from(scaling: ScalingLinear) -> Self {
        Wrapper::Linear(scaling)
    }
}
impl From<ScalingSigmaTruncation> for Wrapper {
    fn from(scaling: ScalingSigmaTruncation) -> Self {
        Wrapper::SigmaTruncation(scaling)
    }
}
