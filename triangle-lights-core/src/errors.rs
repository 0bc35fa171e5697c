use alloc::collections::TryReserveError;
use thiserror::Error;

/// everything that can go wrong in the core. the lifecycle itself never errors, only setup and config do
#[derive(Error, Debug)]
pub enum LightsError {
    #[error("unable to reserve a pool of {requested} entities")]
    PoolAllocation {
        requested: usize,
        #[source]
        source: TryReserveError,
    },
    #[error("unable to reserve {requested} bytes of scratch space")]
    ScratchAllocation {
        requested: usize,
        #[source]
        source: TryReserveError,
    },
    #[error("{num_leds} leds do not split into {num_segments} equal segments")]
    Layout {
        num_leds: usize,
        num_segments: usize,
    },
}

pub type LightsResult<T> = Result<T, LightsError>;
