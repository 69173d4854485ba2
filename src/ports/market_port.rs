//! Market input port trait.

use crate::domain::error::ContrarianError;
use crate::domain::market::MarketData;

/// A source of markets to analyse in one batch.
pub trait MarketPort {
    fn fetch_markets(&self) -> Result<Vec<MarketData>, ContrarianError>;
}
