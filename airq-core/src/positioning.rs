use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::PositioningError, model::Coordinates};

/// Source of the device's current coordinates.
#[async_trait]
pub trait PositionSource: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinates, PositioningError>;
}

/// Position taken from the `home` entry of the configuration file.
///
/// A terminal has no positioning hardware, so the configured home stands in
/// for the device position.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredPosition {
    home: Option<Coordinates>,
}

impl ConfiguredPosition {
    pub fn new(home: Option<Coordinates>) -> Self {
        Self { home }
    }
}

#[async_trait]
impl PositionSource for ConfiguredPosition {
    async fn current_position(&self) -> Result<Coordinates, PositioningError> {
        self.home.ok_or_else(|| {
            PositioningError::Unavailable(
                "no home position configured; run `airq configure` to set one".to_string(),
            )
        })
    }
}
