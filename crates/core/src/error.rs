use thiserror::Error;

use crate::config::ConfigError;
use crate::model::{ItemKeyError, LevelChainError, ParseIdError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    LevelChain(#[from] LevelChainError),
    #[error(transparent)]
    ItemKey(#[from] ItemKeyError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
}
