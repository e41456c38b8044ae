mod ids;
mod item;
mod level;
mod progress;

pub use ids::{ItemId, LevelId, ParseIdError};
pub use item::{
    ItemKeyError, ItemKeySource, ItemKeyStrategy, ItemState, KeyCollision, LevelItems,
    ProgressSnapshot, find_collisions,
};
pub use level::{
    LevelChain, LevelChainDraft, LevelChainError, LevelDefinition, LevelDefinitionDraft,
};
pub use progress::ProgressRecord;
