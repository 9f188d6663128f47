pub mod applications;
pub mod error;
pub mod events;
pub mod ids;
pub mod seed;
pub mod services;
pub mod storage;

pub use error::{ApplicationError, TreeError};
pub use storage::catalog::{CatalogStore, CountMode};
pub use storage::directory::{DirectoryNode, PathEntry, VIRTUAL_ROOT_ID};
