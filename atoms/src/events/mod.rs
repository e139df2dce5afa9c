pub mod bus;
pub mod model;

pub use bus::ChangeBus;
pub use model::{ChangeEvent, ChangeKind, EntityKind};
