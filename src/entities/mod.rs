pub mod prelude;

pub mod artifacts;
pub mod users;
pub mod wizards;
