pub use super::artifacts::Entity as Artifacts;
pub use super::users::Entity as Users;
pub use super::wizards::Entity as Wizards;
