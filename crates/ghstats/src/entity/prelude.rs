//! Common re-exports for convenient entity usage.

pub use super::interaction::{
    ActiveModel as InteractionActiveModel, Column as InteractionColumn, Entity as Interaction,
    Model as InteractionModel,
};
pub use super::interaction_type::InteractionType;
pub use super::organization::{
    ActiveModel as OrganizationActiveModel, Column as OrganizationColumn, Entity as Organization,
    Model as OrganizationModel,
};
pub use super::repository::{
    ActiveModel as RepositoryActiveModel, Column as RepositoryColumn, Entity as Repository,
    Model as RepositoryModel,
};
