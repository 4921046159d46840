pub mod profile_edit;
pub mod rating_trajectory;
