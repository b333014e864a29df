//! One module per subcommand.

pub mod add;
pub mod delete;
pub mod edit;
pub mod list;
pub mod new;
pub mod show;
