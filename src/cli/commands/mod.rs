mod assets;
mod users;

pub use assets::{cmd_add_asset, cmd_list_assets};
pub use users::{cmd_create_user, cmd_promote};
