//! One module per subcommand.  Each exposes an `execute` function.

pub mod add;
pub mod backup;
pub mod categories;
pub mod clean_install;
pub mod completions;
pub mod delete;
pub mod export;
pub mod generate;
pub mod import_cmd;
pub mod install;
pub mod list;
pub mod qr;
pub mod rotate;
pub mod validate;
pub mod version;
