mod auth_log_repo_mysql;
mod session_repo_mysql;
mod user_repo_mysql;

pub use auth_log_repo_mysql::*;
pub use session_repo_mysql::*;
pub use user_repo_mysql::*;

mod util;
