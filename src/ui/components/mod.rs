mod command_input;
mod input;
mod key_result;
mod notifications;
mod search_input;
mod table;

pub use command_input::{CommandEvent, CommandInput};
pub use key_result::KeyResult;
pub use notifications::{Notification, Notifications};
pub use search_input::SearchInput;
pub use table::{render_table, row_matches, Column};
