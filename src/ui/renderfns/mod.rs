pub mod footer;
pub mod header;
pub mod utils;

pub use footer::draw_footer;
pub use header::{draw_header, HeaderInfo};
pub use utils::{
  appointment_status_color, date_label, format_money, payment_status_color, time_label, truncate,
};
