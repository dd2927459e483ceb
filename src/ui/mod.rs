pub mod calendar;
pub mod detail;
pub mod palette;

pub use calendar::CalendarView;
pub use detail::DetailView;
