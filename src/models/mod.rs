pub mod booking;
pub mod hours;
pub mod service;
pub mod staff;

pub use booking::{Booking, BookingStatus, PaymentStatus};
pub use hours::{DateOverride, DayHours, WeeklyHours};
pub use service::Service;
pub use staff::StaffMember;
