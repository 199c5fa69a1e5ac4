pub mod booking;
pub mod car;
pub mod location;

pub use booking::{
    Booking, BookingConfirmation, BookingDetails, BookingRequest, BookingStatus, DateRange,
    NewBooking,
};
pub use car::{Car, CarFilters};
pub use location::Location;
