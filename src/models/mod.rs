pub mod appointment;
pub mod department;
pub mod doctor;
pub mod enums;
pub mod filters;
pub mod patient;
pub mod treatment;
pub mod user;

pub use appointment::*;
pub use department::*;
pub use doctor::*;
pub use enums::*;
pub use filters::*;
pub use patient::*;
pub use treatment::*;
pub use user::*;
