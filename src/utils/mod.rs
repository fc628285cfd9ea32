pub mod clock;
pub mod jwt;
pub mod logger;
pub mod value;
