//! Shared domain types.

pub mod id;
pub mod money;
pub mod phone;
pub mod status;

pub use id::*;
pub use money::Money;
pub use phone::{Phone, PhoneError};
pub use status::{OrderStatus, PaymentMethod, UserRole};
