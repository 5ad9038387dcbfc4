pub mod pages;
pub mod payment;

pub use payment::PaymentState;
