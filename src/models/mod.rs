pub mod payment;

pub use payment::{
    CreatePaymentRequest, MessageResponse, NewPayment, Payment, PaymentStatus, PaymentSummary,
    PaymentUpdate, UpdatePaymentRequest,
};
