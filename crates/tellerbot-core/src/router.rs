use tellerbot_schema::Intent;

/// The responder a decision dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Responder {
    LoanInfo,
    AccountOpening,
    MissingBalance,
    ScanPayment,
    Greeting,
    RetrievalFallback,
}

/// Pure total routing function. Exhaustive over the intent set so adding a
/// variant is a compile error until it is routed somewhere.
pub fn route(decision: Intent) -> Responder {
    match decision {
        Intent::Loans => Responder::LoanInfo,
        Intent::OpenAccount => Responder::AccountOpening,
        Intent::BalanceMissing => Responder::MissingBalance,
        Intent::ScanPayFailure => Responder::ScanPayment,
        Intent::Greeting => Responder::Greeting,
        Intent::Unknown => Responder::RetrievalFallback,
    }
}
