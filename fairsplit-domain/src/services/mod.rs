pub mod balance_calculator;
pub mod transfer_planner;

pub use balance_calculator::calculate_balances;
pub use transfer_planner::suggest_transfers;
