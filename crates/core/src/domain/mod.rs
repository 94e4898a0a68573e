pub mod goal;
pub mod ledger;
pub mod market;
