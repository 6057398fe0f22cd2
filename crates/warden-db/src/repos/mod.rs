//! Repository modules implementing the store contracts for `WardenDb`.

pub mod audit;
