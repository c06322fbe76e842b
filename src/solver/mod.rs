mod context;
pub use self::context::*;

pub mod solution;
pub use self::solution::{CallLocation, FailureReason, Solution, Stop};

pub mod insertion;
pub use self::insertion::{feasible_insertions, InsertionOption};

pub mod ruin;
pub use self::ruin::{costly_removal, random_removal, similar_removal};

pub mod recreate;
pub use self::recreate::{greedy_recreate, random_recreate, regret_recreate};

mod operator;
pub use self::operator::*;

mod acceptance;
pub use self::acceptance::*;

mod budget;
pub use self::budget::*;

mod history;
pub use self::history::*;

mod experiment;
pub use self::experiment::*;
