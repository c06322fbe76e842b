mod matrix;
pub use self::matrix::*;

mod problem;
pub use self::problem::*;
