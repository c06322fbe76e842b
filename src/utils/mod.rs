mod comparison;
pub use self::comparison::*;

mod random;
pub use self::random::*;
