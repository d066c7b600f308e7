pub mod dump;
pub mod seed;
pub mod serve;
pub mod surveys;
