pub mod mint;
pub mod planner;
pub mod price_ticks;
pub mod resolver;
pub mod sizer;
pub mod slippage;
pub mod solver;
