mod normal_equations;
mod rank;

pub use normal_equations::solve_normal_equations;
pub use rank::RankWeightGenerator;
