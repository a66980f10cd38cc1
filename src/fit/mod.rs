//! Least-squares geometric fits: line (profile), cylinder and sphere
//! (surface), plus the damped solver shared by the nonlinear models.
pub mod cylinder;
pub mod line;
pub mod solver;
pub mod sphere;

pub use self::cylinder::{fit_cylinder, fit_cylinder_with, Concavity, CylinderFit};
pub use self::line::{fit_line_ls, remove_line, LineFit};
pub use self::solver::{LeastSquaresProblem, LevenbergMarquardt, Solution, SolverOptions};
pub use self::sphere::{fit_sphere, SphereFit};
