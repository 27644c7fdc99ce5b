pub mod artifact;
pub mod preprocessor;
pub mod regressor;

pub use artifact::{load, Artifact};
pub use preprocessor::{ColumnTransform, HandleUnknown, Preprocessor};
pub use regressor::{Estimator, RegressionModel, RegressionTree, TreeNode};
