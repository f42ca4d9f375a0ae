pub mod package_detector;
pub mod package_filter;
pub mod package_selector;
pub mod package_upgrader;
pub mod requirements_detector;
pub mod virtualenv;

pub use package_detector::PackageDetector;
pub use package_filter::PackageFilter;
pub use package_selector::PackageSelector;
pub use package_upgrader::{PackageUpgrader, UpgradeOptions};
pub use requirements_detector::RequirementsDetector;
