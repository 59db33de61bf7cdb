mod multi_release;

pub use multi_release::{
    MultiReleaseInput, MultiReleaseOperation, MultiReleaseOutput, PackageReport,
};
