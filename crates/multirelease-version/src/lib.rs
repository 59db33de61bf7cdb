mod increment;
mod range;
mod resolve;
mod tag;

pub use increment::{increment, increment_prerelease, next_pre_version, next_version};
pub use range::{parse_range, satisfies};
pub use resolve::{WORKSPACE_PROTOCOL, resolve_next_version, strip_workspace_protocol};
pub use tag::{prerelease_channel, version_from_tag};
